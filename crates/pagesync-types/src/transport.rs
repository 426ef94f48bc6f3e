//! JSON transport and bearer token capabilities
//!
//! These are the narrow seams to the outside world: a `GET(url, bearer)` that
//! yields a status and a JSON body, and a source for the bearer token.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use url::Url;

use crate::prelude::*;

/// Raw answer of a JSON GET
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
	pub status: u16,
	/// `Value::Null` when the body was empty or not JSON
	pub body: Value,
}

impl JsonResponse {
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

#[async_trait]
pub trait JsonTransport: Debug + Send + Sync {
	/// Issue a GET and return whatever the server answered
	///
	/// Only transport failures (no response at all, timeouts) are errors;
	/// non-success statuses are returned as responses.
	async fn get_json(&self, url: &Url, bearer: Option<&str>) -> SyncResult<JsonResponse>;
}

/// Supplies the bearer token attached to each request
pub trait TokenSource: Debug + Send + Sync {
	fn bearer_token(&self) -> Option<Box<str>>;
}

/// A token that never changes
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<Box<str>>);

impl StaticToken {
	pub fn new(token: impl Into<Box<str>>) -> Self {
		Self(Some(token.into()))
	}
}

impl TokenSource for StaticToken {
	fn bearer_token(&self) -> Option<Box<str>> {
		self.0.clone()
	}
}

// vim: ts=4
