//! REST page fetcher
//!
//! Builds the console API's list URLs and decodes its response envelope:
//!
//! ```json
//! { "documents": [ ... ], "hasMore": true, "page": 2, "limit": 20,
//!   "pagination": { "totalDocuments": 130 } }
//! ```
//!
//! The chat list uses the same shape with a `users` array.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use crate::prelude::*;
use pagesync_types::fetcher::{PageFetcher, PageResult};
use pagesync_types::transport::{JsonTransport, TokenSource};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug)]
pub struct RestPageFetcher {
	kind: CollectionKind,
	endpoint: Url,
	transport: Arc<dyn JsonTransport>,
	token: Arc<dyn TokenSource>,
}

impl RestPageFetcher {
	/// Fetcher for `kind` below `base` (e.g. `https://api.example.com/admin/`)
	pub fn new(
		kind: CollectionKind,
		base: &Url,
		transport: Arc<dyn JsonTransport>,
		token: Arc<dyn TokenSource>,
	) -> SyncResult<Self> {
		if base.cannot_be_a_base() {
			return Err(Error::ConfigError(format!("{} cannot be used as API base", base)));
		}
		let mut base = base.clone();
		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());
			base.set_path(&path);
		}
		let endpoint = base.join(kind.path())?;
		Ok(Self { kind, endpoint, transport, token })
	}

	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// URL of page `page` of `query`
	pub fn page_url(&self, query: &QueryKey, page: u32, page_size: u32) -> Url {
		let mut url = self.endpoint.clone();
		{
			let mut params = url.query_pairs_mut();
			if self.kind == CollectionKind::Documents {
				if let Some(range) = query.date_range() {
					params.append_pair("startDate", &range.start.format(DATE_FORMAT).to_string());
					params.append_pair("endDate", &range.end.format(DATE_FORMAT).to_string());
				}
			}
			params.append_pair("page", &page.to_string());
			params.append_pair("limit", &page_size.to_string());
			if !query.search().is_empty() {
				params.append_pair("search", query.search());
			}
			if self.kind == CollectionKind::Documents {
				if let Some(seen) = query.status().is_seen() {
					params.append_pair("isSeen", if seen { "true" } else { "false" });
				}
				if let Some(flagged) = query.flagged() {
					params.append_pair("isFlagged", if flagged { "true" } else { "false" });
				}
				if let Some(category) = query.category() {
					params.append_pair("category", category.as_str());
				}
				for filter in query.filters() {
					params.append_pair("type", filter);
				}
			}
		}
		url
	}
}

/// Decode one list response body
///
/// `page` and `page_size` are what was requested; the body may override them.
pub fn decode_page(
	kind: CollectionKind,
	body: &Value,
	page: u32,
	page_size: u32,
) -> SyncResult<PageResult> {
	let Some(envelope) = body.as_object() else {
		return Err(Error::MalformedResponse(format!("{} response is not an object", kind.name())));
	};
	let Some(records) = envelope.get(kind.records_key()).and_then(Value::as_array) else {
		return Err(Error::MalformedResponse(format!("missing \"{}\" array", kind.records_key())));
	};

	let positive = |key: &str| {
		envelope
			.get(key)
			.and_then(Value::as_u64)
			.and_then(|n| u32::try_from(n).ok())
			.filter(|n| *n > 0)
	};
	let total = envelope
		.get("pagination")
		.and_then(|p| p.get("totalDocuments"))
		.or_else(|| envelope.get("total"))
		.and_then(Value::as_u64);

	Ok(PageResult {
		records: records.clone(),
		has_more: envelope.get("hasMore").and_then(Value::as_bool),
		page: positive("page").unwrap_or(page),
		page_size: positive("limit").unwrap_or(page_size),
		total,
	})
}

fn server_message(kind: CollectionKind, body: &Value) -> String {
	body.get("message")
		.and_then(Value::as_str)
		.filter(|m| !m.is_empty())
		.map_or_else(|| format!("Failed to fetch {}", kind.path()), ToString::to_string)
}

#[async_trait]
impl PageFetcher for RestPageFetcher {
	async fn fetch_page(
		&self,
		query: &QueryKey,
		page: u32,
		page_size: u32,
	) -> SyncResult<PageResult> {
		let url = self.page_url(query, page, page_size);
		let token = self.token.bearer_token();
		debug!(collection = self.kind.name(), %url, "GET");

		let res = self.transport.get_json(&url, token.as_deref()).await?;
		if !res.is_success() {
			return Err(Error::ServerError {
				status: res.status,
				message: server_message(self.kind, &res.body),
			});
		}
		decode_page(self.kind, &res.body, page, page_size)
	}
}


// vim: ts=4
