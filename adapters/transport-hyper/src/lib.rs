//! JSON transport on hyper
//!
//! Implements [`JsonTransport`] with hyper-util's pooled legacy client over
//! rustls, trusting the platform's native roots. Plain `http://` is accepted
//! for local API servers.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

use async_trait::async_trait;
use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::header::{ACCEPT, AUTHORIZATION};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use pagesync_types::prelude::*;
use pagesync_types::transport::{JsonResponse, JsonTransport};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HyperTransport {
	client: Client<HttpsConnector<HttpConnector>, Empty<Bytes>>,
	timeout: Duration,
}

impl HyperTransport {
	/// Transport whose requests (headers and body) must complete within `timeout`
	pub fn new(timeout: Duration) -> SyncResult<Self> {
		if timeout.is_zero() {
			return Err(Error::ConfigError("request timeout must be positive".into()));
		}
		let connector = HttpsConnectorBuilder::new()
			.with_native_roots()
			.map_err(|e| Error::ConfigError(format!("TLS error: {}", e)))?
			.https_or_http()
			.enable_http1()
			.enable_http2()
			.build();
		let client = Client::builder(TokioExecutor::new()).build(connector);
		Ok(Self { client, timeout })
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}
}

fn bearer_header(token: &str) -> String {
	format!("Bearer {}", token)
}

/// Interpret a response body; empty or non-JSON bodies read as `Null`
fn parse_body(bytes: &[u8]) -> Value {
	if bytes.iter().all(u8::is_ascii_whitespace) {
		return Value::Null;
	}
	match serde_json::from_slice(bytes) {
		Ok(value) => value,
		Err(err) => {
			debug!("response body is not JSON: {}", err);
			Value::Null
		}
	}
}

#[async_trait]
impl JsonTransport for HyperTransport {
	async fn get_json(&self, url: &Url, bearer: Option<&str>) -> SyncResult<JsonResponse> {
		let mut request = hyper::Request::builder()
			.method(hyper::Method::GET)
			.uri(url.as_str())
			.header(ACCEPT, "application/json");
		if let Some(token) = bearer {
			request = request.header(AUTHORIZATION, bearer_header(token));
		}
		let request = request
			.body(Empty::<Bytes>::new())
			.map_err(|e| Error::ValidationError(format!("request build error: {}", e)))?;

		let timed_out = || Error::NetworkError(format!("request timed out after {:?}", self.timeout));
		let exchange = async {
			let response = self
				.client
				.request(request)
				.await
				.map_err(|e| Error::NetworkError(e.to_string()))?;
			let status = response.status().as_u16();
			let body = response
				.into_body()
				.collect()
				.await
				.map_err(|e| Error::NetworkError(format!("reading body: {}", e)))?
				.to_bytes();
			Ok::<_, Error>((status, body))
		};
		let (status, body) = tokio::time::timeout(self.timeout, exchange).await.map_err(|_| timed_out())??;

		debug!(%url, status, bytes = body.len(), "GET done");
		Ok(JsonResponse { status, body: parse_body(&body) })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_parse_body() {
		assert_eq!(parse_body(b""), Value::Null);
		assert_eq!(parse_body(b" \n"), Value::Null);
		assert_eq!(parse_body(b"<html>Bad Gateway</html>"), Value::Null);
		assert_eq!(parse_body(br#"{"users":[]}"#), json!({ "users": [] }));
	}

	#[test]
	fn test_bearer_header() {
		assert_eq!(bearer_header("abc"), "Bearer abc");
	}

	#[test]
	fn test_zero_timeout_rejected() {
		assert!(matches!(HyperTransport::new(Duration::ZERO), Err(Error::ConfigError(_))));
	}
}

// vim: ts=4
