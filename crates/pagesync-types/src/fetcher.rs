//! Page fetching adapter
//!
//! The synchronizer never talks to the network itself. It asks a
//! [`PageFetcher`] for one page of one query and reconciles whatever comes
//! back, whenever it comes back.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;
use crate::record::RawRecord;

/// One page of results as reported by the provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResult {
	pub records: Vec<RawRecord>,
	/// `None` when the provider did not say
	pub has_more: Option<bool>,
	pub page: u32,
	pub page_size: u32,
	pub total: Option<u64>,
}

impl PageResult {
	pub fn empty(page: u32, page_size: u32) -> Self {
		Self { records: Vec::new(), has_more: Some(false), page, page_size, total: None }
	}

	/// Whether another page may exist
	///
	/// An empty page always ends the collection. A missing flag is inferred
	/// from a full page.
	pub fn more_available(&self) -> bool {
		if self.records.is_empty() {
			return false;
		}
		self.has_more.unwrap_or(self.records.len() >= self.page_size as usize)
	}
}

#[async_trait]
pub trait PageFetcher: Debug + Send + Sync {
	/// Fetch page `page` (1-based) of `query`
	///
	/// Timeouts are the implementation's business and surface as
	/// [`Error::NetworkError`].
	async fn fetch_page(&self, query: &QueryKey, page: u32, page_size: u32)
	-> SyncResult<PageResult>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_more_available() {
		let full = PageResult {
			records: vec![json!({"id": 1}), json!({"id": 2})],
			has_more: None,
			page: 1,
			page_size: 2,
			total: None,
		};
		assert!(full.more_available());

		let short = PageResult { records: vec![json!({"id": 1})], ..full.clone() };
		assert!(!short.more_available());

		let told = PageResult { has_more: Some(false), ..full.clone() };
		assert!(!told.more_available());

		let empty = PageResult { records: vec![], has_more: Some(true), ..full };
		assert!(!empty.more_available());
	}
}

// vim: ts=4
