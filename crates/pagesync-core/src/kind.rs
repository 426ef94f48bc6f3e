//! Collection kinds
//!
//! The console keeps two independent collections: chat contacts and
//! documents. They share the synchronization logic and differ in endpoint,
//! envelope key, default page size and post-processing.

use chrono::NaiveDate;
use std::cmp::Ordering;

use crate::prelude::*;
use pagesync_types::query::DateRange;

/// Documents default to this many days back from today
pub const DEFAULT_DOCUMENT_DAYS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
	Chat,
	Documents,
}

impl CollectionKind {
	pub fn name(self) -> &'static str {
		match self {
			CollectionKind::Chat => "chat",
			CollectionKind::Documents => "documents",
		}
	}

	/// Path segment of the list endpoint, relative to the API base
	pub fn path(self) -> &'static str {
		match self {
			CollectionKind::Chat => "users",
			CollectionKind::Documents => "documents",
		}
	}

	/// Key of the records array in the response envelope
	pub fn records_key(self) -> &'static str {
		self.path()
	}

	pub fn default_page_size(self) -> u32 {
		match self {
			CollectionKind::Chat => 10,
			CollectionKind::Documents => 20,
		}
	}

	/// The query a freshly opened view starts with
	pub fn default_query(self, today: NaiveDate, page_size: u32) -> SyncResult<QueryKey> {
		let builder = QueryKey::builder(page_size);
		match self {
			CollectionKind::Chat => builder.build(),
			CollectionKind::Documents => builder
				.date_range(Some(DateRange::last_days(today, DEFAULT_DOCUMENT_DAYS)))
				.build(),
		}
	}

	/// Kind-specific ordering applied on every replace
	pub fn arrange(self, records: &mut [Record]) {
		if self == CollectionKind::Chat {
			sort_by_activity(records);
		}
	}
}

/// Latest activity first, untimed records last, ties keep server order
pub fn sort_by_activity(records: &mut [Record]) {
	records.sort_by(|a, b| match (a.last_activity_at, b.last_activity_at) {
		(Some(ta), Some(tb)) => tb.cmp(&ta),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	});
}


// vim: ts=4
