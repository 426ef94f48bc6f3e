//! Collection state container
//!
//! Owns the items of one collection together with the pagination cursor and
//! the loading flags, and implements the replace/append/fail transitions.
//! Items live behind an `Arc` so snapshots handed to the rendering layer are
//! cheap and can't be mutated by it.

use serde::Serialize;
use serde_with::skip_serializing_none;
use std::sync::Arc;
use tokio::time::Instant;

use crate::prelude::*;
use pagesync_types::{fetcher::PageResult, record::RawRecord};

/// Which kind of fetch an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FetchScope {
	Replace,
	Append,
}

/// Error as shown to the rendering layer
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
	pub kind: ErrorKind,
	pub message: Box<str>,
	pub status: Option<u16>,
	pub scope: FetchScope,
}

impl ErrorInfo {
	pub fn new(err: &Error, scope: FetchScope) -> Self {
		let message = match err {
			Error::ServerError { message, .. } => message.as_str().into(),
			other => other.to_string().into(),
		};
		Self { kind: err.kind(), message, status: err.status(), scope }
	}
}

/// Read-only view of a collection
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
	pub items: Arc<Vec<Record>>,
	pub loading: bool,
	pub loading_more: bool,
	pub has_more: bool,
	/// A superseded append still holds the request guard
	pub append_pending: bool,
	pub error: Option<ErrorInfo>,
	pub page: u32,
	pub total: Option<u64>,
}

impl Snapshot {
	/// Whether a boundary signal may start an append right now
	pub fn can_append(&self) -> bool {
		self.has_more && !self.loading && !self.loading_more && !self.append_pending
	}
}

/// Counters for things that are dropped rather than surfaced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
	pub dropped_without_id: u64,
	pub malformed_responses: u64,
}

#[derive(Debug)]
pub struct CollectionStore {
	kind: CollectionKind,
	items: Arc<Vec<Record>>,
	page: u32,
	has_more: bool,
	loading: bool,
	loading_more: bool,
	error: Option<ErrorInfo>,
	last_query: Option<QueryKey>,
	last_fetched_at: Option<Instant>,
	total: Option<u64>,
	diagnostics: Diagnostics,
}

impl CollectionStore {
	pub fn new(kind: CollectionKind) -> Self {
		Self {
			kind,
			items: Arc::new(Vec::new()),
			page: 1,
			has_more: false,
			loading: false,
			loading_more: false,
			error: None,
			last_query: None,
			last_fetched_at: None,
			total: None,
			diagnostics: Diagnostics::default(),
		}
	}

	pub fn kind(&self) -> CollectionKind {
		self.kind
	}

	pub fn items(&self) -> &[Record] {
		&self.items
	}

	pub fn page(&self) -> u32 {
		self.page
	}

	pub fn has_more(&self) -> bool {
		self.has_more
	}

	pub fn is_loading(&self) -> bool {
		self.loading
	}

	pub fn is_loading_more(&self) -> bool {
		self.loading_more
	}

	pub fn error(&self) -> Option<&ErrorInfo> {
		self.error.as_ref()
	}

	pub fn last_query(&self) -> Option<&QueryKey> {
		self.last_query.as_ref()
	}

	pub fn last_fetched_at(&self) -> Option<Instant> {
		self.last_fetched_at
	}

	pub fn total(&self) -> Option<u64> {
		self.total
	}

	pub fn diagnostics(&self) -> Diagnostics {
		self.diagnostics
	}

	/// Last successful fetch is older than `ttl`
	pub fn is_stale(&self, now: Instant, ttl: std::time::Duration) -> bool {
		self.last_fetched_at.is_some_and(|at| now.saturating_duration_since(at) > ttl)
	}

	pub fn snapshot(&self) -> Snapshot {
		Snapshot {
			items: Arc::clone(&self.items),
			loading: self.loading,
			loading_more: self.loading_more,
			has_more: self.has_more,
			append_pending: false,
			error: self.error.clone(),
			page: self.page,
			total: self.total,
		}
	}

	/// Enter the replacing state
	///
	/// Resets the cursor to page 1 and assumes there is nothing more until the
	/// response says otherwise. An append in flight is superseded; returns
	/// whether that happened.
	pub fn begin_replace(&mut self) -> bool {
		let superseded = self.loading_more;
		self.loading = true;
		self.loading_more = false;
		self.page = 1;
		self.has_more = false;
		self.error = None;
		superseded
	}

	/// Overwrite the items with the first page of `query`
	///
	/// Returns the number of records admitted.
	pub fn replace(&mut self, query: QueryKey, result: PageResult, now: Instant) -> usize {
		let has_more = result.more_available();
		let mut records = self.admit(result.records);
		self.kind.arrange(&mut records);
		let count = records.len();

		self.items = Arc::new(records);
		self.page = result.page.max(1);
		self.has_more = has_more;
		self.total = result.total;
		self.last_query = Some(query);
		self.last_fetched_at = Some(now);
		self.error = None;
		self.loading = false;
		count
	}

	/// Enter the appending state, if an append is possible at all
	pub fn begin_append(&mut self) -> bool {
		if !self.has_more || self.loading || self.loading_more {
			return false;
		}
		self.loading_more = true;
		self.error = None;
		true
	}

	/// Concatenate the next page, preserving arrival order
	///
	/// Returns the number of records appended.
	pub fn append(&mut self, result: PageResult) -> SyncResult<usize> {
		if !self.loading_more {
			return Err(Error::ValidationError("append without a pending load".into()));
		}
		let has_more = result.more_available();
		let records = self.admit(result.records);
		let count = records.len();

		if count > 0 {
			Arc::make_mut(&mut self.items).extend(records);
		}
		self.page = result.page.max(self.page);
		self.has_more = has_more;
		if result.total.is_some() {
			self.total = result.total;
		}
		self.loading_more = false;
		Ok(count)
	}

	/// The cursor can't move past the current page; stop offering appends
	pub fn exhaust(&mut self) {
		self.has_more = false;
	}

	/// Record a failed fetch; the items stay as they are
	pub fn fail(&mut self, err: &Error, scope: FetchScope) {
		self.error = Some(ErrorInfo::new(err, scope));
		self.abandon(scope);
	}

	/// Leave the loading state of `scope` without touching anything else
	pub fn abandon(&mut self, scope: FetchScope) {
		match scope {
			FetchScope::Replace => self.loading = false,
			FetchScope::Append => self.loading_more = false,
		}
	}

	/// Forget everything, including the last query
	pub fn clear(&mut self) {
		*self = Self { diagnostics: self.diagnostics, ..Self::new(self.kind) };
	}

	pub fn note_malformed(&mut self) {
		self.diagnostics.malformed_responses += 1;
	}

	/// Apply `f` to the record with `id`; returns whether it was found
	pub fn patch(&mut self, id: &RecordId, f: impl FnOnce(&mut Record)) -> bool {
		// Look before make_mut: it clones shared items even when nothing matches
		if !self.items.iter().any(|r| &r.id == id) {
			return false;
		}
		if let Some(record) = Arc::make_mut(&mut self.items).iter_mut().find(|r| &r.id == id) {
			f(record);
			return true;
		}
		false
	}

	fn admit(&mut self, raw: Vec<RawRecord>) -> Vec<Record> {
		let received = raw.len();
		let records: Vec<Record> = raw.into_iter().filter_map(|r| Record::from_raw(r).ok()).collect();
		let dropped = received - records.len();
		if dropped > 0 {
			self.diagnostics.dropped_without_id += dropped as u64;
			debug!(collection = self.kind.name(), dropped, "records without identifier dropped");
		}
		records
	}
}


// vim: ts=4
