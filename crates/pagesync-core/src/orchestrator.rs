//! Fetch orchestration
//!
//! The [`FetchOrchestrator`] decides, for every query change or boundary
//! signal, whether to do nothing, replace the collection with page 1 of the
//! current query, or append the next page. Fetches run concurrently with
//! further user input, so every result is checked against the state at the
//! moment it arrives: a result for a query that is no longer wanted is
//! dropped instead of applied. There is no network-level cancellation.
//!
//! State transitions per collection:
//!
//! ```text
//! Idle -> Replacing -> Idle        (replace-fetch, page 1)
//! Idle -> Appending -> Idle        (append-fetch, page + 1)
//! Replacing | Appending -> Idle    (failure, error recorded)
//! ```

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::guard::{GuardPermit, RequestGuard};
use crate::prelude::*;
use crate::store::{CollectionStore, FetchScope, Snapshot};
use pagesync_types::fetcher::{PageFetcher, PageResult};

/// What an intent ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
	/// Nothing to do: the current result set is valid, or preconditions failed
	Skipped,
	/// A replace is in flight; it will pick up the new query when it settles
	Deferred,
	/// A result was applied to the collection
	Applied { records: usize },
	/// A result arrived for a query that is no longer wanted
	Discarded,
}

#[derive(Debug, Clone)]
enum FailedOp {
	Replace { query: QueryKey },
	Append { query: QueryKey, page: u32 },
}

#[derive(Debug)]
struct State {
	store: CollectionStore,
	/// The query the user currently wants
	target: QueryKey,
	replace_ticket: Option<u64>,
	append_ticket: Option<u64>,
	next_ticket: u64,
	last_failed: Option<FailedOp>,
}

impl State {
	fn issue_ticket(&mut self) -> u64 {
		self.next_ticket += 1;
		self.next_ticket
	}
}

#[derive(Debug)]
struct Inner {
	kind: CollectionKind,
	settings: SyncSettings,
	fetcher: Arc<dyn PageFetcher>,
	guard: RequestGuard,
	state: Mutex<State>,
	snapshots: watch::Sender<Snapshot>,
}

impl Inner {
	fn name(&self) -> &'static str {
		self.kind.name()
	}

	fn publish(&self, st: &State) {
		let mut snapshot = st.store.snapshot();
		snapshot.append_pending = self.guard.is_held() && !st.store.is_loading_more();
		self.snapshots.send_replace(snapshot);
	}

	fn begin_replace(&self, st: &mut State) -> u64 {
		let ticket = st.issue_ticket();
		if st.store.begin_replace() {
			st.append_ticket = None;
			debug!(collection = self.name(), "append superseded by replace");
		}
		st.replace_ticket = Some(ticket);
		self.publish(st);
		ticket
	}
}

/// Resets the loading flag of a fetch whose future is dropped before it
/// settles
///
/// An append's guard permit rides along and is released before anything is
/// published.
struct InFlight<'a> {
	inner: &'a Inner,
	scope: FetchScope,
	ticket: u64,
	permit: Option<GuardPermit>,
	armed: bool,
}

impl<'a> InFlight<'a> {
	fn new(inner: &'a Inner, scope: FetchScope, ticket: u64) -> Self {
		Self { inner, scope, ticket, permit: None, armed: true }
	}

	fn holding(mut self, permit: GuardPermit) -> Self {
		self.permit = Some(permit);
		self
	}

	fn disarm(mut self) {
		self.armed = false;
	}
}

impl Drop for InFlight<'_> {
	fn drop(&mut self) {
		let released = self.permit.take().is_some();
		if !self.armed {
			return;
		}
		let mut st = self.inner.state.lock();
		let slot = match self.scope {
			FetchScope::Replace => &mut st.replace_ticket,
			FetchScope::Append => &mut st.append_ticket,
		};
		let current = *slot == Some(self.ticket);
		if current {
			*slot = None;
			st.store.abandon(self.scope);
			debug!(collection = self.inner.name(), scope = ?self.scope, "fetch abandoned");
		}
		if current || released {
			self.inner.publish(&st);
		}
	}
}

/// Drives one collection
///
/// Cheap to clone; clones share the collection.
#[derive(Debug, Clone)]
pub struct FetchOrchestrator {
	inner: Arc<Inner>,
}

impl FetchOrchestrator {
	pub fn new(
		kind: CollectionKind,
		settings: SyncSettings,
		initial: QueryKey,
		fetcher: Arc<dyn PageFetcher>,
	) -> Self {
		let store = CollectionStore::new(kind);
		let (snapshots, _) = watch::channel(store.snapshot());
		let state = State {
			store,
			target: initial,
			replace_ticket: None,
			append_ticket: None,
			next_ticket: 0,
			last_failed: None,
		};
		Self {
			inner: Arc::new(Inner {
				kind,
				settings,
				fetcher,
				guard: RequestGuard::new(),
				state: Mutex::new(state),
				snapshots,
			}),
		}
	}

	pub fn kind(&self) -> CollectionKind {
		self.inner.kind
	}

	pub fn settings(&self) -> &SyncSettings {
		&self.inner.settings
	}

	/// The query the user currently wants (not necessarily fetched yet)
	pub fn query(&self) -> QueryKey {
		self.inner.state.lock().target.clone()
	}

	pub fn snapshot(&self) -> Snapshot {
		self.inner.snapshots.borrow().clone()
	}

	/// Receiver that sees a new snapshot after every transition
	pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
		self.inner.snapshots.subscribe()
	}

	/// Read access to the store, for diagnostics and tests
	pub fn with_store<R>(&self, f: impl FnOnce(&CollectionStore) -> R) -> R {
		f(&self.inner.state.lock().store)
	}

	/// Apply a partial query change and evaluate it
	pub async fn set_query(&self, patch: QueryPatch) -> SyncResult<FetchOutcome> {
		{
			let mut st = self.inner.state.lock();
			let query = patch.apply(&st.target)?;
			if query != st.target {
				debug!(collection = self.inner.name(), ?query, "query changed");
			}
			st.target = query;
		}
		self.evaluate().await
	}

	/// Evaluate the current query again, refreshing it if it went stale
	pub async fn revalidate(&self) -> SyncResult<FetchOutcome> {
		self.evaluate().await
	}

	async fn evaluate(&self) -> SyncResult<FetchOutcome> {
		let (query, ticket) = {
			let mut st = self.inner.state.lock();
			let changed = st.store.last_query() != Some(&st.target);
			let stale = st.store.is_stale(Instant::now(), self.inner.settings.stale_ttl);
			if !changed && !stale {
				return Ok(FetchOutcome::Skipped);
			}
			if st.store.is_loading() {
				debug!(collection = self.inner.name(), "replace in flight, deferring");
				return Ok(FetchOutcome::Deferred);
			}
			if stale && !changed {
				info!(collection = self.inner.name(), "collection stale, refreshing");
			}
			let query = st.target.clone();
			let ticket = self.inner.begin_replace(&mut st);
			(query, ticket)
		};
		self.drive_replace(query, ticket).await
	}

	/// Run a replace and keep going while the target moves under it
	async fn drive_replace(&self, mut query: QueryKey, mut ticket: u64) -> SyncResult<FetchOutcome> {
		loop {
			let outcome = self.replace(&query, ticket).await;
			let next = {
				let mut st = self.inner.state.lock();
				if st.target == query || st.store.is_loading() {
					None
				} else {
					let next_query = st.target.clone();
					Some((next_query, self.inner.begin_replace(&mut st)))
				}
			};
			match next {
				None => return outcome,
				Some((next_query, next_ticket)) => {
					query = next_query;
					ticket = next_ticket;
				}
			}
		}
	}

	async fn replace(&self, query: &QueryKey, ticket: u64) -> SyncResult<FetchOutcome> {
		let name = self.inner.name();
		let page_size = query.page_size();
		debug!(collection = name, page = 1, page_size, "replace-fetch issued");

		let flight = InFlight::new(&self.inner, FetchScope::Replace, ticket);
		let fetched = self.inner.fetcher.fetch_page(query, 1, page_size).await;
		flight.disarm();

		let mut st = self.inner.state.lock();
		if st.replace_ticket != Some(ticket) {
			debug!(collection = name, "replace result for a cleared collection discarded");
			return Ok(FetchOutcome::Discarded);
		}
		st.replace_ticket = None;
		if &st.target != query {
			st.store.abandon(FetchScope::Replace);
			self.inner.publish(&st);
			info!(collection = name, "replace result for superseded query discarded");
			return Ok(FetchOutcome::Discarded);
		}

		let page = match fetched {
			Ok(page) => page,
			Err(Error::MalformedResponse(msg)) => {
				warn!(collection = name, page = 1, "malformed response treated as empty: {}", msg);
				st.store.note_malformed();
				PageResult::empty(1, page_size)
			}
			Err(err) => {
				warn!(collection = name, page = 1, "replace-fetch failed: {}", err);
				st.store.fail(&err, FetchScope::Replace);
				st.last_failed = Some(FailedOp::Replace { query: query.clone() });
				self.inner.publish(&st);
				return Err(err);
			}
		};
		let records = st.store.replace(query.clone(), page, Instant::now());
		st.last_failed = None;
		self.inner.publish(&st);
		info!(collection = name, records, has_more = st.store.has_more(), "collection replaced");
		Ok(FetchOutcome::Applied { records })
	}

	/// Load the next page of the current result set
	///
	/// Does nothing unless there is more to load, nothing is loading and the
	/// request guard is free. Normally invoked by the scroll trigger.
	pub async fn request_append(&self) -> SyncResult<FetchOutcome> {
		let name = self.inner.name();

		// The permit is taken and given back under the state lock, so no
		// snapshot shows it held by a request that never fetches
		let (permit, query, page, ticket) = {
			let mut st = self.inner.state.lock();
			let Some(permit) = self.inner.guard.try_acquire() else {
				debug!(collection = name, "append already in flight");
				return Ok(FetchOutcome::Skipped);
			};
			let Some(query) = st.store.last_query().cloned() else {
				return Ok(FetchOutcome::Skipped);
			};
			let Some(page) = st.store.page().checked_add(1) else {
				drop(permit);
				if st.store.has_more() {
					let last = st.store.page();
					warn!(collection = name, page = last, "no page after the last one, collection ends here");
					st.store.exhaust();
					self.inner.publish(&st);
				}
				return Ok(FetchOutcome::Skipped);
			};
			if !st.store.begin_append() {
				return Ok(FetchOutcome::Skipped);
			}
			let ticket = st.issue_ticket();
			st.append_ticket = Some(ticket);
			self.inner.publish(&st);
			(permit, query, page, ticket)
		};
		let page_size = query.page_size();
		debug!(collection = name, page, page_size, "append-fetch issued");

		let flight = InFlight::new(&self.inner, FetchScope::Append, ticket).holding(permit);
		let fetched = self.inner.fetcher.fetch_page(&query, page, page_size).await;
		flight.disarm();

		let mut st = self.inner.state.lock();
		let current = st.append_ticket == Some(ticket);
		if !current || st.store.last_query() != Some(&query) {
			if current {
				st.append_ticket = None;
				st.store.abandon(FetchScope::Append);
			}
			// The guard is free again; the boundary trigger may re-attach
			self.inner.publish(&st);
			info!(collection = name, page, "append result for superseded query discarded");
			return Ok(FetchOutcome::Discarded);
		}
		st.append_ticket = None;

		let result = match fetched {
			Ok(result) => result,
			Err(Error::MalformedResponse(msg)) => {
				warn!(collection = name, page, "malformed response treated as empty: {}", msg);
				st.store.note_malformed();
				PageResult::empty(page, page_size)
			}
			Err(err) => {
				warn!(collection = name, page, "append-fetch failed: {}", err);
				st.store.fail(&err, FetchScope::Append);
				st.last_failed = Some(FailedOp::Append { query, page });
				self.inner.publish(&st);
				return Err(err);
			}
		};
		let appended = st.store.append(result);
		if appended.is_ok() {
			st.last_failed = None;
		}
		self.inner.publish(&st);
		let records = appended?;
		info!(collection = name, page, records, has_more = st.store.has_more(), "page appended");
		Ok(FetchOutcome::Applied { records })
	}

	/// Re-issue the last failed fetch with its original query and page
	pub async fn retry(&self) -> SyncResult<FetchOutcome> {
		let failed = self.inner.state.lock().last_failed.clone();
		match failed {
			None => Ok(FetchOutcome::Skipped),
			Some(FailedOp::Replace { query }) => {
				let ticket = {
					let mut st = self.inner.state.lock();
					if st.target != query || st.store.is_loading() {
						None
					} else {
						Some(self.inner.begin_replace(&mut st))
					}
				};
				match ticket {
					Some(ticket) => {
						info!(collection = self.inner.name(), "retrying replace-fetch");
						self.drive_replace(query, ticket).await
					}
					// A newer query replaced the failed one
					None => self.evaluate().await,
				}
			}
			Some(FailedOp::Append { query, page }) => {
				let resumable = {
					let st = self.inner.state.lock();
					let same_query = st.store.last_query() == Some(&query);
					same_query && st.store.page().checked_add(1) == Some(page)
				};
				if !resumable {
					return Ok(FetchOutcome::Skipped);
				}
				info!(collection = self.inner.name(), page, "retrying append-fetch");
				self.request_append().await
			}
		}
	}

	/// Flag a document as seen
	pub fn mark_seen(&self, id: &RecordId) -> bool {
		self.patch(id, |record| record.set("seen", Value::Bool(true)))
	}

	/// Record a new last message on a chat contact
	///
	/// The collection is not re-sorted; ordering is recomputed on the next
	/// replace.
	pub fn update_last_message(&self, id: &RecordId, message: &str, at: DateTime<Utc>) -> bool {
		self.patch(id, |record| {
			record.set("last_message", Value::String(message.to_string()));
			record.set("last_chat_time", Value::String(at.to_rfc3339()));
			record.last_activity_at = Some(at);
		})
	}

	fn patch(&self, id: &RecordId, f: impl FnOnce(&mut Record)) -> bool {
		let mut st = self.inner.state.lock();
		let found = st.store.patch(id, f);
		if found {
			self.inner.publish(&st);
		}
		found
	}

	/// Empty the collection and forget the last query
	///
	/// Results of fetches still in flight are discarded when they arrive.
	pub fn clear(&self) {
		let mut st = self.inner.state.lock();
		st.store.clear();
		st.replace_ticket = None;
		st.append_ticket = None;
		st.last_failed = None;
		self.inner.publish(&st);
		debug!(collection = self.inner.name(), "collection cleared");
	}
}

// vim: ts=4
