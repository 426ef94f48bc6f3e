//! One rendered collection
//!
//! A [`CollectionView`] is what a screen holds while it shows a collection:
//! the orchestrator plus the background tasks around it (search debouncing,
//! the scroll trigger, periodic revalidation). Dropping the view stops all of
//! them and cancels a pending search.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};

use crate::debounce::Debouncer;
use crate::orchestrator::{FetchOrchestrator, FetchOutcome};
use crate::prelude::*;
use crate::scroll::ScrollTrigger;
use crate::store::Snapshot;
use pagesync_types::boundary::BoundaryTrigger;

#[derive(Debug)]
pub struct CollectionView {
	orchestrator: FetchOrchestrator,
	debouncer: Debouncer<String>,
	tasks: Vec<JoinHandle<()>>,
}

impl CollectionView {
	/// Start the background tasks of `orchestrator`
	///
	/// Nothing is fetched until the first [`refresh`](Self::refresh) or query
	/// change.
	pub fn open(orchestrator: FetchOrchestrator, boundary: Arc<dyn BoundaryTrigger>) -> Self {
		let settings = orchestrator.settings().clone();
		let (debouncer, settled) = Debouncer::new(settings.debounce_window);

		let mut tasks = vec![
			tokio::spawn(forward_search(orchestrator.clone(), settled)),
			ScrollTrigger::new(orchestrator.clone(), boundary).spawn(),
		];
		if let Some(period) = settings.revalidate_every {
			tasks.push(tokio::spawn(revalidate_periodically(orchestrator.clone(), period)));
		}
		info!(collection = orchestrator.kind().name(), "view opened");

		Self { orchestrator, debouncer, tasks }
	}

	pub fn orchestrator(&self) -> &FetchOrchestrator {
		&self.orchestrator
	}

	pub fn snapshot(&self) -> Snapshot {
		self.orchestrator.snapshot()
	}

	pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
		self.orchestrator.subscribe()
	}

	/// Raw search text, one call per keystroke
	pub fn on_search_input(&mut self, text: impl Into<String>) {
		self.debouncer.on_input(text.into());
	}

	/// Change any non-search field; takes effect immediately
	pub async fn set_query(&self, patch: QueryPatch) -> SyncResult<FetchOutcome> {
		self.orchestrator.set_query(patch).await
	}

	/// Load the current query unless the collection is fresh
	pub async fn refresh(&self) -> SyncResult<FetchOutcome> {
		self.orchestrator.revalidate().await
	}

	pub async fn retry(&self) -> SyncResult<FetchOutcome> {
		self.orchestrator.retry().await
	}

	pub async fn request_append(&self) -> SyncResult<FetchOutcome> {
		self.orchestrator.request_append().await
	}
}

impl Drop for CollectionView {
	fn drop(&mut self) {
		self.debouncer.cancel();
		for task in self.tasks.drain(..) {
			task.abort();
		}
		debug!(collection = self.orchestrator.kind().name(), "view closed");
	}
}

/// Feed settled search values into the orchestrator
///
/// Each value is evaluated in its own task so a slow fetch never holds back
/// the next value; the orchestrator discards whatever gets superseded.
async fn forward_search(orchestrator: FetchOrchestrator, settled: flume::Receiver<String>) {
	let name = orchestrator.kind().name();
	let mut running = JoinSet::new();
	loop {
		tokio::select! {
			value = settled.recv_async() => {
				let Ok(search) = value else { break };
				debug!(collection = name, search = %search, "search settled");
				let orchestrator = orchestrator.clone();
				running.spawn(async move { orchestrator.set_query(QueryPatch::search(search)).await });
			}
			Some(done) = running.join_next(), if !running.is_empty() => {
				match done {
					Ok(Ok(outcome)) => debug!(collection = name, ?outcome, "search evaluated"),
					Ok(Err(err)) => warn!(collection = name, "search fetch failed: {}", err),
					Err(err) => warn!(collection = name, "search task failed: {}", err),
				}
			}
		}
	}
}

async fn revalidate_periodically(orchestrator: FetchOrchestrator, period: std::time::Duration) {
	let name = orchestrator.kind().name();
	let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
	loop {
		ticker.tick().await;
		match orchestrator.revalidate().await {
			Ok(FetchOutcome::Skipped) => {}
			Ok(outcome) => debug!(collection = name, ?outcome, "revalidated"),
			Err(err) => warn!(collection = name, "revalidation failed: {}", err),
		}
	}
}

// vim: ts=4
