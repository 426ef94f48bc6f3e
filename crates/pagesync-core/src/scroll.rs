//! Boundary-driven loading
//!
//! A [`ScrollTrigger`] keeps a registration with a [`BoundaryTrigger`] exactly
//! while the collection can take another page, and turns each boundary signal
//! into an append request. Registration follows the snapshot: it is dropped as
//! soon as a load starts or the collection runs out, and renewed once the
//! collection can grow again.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::{JoinHandle, JoinSet};

use crate::orchestrator::{FetchOrchestrator, FetchOutcome};
use crate::prelude::*;
use crate::store::Snapshot;
use pagesync_types::boundary::{BoundaryCallback, BoundaryTrigger, RegistrationId};

/// Boundary trigger fired by hand
///
/// Stands in for a viewport observer in headless hosts and tests.
#[derive(Default)]
pub struct ManualTrigger {
	callbacks: Mutex<Vec<(RegistrationId, BoundaryCallback)>>,
	next_id: AtomicU64,
}

impl fmt::Debug for ManualTrigger {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ManualTrigger").field("registrations", &self.registrations()).finish()
	}
}

impl ManualTrigger {
	pub fn new() -> Self {
		Self::default()
	}

	/// Signal that the boundary is visible; returns how many callbacks ran
	pub fn fire(&self) -> usize {
		let callbacks: Vec<BoundaryCallback> =
			self.callbacks.lock().iter().map(|(_, cb)| Arc::clone(cb)).collect();
		for cb in &callbacks {
			cb();
		}
		callbacks.len()
	}

	pub fn registrations(&self) -> usize {
		self.callbacks.lock().len()
	}
}

impl BoundaryTrigger for ManualTrigger {
	fn register(&self, callback: BoundaryCallback) -> RegistrationId {
		let id = RegistrationId(self.next_id.fetch_add(1, Ordering::Relaxed));
		self.callbacks.lock().push((id, callback));
		id
	}

	fn unregister(&self, id: RegistrationId) {
		self.callbacks.lock().retain(|(reg, _)| *reg != id);
	}
}

#[derive(Debug)]
pub struct ScrollTrigger {
	orchestrator: FetchOrchestrator,
	boundary: Arc<dyn BoundaryTrigger>,
	registration: Option<RegistrationId>,
	signal_tx: flume::Sender<()>,
	signal_rx: flume::Receiver<()>,
}

impl ScrollTrigger {
	pub fn new(orchestrator: FetchOrchestrator, boundary: Arc<dyn BoundaryTrigger>) -> Self {
		let (signal_tx, signal_rx) = flume::bounded(1);
		Self { orchestrator, boundary, registration: None, signal_tx, signal_rx }
	}

	pub fn is_attached(&self) -> bool {
		self.registration.is_some()
	}

	/// Attach or detach according to `snapshot`
	pub fn sync(&mut self, snapshot: &Snapshot) {
		let name = self.orchestrator.kind().name();
		match (snapshot.can_append(), self.registration) {
			(true, None) => {
				let tx = self.signal_tx.clone();
				// A full channel already holds a pending signal
				let callback: BoundaryCallback = Arc::new(move || {
					let _ = tx.try_send(());
				});
				self.registration = Some(self.boundary.register(callback));
				debug!(collection = name, "boundary trigger attached");
			}
			(false, Some(id)) => {
				self.boundary.unregister(id);
				self.registration = None;
				self.signal_rx.drain().for_each(drop);
				debug!(collection = name, "boundary trigger detached");
			}
			_ => {}
		}
	}

	/// Follow the collection until its snapshot channel closes
	///
	/// Appends started here are aborted together with the loop.
	pub async fn run(mut self) {
		let mut snapshots = self.orchestrator.subscribe();
		let mut appends = JoinSet::new();
		loop {
			let snapshot = snapshots.borrow_and_update().clone();
			self.sync(&snapshot);

			tokio::select! {
				changed = snapshots.changed() => {
					if changed.is_err() {
						break;
					}
				}
				signal = self.signal_rx.recv_async() => {
					if signal.is_err() {
						break;
					}
					if self.is_attached() && self.orchestrator.snapshot().can_append() {
						appends.spawn(append(self.orchestrator.clone()));
					}
				}
				Some(_) = appends.join_next(), if !appends.is_empty() => {}
			}
		}
	}

	pub fn spawn(self) -> JoinHandle<()> {
		tokio::spawn(self.run())
	}
}

async fn append(orchestrator: FetchOrchestrator) {
	let name = orchestrator.kind().name();
	match orchestrator.request_append().await {
		Ok(FetchOutcome::Applied { records }) => debug!(collection = name, records, "boundary append done"),
		Ok(outcome) => debug!(collection = name, ?outcome, "boundary append not applied"),
		Err(err) => warn!(collection = name, "boundary append failed: {}", err),
	}
}

impl Drop for ScrollTrigger {
	fn drop(&mut self) {
		if let Some(id) = self.registration.take() {
			self.boundary.unregister(id);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::AtomicUsize;

	#[test]
	fn test_manual_trigger() {
		let trigger = ManualTrigger::new();
		let hits = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&hits);
		let id = trigger.register(Arc::new(move || {
			counter.fetch_add(1, Ordering::SeqCst);
		}));

		assert_eq!(trigger.fire(), 1);
		assert_eq!(trigger.fire(), 1);
		assert_eq!(hits.load(Ordering::SeqCst), 2);

		trigger.unregister(id);
		assert_eq!(trigger.fire(), 0);
		assert_eq!(trigger.registrations(), 0);
	}
}

// vim: ts=4
