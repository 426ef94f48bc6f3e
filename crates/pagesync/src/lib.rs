//! pagesync keeps the collections of an admin console in step with a
//! paginated REST API.
//!
//! # Features
//!
//! - Two independent collections
//!     - chat contacts, ordered by latest activity
//!     - documents, filtered by date range, category, type, seen and flagged state
//! - Query-driven replace, boundary-driven append
//!     - debounced free-text search
//!     - at most one "load more" in flight per collection
//!     - results for superseded queries are discarded
//! - Silent refresh of stale collections
//! - Read-only snapshots published on a watch channel
//!
//! The transport is pluggable; see `pagesync-transport-hyper` for an HTTPS
//! implementation.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub use pagesync_types::boundary;
pub use pagesync_types::error;
pub use pagesync_types::fetcher;
pub use pagesync_types::query;
pub use pagesync_types::record;
pub use pagesync_types::transport;

pub use pagesync_core::{
	CollectionKind, CollectionStore, CollectionView, Debouncer, Diagnostics, ErrorInfo,
	FetchOrchestrator, FetchOutcome, FetchScope, ManualTrigger, RequestGuard, RestPageFetcher,
	ScrollTrigger, Snapshot, SyncSettings,
};
pub use pagesync_core::settings;

pub mod console;
pub mod prelude;

pub use console::{Console, ConsoleBuilder};

/// Install the fmt subscriber, filtered by `RUST_LOG`
///
/// Does nothing if a global subscriber is already set.
pub fn init_logging() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_target(false)
		.try_init();
}

// vim: ts=4
