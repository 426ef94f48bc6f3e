//! Incremental paginated-collection synchronizer.
//!
//! Turns a stream of query changes (debounced search text, filters, date
//! ranges) and boundary signals ("the end of the list is nearly visible") into
//! an ordered sequence of page fetches, while keeping one in-memory collection
//! per view that is either replaced (new query) or appended to (next page).
//!
//! Each collection is owned by exactly one [`FetchOrchestrator`]; nothing is
//! shared between collections.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod debounce;
pub mod guard;
pub mod kind;
pub mod orchestrator;
pub mod prelude;
pub mod rest;
pub mod scroll;
pub mod settings;
pub mod store;
pub mod view;

pub use debounce::Debouncer;
pub use guard::{GuardPermit, RequestGuard};
pub use kind::CollectionKind;
pub use orchestrator::{FetchOrchestrator, FetchOutcome};
pub use rest::RestPageFetcher;
pub use scroll::{ManualTrigger, ScrollTrigger};
pub use settings::SyncSettings;
pub use store::{CollectionStore, Diagnostics, ErrorInfo, FetchScope, Snapshot};
pub use view::CollectionView;

// vim: ts=4
