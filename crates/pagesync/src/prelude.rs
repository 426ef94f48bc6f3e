pub use pagesync_core::prelude::*;

pub use crate::console::{Console, ConsoleBuilder};
pub use pagesync_core::{CollectionView, FetchOutcome, Snapshot};

// vim: ts=4
