pub use pagesync_types::prelude::*;

pub use crate::kind::CollectionKind;
pub use crate::settings::SyncSettings;

// vim: ts=4
