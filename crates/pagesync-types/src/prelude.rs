pub use crate::error::{Error, ErrorKind, SyncResult};
pub use crate::query::{Category, QueryKey, QueryPatch, SeenStatus};
pub use crate::record::{Record, RecordId};

pub use tracing::{debug, debug_span, error, info, info_span, warn};

// vim: ts=4
