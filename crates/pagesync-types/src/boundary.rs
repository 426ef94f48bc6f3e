//! Boundary trigger capability
//!
//! Something outside the synchronizer knows when the end of a rendered list
//! comes close to the viewport. It accepts a callback and invokes it each time
//! that happens, until the registration is removed.

use std::fmt::Debug;
use std::sync::Arc;

pub type BoundaryCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(pub u64);

pub trait BoundaryTrigger: Debug + Send + Sync {
	fn register(&self, callback: BoundaryCallback) -> RegistrationId;
	fn unregister(&self, id: RegistrationId);
}

// vim: ts=4
