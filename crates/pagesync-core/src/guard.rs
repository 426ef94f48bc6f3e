//! Append request guard
//!
//! A collection-local token that at most one "load more" holds at a time.
//! The token is released when its [`GuardPermit`] is dropped, so every exit
//! path of an append (success, failure, early return, cancellation) gives it
//! back.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct RequestGuard {
	held: Arc<AtomicBool>,
}

impl RequestGuard {
	pub fn new() -> Self {
		Self::default()
	}

	/// Take the token, or `None` if someone else holds it
	pub fn try_acquire(&self) -> Option<GuardPermit> {
		self.held
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.ok()
			.map(|_| GuardPermit { held: Arc::clone(&self.held) })
	}

	pub fn is_held(&self) -> bool {
		self.held.load(Ordering::Acquire)
	}
}

/// Proof of holding the [`RequestGuard`]
#[derive(Debug)]
pub struct GuardPermit {
	held: Arc<AtomicBool>,
}

impl Drop for GuardPermit {
	fn drop(&mut self) {
		self.held.store(false, Ordering::Release);
	}
}


// vim: ts=4
