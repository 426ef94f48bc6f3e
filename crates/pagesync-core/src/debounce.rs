//! Input debouncing
//!
//! Free-text search changes on every keystroke. A [`Debouncer`] holds the
//! latest value back until the input has been quiet for a fixed window and
//! then emits it on its channel. Every new input restarts the window; at most
//! one timer is pending per instance and dropping the instance cancels it.

use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct Debouncer<T> {
	window: Duration,
	tx: flume::Sender<T>,
	pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
	/// Create a debouncer and the receiver its settled values arrive on
	pub fn new(window: Duration) -> (Self, flume::Receiver<T>) {
		let (tx, rx) = flume::unbounded();
		(Self { window, tx, pending: None }, rx)
	}

	pub fn window(&self) -> Duration {
		self.window
	}

	/// Schedule `value` for emission, replacing whatever was pending
	pub fn on_input(&mut self, value: T) {
		self.cancel();
		let tx = self.tx.clone();
		let window = self.window;
		self.pending = Some(tokio::spawn(async move {
			tokio::time::sleep(window).await;
			// Receiver gone means the owning view is gone
			let _ = tx.send(value);
		}));
	}

	/// Drop the pending value, if any
	pub fn cancel(&mut self) {
		if let Some(handle) = self.pending.take() {
			handle.abort();
		}
	}

	pub fn is_pending(&self) -> bool {
		self.pending.as_ref().is_some_and(|h| !h.is_finished())
	}
}

impl<T> Drop for Debouncer<T> {
	fn drop(&mut self) {
		if let Some(handle) = self.pending.take() {
			handle.abort();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tokio::time::Instant;

	const WINDOW: Duration = Duration::from_millis(500);

	#[tokio::test(start_paused = true)]
	async fn test_rapid_input_settles_once() {
		let (mut debouncer, settled) = Debouncer::new(WINDOW);
		let start = Instant::now();

		debouncer.on_input("d".to_string());
		tokio::time::sleep(Duration::from_millis(200)).await;
		debouncer.on_input("dr".to_string());
		tokio::time::sleep(Duration::from_millis(499)).await;
		debouncer.on_input("dri".to_string());

		let value = settled.recv_async().await.unwrap();
		assert_eq!(value, "dri");
		assert!(start.elapsed() >= Duration::from_millis(200 + 499 + 500));

		tokio::time::sleep(WINDOW * 4).await;
		assert!(settled.try_recv().is_err(), "only one settled value expected");
	}

	#[tokio::test(start_paused = true)]
	async fn test_separate_bursts_emit_separately() {
		let (mut debouncer, settled) = Debouncer::new(WINDOW);

		debouncer.on_input(1);
		tokio::time::sleep(Duration::from_millis(600)).await;
		debouncer.on_input(2);
		tokio::time::sleep(Duration::from_millis(600)).await;

		assert_eq!(settled.try_iter().collect::<Vec<_>>(), vec![1, 2]);
	}

	#[tokio::test(start_paused = true)]
	async fn test_drop_cancels_pending() {
		let (mut debouncer, settled) = Debouncer::new(WINDOW);
		debouncer.on_input("gone");
		assert!(debouncer.is_pending());
		drop(debouncer);

		tokio::time::sleep(WINDOW * 2).await;
		assert!(settled.try_recv().is_err());
	}

	#[tokio::test(start_paused = true)]
	async fn test_cancel() {
		let (mut debouncer, settled) = Debouncer::new(WINDOW);
		debouncer.on_input(7);
		debouncer.cancel();
		assert!(!debouncer.is_pending());
		tokio::time::sleep(WINDOW * 2).await;
		assert!(settled.try_recv().is_err());
	}
}

// vim: ts=4
