//! Synchronizer settings
//!
//! The staleness TTL and the debounce window are plain parameters; the
//! defaults are the values the console has always used.

use std::time::Duration;

use crate::prelude::*;

pub const DEFAULT_STALE_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

pub const ENV_STALE_TTL_SECS: &str = "PAGESYNC_STALE_TTL_SECS";
pub const ENV_DEBOUNCE_MS: &str = "PAGESYNC_DEBOUNCE_MS";
pub const ENV_REVALIDATE_SECS: &str = "PAGESYNC_REVALIDATE_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
	/// Maximum age of the last successful fetch before a silent refresh
	pub stale_ttl: Duration,
	/// Quiet period before search text propagates
	pub debounce_window: Duration,
	/// Page size of the initial query
	pub page_size: u32,
	/// Re-evaluate staleness periodically, if set
	pub revalidate_every: Option<Duration>,
}

impl Default for SyncSettings {
	fn default() -> Self {
		Self {
			stale_ttl: DEFAULT_STALE_TTL,
			debounce_window: DEFAULT_DEBOUNCE_WINDOW,
			page_size: 10,
			revalidate_every: None,
		}
	}
}

impl SyncSettings {
	pub fn for_kind(kind: CollectionKind) -> Self {
		Self { page_size: kind.default_page_size(), ..Self::default() }
	}

	pub fn stale_ttl(mut self, ttl: Duration) -> Self {
		self.stale_ttl = ttl;
		self
	}

	pub fn debounce_window(mut self, window: Duration) -> Self {
		self.debounce_window = window;
		self
	}

	pub fn page_size(mut self, page_size: u32) -> Self {
		self.page_size = page_size;
		self
	}

	pub fn revalidate_every(mut self, period: Option<Duration>) -> Self {
		self.revalidate_every = period;
		self
	}

	pub fn validate(&self) -> SyncResult<()> {
		if self.page_size == 0 {
			return Err(Error::ConfigError("page size must be positive".into()));
		}
		if self.debounce_window.is_zero() {
			return Err(Error::ConfigError("debounce window must be positive".into()));
		}
		if self.revalidate_every.is_some_and(|p| p.is_zero()) {
			return Err(Error::ConfigError("revalidation period must be positive".into()));
		}
		Ok(())
	}

	/// Read settings for `kind` from the process environment
	pub fn from_env(kind: CollectionKind) -> SyncResult<Self> {
		Self::from_lookup(kind, |key| std::env::var(key).ok())
	}

	/// Read settings for `kind` through `lookup`
	///
	/// The page size variable is per kind (`PAGESYNC_CHAT_PAGE_SIZE`,
	/// `PAGESYNC_DOCUMENTS_PAGE_SIZE`); the rest are shared.
	pub fn from_lookup(
		kind: CollectionKind,
		lookup: impl Fn(&str) -> Option<String>,
	) -> SyncResult<Self> {
		let mut settings = Self::for_kind(kind);
		if let Some(secs) = parse_var(&lookup, ENV_STALE_TTL_SECS)? {
			settings.stale_ttl = Duration::from_secs(secs);
		}
		if let Some(ms) = parse_var(&lookup, ENV_DEBOUNCE_MS)? {
			settings.debounce_window = Duration::from_millis(ms);
		}
		if let Some(secs) = parse_var(&lookup, ENV_REVALIDATE_SECS)? {
			settings.revalidate_every = (secs > 0).then(|| Duration::from_secs(secs));
		}
		let page_size_var = format!("PAGESYNC_{}_PAGE_SIZE", kind.name().to_uppercase());
		if let Some(size) = parse_var(&lookup, &page_size_var)? {
			settings.page_size = u32::try_from(size)
				.map_err(|_| Error::ConfigError(format!("{} out of range", page_size_var)))?;
		}
		settings.validate()?;
		debug!(collection = kind.name(), ?settings, "settings loaded");
		Ok(settings)
	}
}

fn parse_var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> SyncResult<Option<u64>> {
	match lookup(key) {
		None => Ok(None),
		Some(raw) if raw.trim().is_empty() => Ok(None),
		Some(raw) => raw
			.trim()
			.parse::<u64>()
			.map(Some)
			.map_err(|e| Error::ConfigError(format!("{}={:?}: {}", key, raw, e))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars: HashMap<String, String> =
			vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
		move |key| vars.get(key).cloned()
	}

	#[test]
	fn test_defaults() {
		let chat = SyncSettings::from_lookup(CollectionKind::Chat, lookup(&[])).unwrap();
		assert_eq!(chat.stale_ttl, Duration::from_secs(300));
		assert_eq!(chat.debounce_window, Duration::from_millis(500));
		assert_eq!(chat.page_size, 10);
		let docs = SyncSettings::from_lookup(CollectionKind::Documents, lookup(&[])).unwrap();
		assert_eq!(docs.page_size, 20);
	}

	#[test]
	fn test_overrides() {
		let vars = [
			("PAGESYNC_STALE_TTL_SECS", "60"),
			("PAGESYNC_DEBOUNCE_MS", "250"),
			("PAGESYNC_REVALIDATE_SECS", "30"),
			("PAGESYNC_DOCUMENTS_PAGE_SIZE", "50"),
			("PAGESYNC_CHAT_PAGE_SIZE", "5"),
		];
		let docs = SyncSettings::from_lookup(CollectionKind::Documents, lookup(&vars)).unwrap();
		assert_eq!(docs.stale_ttl, Duration::from_secs(60));
		assert_eq!(docs.debounce_window, Duration::from_millis(250));
		assert_eq!(docs.revalidate_every, Some(Duration::from_secs(30)));
		assert_eq!(docs.page_size, 50);
	}

	#[test]
	fn test_invalid_values() {
		let bad = SyncSettings::from_lookup(CollectionKind::Chat, lookup(&[("PAGESYNC_DEBOUNCE_MS", "soon")]));
		assert!(matches!(bad, Err(Error::ConfigError(_))));
		let zero = SyncSettings::from_lookup(CollectionKind::Chat, lookup(&[("PAGESYNC_CHAT_PAGE_SIZE", "0")]));
		assert!(matches!(zero, Err(Error::ConfigError(_))));
	}
}

// vim: ts=4
