use std::env;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use pagesync::prelude::*;
use pagesync::transport::StaticToken;
use pagesync::{ManualTrigger, SyncSettings};
use pagesync_transport_hyper::{DEFAULT_TIMEOUT, HyperTransport};

const ENV_API_BASE: &str = "PAGESYNC_API_BASE";
const ENV_TOKEN: &str = "PAGESYNC_TOKEN";
const ENV_TIMEOUT_SECS: &str = "PAGESYNC_TIMEOUT_SECS";
const ENV_PAGES: &str = "PAGESYNC_PAGES";

pub struct Config {
	pub api_base: Url,
	pub token: Option<Box<str>>,
	pub timeout: Duration,
	/// Pages to load per collection, including the first
	pub pages: u32,
}

impl Config {
	fn from_env() -> SyncResult<Self> {
		let api_base = env::var(ENV_API_BASE)
			.map_err(|_| Error::ConfigError(format!("{} is not set", ENV_API_BASE)))?;
		let timeout = match env::var(ENV_TIMEOUT_SECS) {
			Ok(secs) => Duration::from_secs(secs.trim().parse().map_err(|e| {
				Error::ConfigError(format!("{}={:?}: {}", ENV_TIMEOUT_SECS, secs, e))
			})?),
			Err(_) => DEFAULT_TIMEOUT,
		};
		let pages = match env::var(ENV_PAGES) {
			Ok(n) => n
				.trim()
				.parse()
				.map_err(|e| Error::ConfigError(format!("{}={:?}: {}", ENV_PAGES, n, e)))?,
			Err(_) => 3,
		};
		Ok(Config {
			api_base: Url::parse(&api_base)?,
			token: env::var(ENV_TOKEN).ok().filter(|t| !t.is_empty()).map(Into::into),
			timeout,
			pages,
		})
	}
}

fn report(name: &str, snapshot: &Snapshot) {
	info!(
		collection = name,
		items = snapshot.items.len(),
		page = snapshot.page,
		has_more = snapshot.has_more,
		total = ?snapshot.total,
		"loaded"
	);
	if let Some(err) = &snapshot.error {
		warn!(collection = name, kind = ?err.kind, status = ?err.status, "last fetch failed: {}", err.message);
	}
}

async fn load_pages(name: &str, view: &CollectionView, pages: u32) {
	for _ in 1..pages {
		match view.request_append().await {
			Ok(FetchOutcome::Applied { .. }) => {}
			Ok(_) => break,
			Err(err) => {
				warn!(collection = name, "append failed: {}", err);
				break;
			}
		}
	}
	report(name, &view.snapshot());
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> SyncResult<()> {
	pagesync::init_logging();
	let config = Config::from_env()?;
	info!(api_base = %config.api_base, pages = config.pages, "starting");

	let transport = HyperTransport::new(config.timeout)?;
	let console = ConsoleBuilder::new()
		.api_base(config.api_base)
		.transport(Arc::new(transport))
		.token(Arc::new(StaticToken(config.token)))
		.chat_settings(SyncSettings::from_env(CollectionKind::Chat)?)
		.document_settings(SyncSettings::from_env(CollectionKind::Documents)?)
		.build(Arc::new(ManualTrigger::new()), Arc::new(ManualTrigger::new()))?;

	let (chat, documents) = tokio::join!(console.chat.refresh(), console.documents.refresh());
	for (name, outcome) in [("chat", chat), ("documents", documents)] {
		if let Err(err) = outcome {
			error!(collection = name, "initial load failed: {}", err);
		}
	}

	tokio::join!(
		load_pages("chat", &console.chat, config.pages),
		load_pages("documents", &console.documents, config.pages),
	);
	Ok(())
}

// vim: ts=4
