//! Console builder - wires both collections of the admin console

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use url::Url;

use crate::prelude::*;
use pagesync_core::{FetchOrchestrator, RestPageFetcher};
use pagesync_types::boundary::BoundaryTrigger;
use pagesync_types::transport::{JsonTransport, StaticToken, TokenSource};

/// The two collections of the console
///
/// They share nothing but the transport; each has its own store, guard,
/// debouncer and scroll trigger.
#[derive(Debug)]
pub struct Console {
	pub chat: CollectionView,
	pub documents: CollectionView,
}

impl Console {
	/// Load both collections, or refresh whichever went stale
	pub async fn refresh_all(&self) -> SyncResult<(FetchOutcome, FetchOutcome)> {
		let (chat, documents) = tokio::join!(self.chat.refresh(), self.documents.refresh());
		Ok((chat?, documents?))
	}
}

pub struct ConsoleBuilder {
	api_base: Option<Url>,
	transport: Option<Arc<dyn JsonTransport>>,
	token: Arc<dyn TokenSource>,
	chat_settings: SyncSettings,
	document_settings: SyncSettings,
	today: Option<NaiveDate>,
}

impl Default for ConsoleBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConsoleBuilder {
	pub fn new() -> Self {
		ConsoleBuilder {
			api_base: None,
			transport: None,
			token: Arc::new(StaticToken::default()),
			chat_settings: SyncSettings::for_kind(CollectionKind::Chat),
			document_settings: SyncSettings::for_kind(CollectionKind::Documents),
			today: None,
		}
	}

	pub fn api_base(&mut self, api_base: Url) -> &mut Self {
		self.api_base = Some(api_base);
		self
	}
	pub fn transport(&mut self, transport: Arc<dyn JsonTransport>) -> &mut Self {
		self.transport = Some(transport);
		self
	}
	pub fn token(&mut self, token: Arc<dyn TokenSource>) -> &mut Self {
		self.token = token;
		self
	}
	pub fn chat_settings(&mut self, settings: SyncSettings) -> &mut Self {
		self.chat_settings = settings;
		self
	}
	pub fn document_settings(&mut self, settings: SyncSettings) -> &mut Self {
		self.document_settings = settings;
		self
	}
	/// Anchor of the default document date range; defaults to the current UTC date
	pub fn today(&mut self, today: NaiveDate) -> &mut Self {
		self.today = Some(today);
		self
	}

	/// Build the console and start its background tasks
	///
	/// Must be called from within a tokio runtime. Nothing is fetched until
	/// [`Console::refresh_all`] or a query change.
	pub fn build(
		&self,
		chat_boundary: Arc<dyn BoundaryTrigger>,
		documents_boundary: Arc<dyn BoundaryTrigger>,
	) -> SyncResult<Console> {
		let api_base =
			self.api_base.as_ref().ok_or_else(|| Error::ConfigError("API base URL not set".into()))?;
		let transport =
			self.transport.clone().ok_or_else(|| Error::ConfigError("transport not set".into()))?;
		let today = self.today.unwrap_or_else(|| Utc::now().date_naive());

		let chat = self.open(CollectionKind::Chat, &self.chat_settings, api_base, &transport, today, chat_boundary)?;
		let documents = self.open(
			CollectionKind::Documents,
			&self.document_settings,
			api_base,
			&transport,
			today,
			documents_boundary,
		)?;
		info!(api_base = %api_base, "console ready");
		Ok(Console { chat, documents })
	}

	fn open(
		&self,
		kind: CollectionKind,
		settings: &SyncSettings,
		api_base: &Url,
		transport: &Arc<dyn JsonTransport>,
		today: NaiveDate,
		boundary: Arc<dyn BoundaryTrigger>,
	) -> SyncResult<CollectionView> {
		settings.validate()?;
		let fetcher = RestPageFetcher::new(kind, api_base, Arc::clone(transport), Arc::clone(&self.token))?;
		let initial = kind.default_query(today, settings.page_size)?;
		let orchestrator = FetchOrchestrator::new(kind, settings.clone(), initial, Arc::new(fetcher));
		Ok(CollectionView::open(orchestrator, boundary))
	}
}

// vim: ts=4
