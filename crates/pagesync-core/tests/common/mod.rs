//! Common test utilities
//!
//! The scripted fetcher hands every fetch to the test instead of answering it,
//! so a test decides when each response arrives and in which order. Tests run
//! on the current-thread runtime with paused time, which makes "when" exact.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::channel::oneshot;
use serde_json::{Value, json};
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use pagesync_core::{CollectionKind, FetchOrchestrator, SyncSettings};
use pagesync_types::fetcher::{PageFetcher, PageResult};
use pagesync_types::prelude::*;

/// How long a test waits for an expected fetch (virtual time)
const CALL_TIMEOUT: Duration = Duration::from_secs(600);

pub fn setup_test_logging() {
	let _ = tracing_subscriber::fmt()
		.with_test_writer()
		.with_max_level(tracing::Level::DEBUG)
		.try_init();
}

/// One fetch waiting for its answer
#[derive(Debug)]
pub struct FetchCall {
	pub query: QueryKey,
	pub page: u32,
	pub page_size: u32,
	reply: oneshot::Sender<SyncResult<PageResult>>,
}

impl FetchCall {
	pub fn respond(self, result: SyncResult<PageResult>) {
		// The caller may have been dropped
		let _ = self.reply.send(result);
	}

	/// Answer with `records` for the requested page
	pub fn records(self, records: Vec<Value>, has_more: Option<bool>) {
		let result = PageResult {
			records,
			has_more,
			page: self.page,
			page_size: self.page_size,
			total: None,
		};
		self.respond(Ok(result));
	}

	pub fn fail(self, err: Error) {
		self.respond(Err(err));
	}
}

#[derive(Debug)]
pub struct ScriptedFetcher {
	calls: flume::Sender<FetchCall>,
}

impl ScriptedFetcher {
	pub fn new() -> (Arc<Self>, flume::Receiver<FetchCall>) {
		let (calls, rx) = flume::unbounded();
		(Arc::new(Self { calls }), rx)
	}
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
	async fn fetch_page(
		&self,
		query: &QueryKey,
		page: u32,
		page_size: u32,
	) -> SyncResult<PageResult> {
		let (reply, answer) = oneshot::channel();
		let call = FetchCall { query: query.clone(), page, page_size, reply };
		self.calls
			.send(call)
			.map_err(|_| Error::NetworkError("test script gone".into()))?;
		answer
			.await
			.unwrap_or_else(|_| Err(Error::NetworkError("no answer scripted".into())))
	}
}

/// An orchestrator for `kind` with no date range, wired to a scripted fetcher
pub fn orchestrator(
	kind: CollectionKind,
	settings: SyncSettings,
) -> (FetchOrchestrator, flume::Receiver<FetchCall>) {
	let (fetcher, calls) = ScriptedFetcher::new();
	let initial = QueryKey::builder(settings.page_size).build().expect("valid query");
	(FetchOrchestrator::new(kind, settings, initial, fetcher), calls)
}

/// Documents orchestrator with page size 10
pub fn documents() -> (FetchOrchestrator, flume::Receiver<FetchCall>) {
	setup_test_logging();
	orchestrator(CollectionKind::Documents, SyncSettings::for_kind(CollectionKind::Documents).page_size(10))
}

/// Wait for the next fetch; fails the test if none is issued
pub async fn next_call(calls: &flume::Receiver<FetchCall>) -> FetchCall {
	tokio::time::timeout(CALL_TIMEOUT, calls.recv_async())
		.await
		.expect("expected a fetch to be issued")
		.expect("fetcher dropped")
}

/// Let every runnable task run to its next suspension point
pub async fn settle() {
	tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Settle, then assert no fetch was issued
pub async fn assert_no_call(calls: &flume::Receiver<FetchCall>) {
	settle().await;
	if let Ok(call) = calls.try_recv() {
		panic!("unexpected fetch: page {} of {:?}", call.page, call.query);
	}
}

/// Document records with numeric ids from `ids`
pub fn doc_records(ids: Range<u32>) -> Vec<Value> {
	ids.map(|id| json!({ "id": id, "title": format!("Document {}", id), "seen": false })).collect()
}

pub fn chat_record(id: &str, last_chat_time: Option<&str>) -> Value {
	json!({ "userid": id, "name": format!("User {}", id), "last_chat_time": last_chat_time })
}

pub fn item_ids(orchestrator: &FetchOrchestrator) -> Vec<String> {
	orchestrator.snapshot().items.iter().map(|r| r.id.to_string()).collect()
}

pub fn id_range(ids: Range<u32>) -> Vec<String> {
	ids.map(|id| id.to_string()).collect()
}

/// Run the initial load of `orchestrator` answering with `records`
pub async fn load(
	orchestrator: &FetchOrchestrator,
	calls: &flume::Receiver<FetchCall>,
	records: Vec<Value>,
	has_more: Option<bool>,
) {
	let orch = orchestrator.clone();
	let task = tokio::spawn(async move { orch.revalidate().await });
	let call = next_call(calls).await;
	assert_eq!(call.page, 1);
	call.records(records, has_more);
	task.await.expect("task panicked").expect("initial load failed");
}

// vim: ts=4
