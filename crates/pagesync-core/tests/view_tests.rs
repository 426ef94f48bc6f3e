//! Collection view scenarios: debounced search, periodic revalidation

mod common;

use common::*;
use pagesync_core::{CollectionKind, CollectionView, FetchOutcome, ManualTrigger, SyncSettings};
use pagesync_types::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_search_is_debounced() {
	let (orch, calls) = documents();
	let boundary = Arc::new(ManualTrigger::new());
	let mut view = CollectionView::open(orch.clone(), boundary);
	load(&orch, &calls, doc_records(0..10), Some(true)).await;

	view.on_search_input("d");
	tokio::time::sleep(Duration::from_millis(100)).await;
	view.on_search_input("dr");
	tokio::time::sleep(Duration::from_millis(400)).await;
	view.on_search_input("dri");
	tokio::time::sleep(Duration::from_millis(499)).await;
	assert!(calls.try_recv().is_err(), "nothing before the window elapses");

	let call = next_call(&calls).await;
	assert_eq!(call.query.search(), "dri");
	assert_eq!(call.page, 1);
	call.records(doc_records(40..42), None);
	settle().await;
	assert_eq!(item_ids(&orch), id_range(40..42));

	tokio::time::sleep(Duration::from_secs(2)).await;
	assert_no_call(&calls).await;
}

#[tokio::test(start_paused = true)]
async fn test_immediate_fields_bypass_debounce() {
	let (orch, calls) = documents();
	let view = CollectionView::open(orch.clone(), Arc::new(ManualTrigger::new()));
	load(&orch, &calls, doc_records(0..10), Some(true)).await;

	let task = {
		let orch = view.orchestrator().clone();
		tokio::spawn(async move { orch.set_query(QueryPatch::default().with_category(Some(Category::F))).await })
	};
	let call = tokio::time::timeout(Duration::from_millis(1), calls.recv_async())
		.await
		.expect("category change fetches without delay")
		.expect("fetcher dropped");
	assert_eq!(call.query.category(), Some(Category::F));
	call.records(doc_records(0..1), None);
	assert_eq!(task.await.expect("task panicked"), Ok(FetchOutcome::Applied { records: 1 }));
}

#[tokio::test(start_paused = true)]
async fn test_drop_cancels_pending_search() {
	let (orch, calls) = documents();
	let boundary = Arc::new(ManualTrigger::new());
	let mut view = CollectionView::open(orch.clone(), boundary.clone());
	load(&orch, &calls, doc_records(0..10), Some(true)).await;
	settle().await;
	assert_eq!(boundary.registrations(), 1);

	view.on_search_input("late");
	drop(view);
	tokio::time::sleep(Duration::from_secs(1)).await;
	assert_no_call(&calls).await;
	assert_eq!(boundary.registrations(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_revalidation() {
	setup_test_logging();
	let settings = SyncSettings::for_kind(CollectionKind::Documents)
		.stale_ttl(Duration::from_secs(100))
		.revalidate_every(Some(Duration::from_secs(60)));
	let (orch, calls) = orchestrator(CollectionKind::Documents, settings);
	let _view = CollectionView::open(orch.clone(), Arc::new(ManualTrigger::new()));
	load(&orch, &calls, doc_records(0..5), None).await;

	// First tick at 60s: still fresh
	tokio::time::sleep(Duration::from_secs(61)).await;
	assert!(calls.try_recv().is_err());

	// Second tick at 120s: stale
	let call = next_call(&calls).await;
	assert_eq!(call.page, 1);
	call.records(doc_records(5..8), None);
	settle().await;
	assert_eq!(item_ids(&orch), id_range(5..8));
}

// vim: ts=4
