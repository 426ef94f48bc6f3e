//! Boundary trigger scenarios

mod common;

use common::*;
use pagesync_core::{ManualTrigger, ScrollTrigger};
use pagesync_types::prelude::*;
use std::sync::Arc;

#[tokio::test(start_paused = true)]
async fn test_attaches_only_while_more_available() {
	let (orch, calls) = documents();
	let boundary = Arc::new(ManualTrigger::new());
	let _trigger = ScrollTrigger::new(orch.clone(), boundary.clone()).spawn();

	settle().await;
	assert_eq!(boundary.registrations(), 0, "nothing to append before the first load");

	load(&orch, &calls, doc_records(0..10), Some(true)).await;
	settle().await;
	assert_eq!(boundary.registrations(), 1);

	assert_eq!(boundary.fire(), 1);
	let call = next_call(&calls).await;
	assert_eq!(call.page, 2);
	settle().await;
	assert_eq!(boundary.registrations(), 0, "detached while loading more");

	call.records(vec![], Some(true));
	settle().await;
	assert_eq!(boundary.registrations(), 0, "detached once the collection ran out");
	assert_eq!(boundary.fire(), 0);
	assert_no_call(&calls).await;
}

#[tokio::test(start_paused = true)]
async fn test_repeated_signals_issue_one_fetch() {
	let (orch, calls) = documents();
	let boundary = Arc::new(ManualTrigger::new());
	let _trigger = ScrollTrigger::new(orch.clone(), boundary.clone()).spawn();

	load(&orch, &calls, doc_records(0..10), Some(true)).await;
	settle().await;

	boundary.fire();
	boundary.fire();
	boundary.fire();
	let call = next_call(&calls).await;
	assert_eq!(call.page, 2);
	assert_no_call(&calls).await;

	call.records(doc_records(10..20), Some(true));
	settle().await;
	assert_eq!(item_ids(&orch), id_range(0..20));
	assert_eq!(boundary.registrations(), 1, "reattached after the append");

	boundary.fire();
	let call = next_call(&calls).await;
	assert_eq!(call.page, 3);
	call.records(doc_records(20..25), None);
	settle().await;
	assert_eq!(item_ids(&orch), id_range(0..25));
	assert_eq!(boundary.registrations(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reattaches_once_superseded_append_settles() {
	let (orch, calls) = documents();
	let boundary = Arc::new(ManualTrigger::new());
	let _trigger = ScrollTrigger::new(orch.clone(), boundary.clone()).spawn();

	load(&orch, &calls, doc_records(0..10), Some(true)).await;
	settle().await;
	boundary.fire();
	let call_page2 = next_call(&calls).await;
	assert_eq!(call_page2.page, 2);

	let replace = {
		let orch = orch.clone();
		tokio::spawn(async move { orch.set_query(QueryPatch::search("x")).await })
	};
	let call_x = next_call(&calls).await;
	call_x.records(doc_records(70..80), Some(true));
	replace.await.expect("task panicked").expect("replace failed");
	settle().await;

	let snapshot = orch.snapshot();
	assert!(snapshot.has_more);
	assert!(snapshot.append_pending, "old append still holds the guard");
	assert_eq!(boundary.registrations(), 0, "no signal can be lost to the held guard");
	assert_eq!(boundary.fire(), 0);
	assert_no_call(&calls).await;

	call_page2.records(doc_records(10..20), Some(true));
	settle().await;
	assert!(!orch.snapshot().append_pending);
	assert_eq!(boundary.registrations(), 1, "reattached when the guard came free");
	assert_eq!(item_ids(&orch), id_range(70..80));

	boundary.fire();
	let call = next_call(&calls).await;
	assert_eq!((call.page, call.query.search()), (2, "x"));
	call.records(doc_records(80..85), None);
	settle().await;
	assert_eq!(item_ids(&orch), id_range(70..85));
}

#[tokio::test(start_paused = true)]
async fn test_abort_cancels_running_append() {
	let (orch, calls) = documents();
	let boundary = Arc::new(ManualTrigger::new());
	let trigger = ScrollTrigger::new(orch.clone(), boundary.clone()).spawn();

	load(&orch, &calls, doc_records(0..10), Some(true)).await;
	settle().await;
	boundary.fire();
	let call = next_call(&calls).await;
	assert!(orch.snapshot().loading_more);

	trigger.abort();
	settle().await;
	let snapshot = orch.snapshot();
	assert!(!snapshot.loading_more);
	assert!(!snapshot.append_pending);

	call.records(doc_records(10..20), Some(true));
	settle().await;
	assert_eq!(item_ids(&orch), id_range(0..10), "aborted append never lands");
	assert_eq!(boundary.registrations(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_abort_unregisters() {
	let (orch, calls) = documents();
	let boundary = Arc::new(ManualTrigger::new());
	let trigger = ScrollTrigger::new(orch.clone(), boundary.clone()).spawn();

	load(&orch, &calls, doc_records(0..10), Some(true)).await;
	settle().await;
	assert_eq!(boundary.registrations(), 1);

	trigger.abort();
	settle().await;
	assert_eq!(boundary.registrations(), 0);
}

// vim: ts=4
