// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use rstest::{fixture, rstest};

use super::*;
use crate::error::ErrorKind;
use crate::model::{PagedDocument, TextRun};
use crate::testing::TempDir;

#[fixture]
fn store() -> SessionStore<PagedDocument> {
    SessionStore::new(&RuntimeConfig::default().with_lock_timeout(Some(Duration::from_millis(50))))
}

fn text_run(text: &str) -> TextRun {
    TextRun { text: text.to_owned(), x: 72.0, y: 720.0, font_size: 12.0 }
}

#[rstest]
fn open_reports_missing_and_corrupt_files_separately(store: SessionStore<PagedDocument>) {
    let tmp = TempDir::new("session-open");

    let err = store.open(tmp.path().join("missing.json")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);

    let corrupt = tmp.path().join("corrupt.json");
    fs::write(&corrupt, "not a document").expect("seed");
    let err = store.open(&corrupt).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamFailure);

    assert!(store.is_empty());
}

#[rstest]
fn open_allocates_distinct_ids_for_the_same_file(store: SessionStore<PagedDocument>) {
    let tmp = TempDir::new("session-ids");
    let path = tmp.seed("doc.json", &PagedDocument::with_blank_pages(1));

    let a = store.open(&path).expect("open a");
    let b = store.open(&path).expect("open b");

    assert_ne!(a, b);
    assert_eq!(store.len(), 2);
    assert!(a.as_str().starts_with("paged-"));
}

#[rstest]
fn unknown_ids_are_not_found(store: SessionStore<PagedDocument>) {
    assert_eq!(store.get("paged-nope").err().expect("expected error").kind(), ErrorKind::SessionNotFound);
    assert_eq!(store.mark_dirty("paged-nope").unwrap_err().kind(), ErrorKind::SessionNotFound);
}

#[rstest]
#[tokio::test]
async fn the_live_document_is_shared_across_acquisitions(store: SessionStore<PagedDocument>) {
    let id = store.adopt(PagedDocument::with_blank_pages(1), None);

    {
        let mut guard = store.acquire(id.as_str()).await.expect("first");
        guard.document_mut().pages_mut()[0].texts.push(text_run("kept"));
    }

    let guard = store.acquire(id.as_str()).await.expect("second");
    assert_eq!(guard.document().page_texts(), vec!["kept".to_owned()]);
    assert!(Arc::ptr_eq(
        &store.get(id.as_str()).expect("entry"),
        &store.get(id.as_str()).expect("entry again")
    ));
}

#[rstest]
#[tokio::test]
async fn a_held_session_times_out_as_busy(store: SessionStore<PagedDocument>) {
    let id = store.adopt(PagedDocument::with_blank_pages(1), None);
    let _held = store.acquire(id.as_str()).await.expect("held");

    let err = match store.acquire(id.as_str()).await {
        Ok(_) => panic!("second acquisition should time out"),
        Err(err) => err,
    };

    assert_eq!(err.kind(), ErrorKind::SessionBusy);
    assert!(err.to_string().contains("is busy"));
}

#[rstest]
#[tokio::test]
async fn other_sessions_are_not_blocked(store: SessionStore<PagedDocument>) {
    let a = store.adopt(PagedDocument::with_blank_pages(1), None);
    let b = store.adopt(PagedDocument::with_blank_pages(1), None);
    let _held = store.acquire(a.as_str()).await.expect("held");

    assert!(store.acquire(b.as_str()).await.is_ok());
}

#[tokio::test]
async fn a_waiter_proceeds_once_the_holder_releases() {
    let store = Arc::new(SessionStore::<PagedDocument>::new(
        &RuntimeConfig::default().with_lock_timeout(None),
    ));
    let id = store.adopt(PagedDocument::with_blank_pages(1), None);
    let held = store.acquire(id.as_str()).await.expect("held");

    let waiter = {
        let store = Arc::clone(&store);
        let id = id.clone();
        tokio::spawn(async move {
            let guard = store.acquire(id.as_str()).await.expect("waiter");
            guard.document().page_texts()
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    let mut held = held;
    held.document_mut().pages_mut()[0].texts.push(text_run("first"));
    drop(held);

    assert_eq!(waiter.await.expect("join"), vec!["first".to_owned()]);
}

#[rstest]
#[tokio::test]
async fn close_removes_the_session(store: SessionStore<PagedDocument>) {
    let id = store.adopt(PagedDocument::with_blank_pages(1), None);

    let outcome = store.close(id.as_str(), false).await.expect("close");

    assert_eq!(outcome.session_id, id);
    assert!(!outcome.was_dirty);
    assert!(!store.contains(id.as_str()));
    assert_eq!(store.get(id.as_str()).err().expect("expected error").kind(), ErrorKind::SessionNotFound);
}

#[tokio::test]
async fn a_call_waiting_on_a_closing_session_sees_it_gone() {
    let store = Arc::new(SessionStore::<PagedDocument>::new(
        &RuntimeConfig::default().with_lock_timeout(None),
    ));
    let id = store.adopt(PagedDocument::with_blank_pages(1), None);
    let entry = store.get(id.as_str()).expect("entry");
    let held = store.acquire(id.as_str()).await.expect("held");

    let waiter = tokio::spawn(async move { entry.lock().await.map(|_| ()) });
    let closer = {
        let store = Arc::clone(&store);
        let id = id.clone();
        tokio::spawn(async move { store.close(id.as_str(), false).await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    drop(held);

    closer.await.expect("join closer").expect("close");
    let waited = waiter.await.expect("join waiter");
    // The waiter either ran before the close or observed the closed slot.
    if let Err(err) = waited {
        assert_eq!(err.kind(), ErrorKind::SessionNotFound);
    }
    assert!(!store.contains(id.as_str()));
}

#[rstest]
#[tokio::test]
async fn close_with_flush_writes_unsaved_changes_back(store: SessionStore<PagedDocument>) {
    let tmp = TempDir::new("session-flush");
    let path = tmp.seed("doc.json", &PagedDocument::with_blank_pages(2));
    let id = store.open(&path).expect("open");

    {
        let mut guard = store.acquire(id.as_str()).await.expect("acquire");
        guard.document_mut().remove_page(0);
        guard.mark_dirty();
    }
    let outcome = store.close(id.as_str(), true).await.expect("close");

    assert!(outcome.was_dirty);
    assert_eq!(outcome.flushed_to.as_deref(), Some(path.as_path()));
    let reloaded = crate::store::load_document::<PagedDocument>(&path).expect("reload");
    assert_eq!(reloaded.page_count(), 1);
}

#[rstest]
#[tokio::test]
async fn close_without_flush_leaves_the_file_alone(store: SessionStore<PagedDocument>) {
    let tmp = TempDir::new("session-discard");
    let path = tmp.seed("doc.json", &PagedDocument::with_blank_pages(2));
    let before = fs::read(&path).expect("read");
    let id = store.open(&path).expect("open");
    store.mark_dirty(id.as_str()).expect("dirty");

    store.close(id.as_str(), false).await.expect("close");

    assert_eq!(fs::read(&path).expect("read"), before);
}

#[rstest]
#[tokio::test]
async fn flushing_a_pathless_session_fails_and_keeps_it_open(store: SessionStore<PagedDocument>) {
    let id = store.adopt(PagedDocument::with_blank_pages(1), None);
    store.mark_dirty(id.as_str()).expect("dirty");

    let err = store.close(id.as_str(), true).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert!(store.contains(id.as_str()));
}

#[rstest]
#[tokio::test]
async fn save_clears_dirty_only_for_the_source_path(store: SessionStore<PagedDocument>) {
    let tmp = TempDir::new("session-save");
    let path = tmp.seed("doc.json", &PagedDocument::with_blank_pages(1));
    let id = store.open(&path).expect("open");
    store.mark_dirty(id.as_str()).expect("dirty");

    let copy = tmp.path().join("copy.json");
    assert_eq!(store.save(id.as_str(), Some(&copy)).await.expect("save copy"), copy);
    assert!(copy.is_file());
    assert!(store.get(id.as_str()).expect("entry").is_dirty());

    assert_eq!(store.save(id.as_str(), None).await.expect("save in place"), path);
    assert!(!store.get(id.as_str()).expect("entry").is_dirty());
}

#[rstest]
#[tokio::test]
async fn eviction_spares_dirty_and_busy_sessions(store: SessionStore<PagedDocument>) {
    let clean = store.adopt(PagedDocument::with_blank_pages(1), None);
    let dirty = store.adopt(PagedDocument::with_blank_pages(1), None);
    let busy = store.adopt(PagedDocument::with_blank_pages(1), None);
    store.mark_dirty(dirty.as_str()).expect("dirty");
    let _held = store.acquire(busy.as_str()).await.expect("held");

    tokio::time::sleep(Duration::from_millis(5)).await;
    let evicted = store.evict_idle(Duration::ZERO);

    assert_eq!(evicted, vec![clean.clone()]);
    assert!(!store.contains(clean.as_str()));
    assert!(store.contains(dirty.as_str()));
    assert!(store.contains(busy.as_str()));
}

#[rstest]
#[tokio::test]
async fn list_reports_state_per_session(store: SessionStore<PagedDocument>) {
    let a = store.adopt(PagedDocument::with_blank_pages(1), None);
    let b = store.adopt(PagedDocument::with_blank_pages(1), Some("b.json".into()));
    store.mark_dirty(b.as_str()).expect("dirty");
    let _held = store.acquire(a.as_str()).await.expect("held");

    let summaries = store.list();

    assert_eq!(summaries.len(), 2);
    let a_summary = summaries.iter().find(|s| s.session_id == a).expect("a listed");
    let b_summary = summaries.iter().find(|s| s.session_id == b).expect("b listed");
    assert!(a_summary.busy && !a_summary.dirty);
    assert!(b_summary.dirty && !b_summary.busy);
    assert_eq!(b_summary.source_path.as_deref(), Some(std::path::Path::new("b.json")));
    assert_eq!(a_summary.kind, DocumentKind::Paged);
}
