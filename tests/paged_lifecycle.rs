// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! End-to-end behavior of the call pipeline for paged documents.

mod common;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use folio::config::RuntimeConfig;
use folio::error::ErrorKind;
use folio::model::PagedDocument;
use folio::ops;
use folio::runtime::{CommitOutcome, DocumentRuntime, ToolCall};
use folio::store::load_document;
use rstest::{fixture, rstest};
use serde_json::json;

use common::{path_str, TempDir};

#[fixture]
fn runtime() -> DocumentRuntime<PagedDocument> {
    DocumentRuntime::new(ops::paged::registry().expect("registry"), RuntimeConfig::default())
}

#[rstest]
#[case::never_issued("paged-00000000000000000000000000000000")]
#[case::other_kind("flow-1234")]
#[case::malformed("not/a/session")]
#[tokio::test]
async fn unknown_session_ids_always_report_session_not_found(
    runtime: DocumentRuntime<PagedDocument>,
    #[case] session_id: &str,
) {
    for operation in ["get_info", "add_text", "no_such_operation"] {
        let err = runtime
            .execute(ToolCall::new(operation).session(session_id).param("text", "X"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionNotFound, "{operation}: {err}");
    }
}

#[rstest]
#[tokio::test]
async fn session_id_wins_over_path_and_leaves_the_file_alone(
    runtime: DocumentRuntime<PagedDocument>,
) {
    let tmp = TempDir::new("precedence");
    let session_path = tmp.seed("session.json", &PagedDocument::with_blank_pages(1));
    let other_path = tmp.seed("other.json", &PagedDocument::with_blank_pages(3));
    let before = fs::read(&other_path).expect("read");
    let session_id = runtime.open_session(&session_path).expect("open");

    let envelope = runtime
        .execute(
            ToolCall::new("delete")
                .session(session_id.as_str())
                .path(path_str(&other_path))
                .param("pageIndex", 1),
        )
        .await
        .expect("delete");

    assert!(envelope.is_session);
    assert_eq!(fs::read(&other_path).expect("read"), before);
    let entry = runtime.sessions().get(session_id.as_str()).expect("entry");
    let guard = entry.lock().await.expect("lock");
    assert_eq!(guard.document().page_count(), 0);
}

#[rstest]
#[tokio::test]
async fn session_calls_never_touch_the_backing_file_until_export(
    runtime: DocumentRuntime<PagedDocument>,
) {
    let tmp = TempDir::new("no-write");
    let path = tmp.seed("doc.json", &PagedDocument::with_blank_pages(2));
    let before = fs::read(&path).expect("read");
    let session_id = runtime.open_session(&path).expect("open");

    for call in [
        ToolCall::new("add_text").param("text", "draft"),
        ToolCall::new("rotate").param("rotation", 90),
        ToolCall::new("add_bookmark").param("title", "Intro").param("pageIndex", 1),
        ToolCall::new("get_content"),
    ] {
        let envelope = runtime.execute(call.session(session_id.as_str())).await.expect("call");
        assert_ne!(envelope.commit.as_str(), "file");
        assert_eq!(fs::read(&path).expect("read"), before);
    }

    let envelope = runtime
        .execute(
            ToolCall::new("export").session(session_id.as_str()).output(path_str(&path)),
        )
        .await
        .expect("export");
    assert_eq!(envelope.exports, vec![path.clone()]);
    let stored = load_document::<PagedDocument>(&path).expect("load");
    assert_eq!(stored.bookmarks().len(), 1);
    assert_eq!(stored.pages()[0].rotation, 90);
}

#[rstest]
#[tokio::test]
async fn transient_mutations_land_in_output_path_and_reads_write_nothing(
    runtime: DocumentRuntime<PagedDocument>,
) {
    let tmp = TempDir::new("transient");
    let path = tmp.seed("doc.json", &PagedDocument::with_blank_pages(1));
    let before = fs::read(&path).expect("read");
    let out = tmp.path().join("nested/out.json");

    let envelope = runtime
        .execute(
            ToolCall::new("add_text")
                .path(path_str(&path))
                .output(path_str(&out))
                .param("text", "Stamped"),
        )
        .await
        .expect("add_text");
    assert_eq!(envelope.commit, CommitOutcome::CommittedToFile(out.clone()));
    assert!(!envelope.is_session);
    assert_eq!(
        load_document::<PagedDocument>(&out).expect("load").page_texts(),
        vec!["Stamped".to_owned()]
    );
    assert_eq!(fs::read(&path).expect("read"), before);

    let read_out = tmp.path().join("read-out.json");
    let envelope = runtime
        .execute(ToolCall::new("get_info").path(path_str(&path)).output(path_str(&read_out)))
        .await
        .expect("get_info");
    assert_eq!(envelope.commit, CommitOutcome::Unchanged);
    assert!(!read_out.exists());
    assert_eq!(fs::read(&path).expect("read"), before);
}

#[rstest]
#[tokio::test]
async fn operation_names_are_case_insensitive(runtime: DocumentRuntime<PagedDocument>) {
    let tmp = TempDir::new("case");
    let mut page_counts = Vec::new();
    for name in ["ADD", "Add", "add"] {
        let path = tmp.seed(&format!("{name}.json"), &PagedDocument::with_blank_pages(1));
        let envelope = runtime
            .execute(ToolCall::new(name).path(path_str(&path)))
            .await
            .expect("add");
        assert_eq!(envelope.to_json()["pageCount"], json!(2));
        page_counts.push(load_document::<PagedDocument>(&path).expect("load").page_count());
    }
    assert_eq!(page_counts, vec![2, 2, 2]);
}

#[rstest]
#[tokio::test]
async fn session_state_persists_across_calls(runtime: DocumentRuntime<PagedDocument>) {
    let tmp = TempDir::new("scenario");
    let path = tmp.seed("doc.json", &PagedDocument::with_blank_pages(1));
    let session_id = runtime.open_session(&path).expect("open");

    runtime
        .execute(ToolCall::new("add_text").session(session_id.as_str()).param("text", "X"))
        .await
        .expect("add_text");
    let envelope = runtime
        .execute(ToolCall::new("get_content").session(session_id.as_str()))
        .await
        .expect("get_content");

    let json = envelope.to_json();
    assert_eq!(json["pages"][0]["text"], json!("X"));
    assert_eq!(json["isSession"], json!(true));
    assert_eq!(json["sessionId"], json!(session_id.as_str()));
    assert!(envelope.to_text().contains(session_id.as_str()));
}

#[rstest]
#[tokio::test]
async fn transient_delete_overwrites_in_place(runtime: DocumentRuntime<PagedDocument>) {
    let tmp = TempDir::new("delete");
    let path = tmp.seed("doc.json", &PagedDocument::with_blank_pages(3));

    let envelope = runtime
        .execute(ToolCall::new("delete").path(path_str(&path)).param("pageIndex", 1))
        .await
        .expect("delete");

    assert_eq!(envelope.commit, CommitOutcome::CommittedToFile(path.clone()));
    assert_eq!(load_document::<PagedDocument>(&path).expect("load").page_count(), 2);
}

#[rstest]
#[tokio::test]
async fn invalid_rotation_names_the_allowed_set_and_keeps_the_file(
    runtime: DocumentRuntime<PagedDocument>,
) {
    let tmp = TempDir::new("rotate");
    let path = tmp.seed("doc.json", &PagedDocument::with_blank_pages(1));
    let before = fs::read(&path).expect("read");

    let err = runtime
        .execute(
            ToolCall::new("rotate")
                .path(path_str(&path))
                .param("pageIndex", 1)
                .param("rotation", 45),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert!(err.to_string().contains("{0, 90, 180, 270}"), "{err}");
    assert_eq!(fs::read(&path).expect("read"), before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_on_one_session_never_lose_updates() {
    const CALLS: usize = 64;
    let runtime = Arc::new(DocumentRuntime::new(
        ops::paged::registry().expect("registry"),
        RuntimeConfig::default().with_lock_timeout(None),
    ));
    let session_id = runtime.sessions().adopt(PagedDocument::with_blank_pages(1), None);

    let tasks = (0..CALLS)
        .map(|n| {
            let runtime = Arc::clone(&runtime);
            let call = ToolCall::new("add_text")
                .session(session_id.as_str())
                .param("text", format!("line {n}"));
            tokio::spawn(async move { runtime.execute(call).await })
        })
        .collect::<Vec<_>>();
    for task in tasks {
        task.await.expect("join").expect("add_text");
    }

    let entry = runtime.sessions().get(session_id.as_str()).expect("entry");
    let guard = entry.lock().await.expect("lock");
    assert_eq!(guard.document().pages()[0].texts.len(), CALLS);
    assert!(guard.is_dirty());
}

#[tokio::test]
async fn a_held_session_times_out_as_busy_and_recovers() {
    let runtime = DocumentRuntime::new(
        ops::paged::registry().expect("registry"),
        RuntimeConfig::default().with_lock_timeout(Some(Duration::from_millis(30))),
    );
    let session_id = runtime.sessions().adopt(PagedDocument::with_blank_pages(1), None);
    let held = runtime.sessions().acquire(session_id.as_str()).await.expect("acquire");

    let err = runtime
        .execute(ToolCall::new("get_info").session(session_id.as_str()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SessionBusy);

    drop(held);
    runtime
        .execute(ToolCall::new("get_info").session(session_id.as_str()))
        .await
        .expect("get_info after release");
}

#[rstest]
#[tokio::test]
async fn closing_with_save_writes_back_once(runtime: DocumentRuntime<PagedDocument>) {
    let tmp = TempDir::new("close");
    let path = tmp.seed("doc.json", &PagedDocument::with_blank_pages(1));
    let session_id = runtime.open_session(&path).expect("open");
    runtime
        .execute(ToolCall::new("add").session(session_id.as_str()).param("count", 2))
        .await
        .expect("add");

    let outcome = runtime.close_session(session_id.as_str(), true).await.expect("close");

    assert!(outcome.was_dirty);
    assert_eq!(outcome.flushed_to.as_deref(), Some(path.as_path()));
    assert_eq!(load_document::<PagedDocument>(&path).expect("load").page_count(), 3);
    let err = runtime
        .execute(ToolCall::new("get_info").session(session_id.as_str()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SessionNotFound);
}
