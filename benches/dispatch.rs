// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Folio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use folio::config::RuntimeConfig;
use folio::model::PagedDocument;
use folio::ops;
use folio::runtime::{DocumentRuntime, ToolCall};
use folio::store::{write_document, WriteDurability};

fn runtime() -> DocumentRuntime<PagedDocument> {
    DocumentRuntime::new(ops::paged::registry().expect("registry"), RuntimeConfig::default())
}

// Benchmark identity (keep stable): group `dispatch`, cases `session_read`, `session_write`,
// `transient_read`, `transient_write`.
fn benches_dispatch(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().expect("runtime");
    let runtime = runtime();
    let session_id = runtime.sessions().adopt(PagedDocument::with_blank_pages(20), None);

    let dir = std::env::temp_dir().join(format!("folio-bench-dispatch-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create bench dir");
    let path = dir.join("doc.json");
    let seed = PagedDocument::with_blank_pages(20);
    write_document(&path, &seed, WriteDurability::BestEffort).expect("seed");

    let mut group = c.benchmark_group("dispatch");

    group.bench_function("session_read", |b| {
        b.iter(|| {
            let call = ToolCall::new("get_info").session(session_id.as_str());
            black_box(rt.block_on(runtime.execute(call)).expect("get_info"))
        })
    });

    group.bench_function("session_write", |b| {
        b.iter(|| {
            let call = ToolCall::new("rotate").session(session_id.as_str()).param("rotation", 90);
            black_box(rt.block_on(runtime.execute(call)).expect("rotate"))
        })
    });

    group.bench_function("transient_read", |b| {
        b.iter(|| {
            let call = ToolCall::new("get_info").path(path.display().to_string());
            black_box(rt.block_on(runtime.execute(call)).expect("get_info"))
        })
    });

    group.bench_function("transient_write", |b| {
        b.iter_batched(
            || {
                write_document(&path, &seed, WriteDurability::BestEffort).expect("reseed");
                ToolCall::new("add_text").path(path.display().to_string()).param("text", "bench")
            },
            |call| black_box(rt.block_on(runtime.execute(call)).expect("add_text")),
            BatchSize::SmallInput,
        )
    });

    group.finish();
    let _ = std::fs::remove_dir_all(&dir);
}

criterion_group!(benches, benches_dispatch);
criterion_main!(benches);
