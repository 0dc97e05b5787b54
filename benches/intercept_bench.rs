// Copyright (c) 2026 Bountyy Oy. All rights reserved.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use swizzle::{
    Deferred, Engine, EngineConfig, EventKind, Listener, OverrideSet, ProgressEvent,
    StubTransport, Transport,
};

fn override_validation_benchmark(c: &mut Criterion) {
    let payload = json!({
        "responseText": "{\"items\": [1, 2, 3]}",
        "responseType": "json",
        "status": 203,
        "statusText": "Rewritten",
        "readyState": 4,
        "headers": {"x-cache": "hit"},
    });

    c.bench_function("apply_validated", |b| {
        b.iter(|| black_box(OverrideSet::apply_validated(black_box(&payload))))
    });
}

fn sync_dispatch_benchmark(c: &mut Criterion) {
    let config = EngineConfig::new()
        .transform(|_: &dyn Transport| Deferred::ready(json!({ "responseText": "rewritten" })))
        .filter_pattern(r"some\.api")
        .expect("valid pattern");
    let engine = Engine::new(config, StubTransport::new_shared);

    let stub = StubTransport::new();
    let xhr = engine.wrap(Arc::new(stub.clone()));
    xhr.set_handler(
        EventKind::Load,
        Some(Listener::callback(|xhr: &dyn Transport, _: &ProgressEvent| {
            black_box(xhr.response_text());
            Ok(())
        })),
    );

    c.bench_function("sync_dispatch", |b| {
        b.iter(|| {
            xhr.open("GET", "https://some.api/items").ok();
            xhr.send(None).ok();
            stub.respond(200, "original");
        })
    });
}

criterion_group!(benches, override_validation_benchmark, sync_dispatch_benchmark);
criterion_main!(benches);
