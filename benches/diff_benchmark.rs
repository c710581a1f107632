//! Benchmarks for the diff engine.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use poldiff::model::{Policy, PolicyBuilder};
use poldiff::{DiffEngine, DiffKind};
use std::hint::black_box;

const PERMS: [&str; 6] = ["read", "write", "open", "getattr", "append", "ioctl"];

/// A synthetic policy with `types` types spread over ten attributes and one
/// allow rule per type pair neighbour.
///
/// `shift` moves every tenth type into another attribute and drops one
/// permission from every seventh rule, so two policies built with
/// different shifts differ in memberships and rules.
fn synthetic(types: usize, shift: usize) -> Policy {
    let mut builder: PolicyBuilder = Policy::builder().class("file", &PERMS);
    for attr in 0..10 {
        builder = builder.attribute(&format!("attr{attr}"));
    }
    for idx in 0..types {
        let attr = if idx % 10 == 0 { (idx + shift) % 10 } else { idx % 10 };
        let attr = format!("attr{attr}");
        builder = builder.typ(&format!("type{idx}_t"), &[attr.as_str()]);
    }
    for idx in 0..types {
        let perms = if shift > 0 && idx % 7 == 0 { &PERMS[1..] } else { &PERMS[..] };
        builder = builder.allow(
            &format!("type{idx}_t"),
            &format!("type{}_t", (idx + 1) % types),
            "file",
            perms,
        );
    }
    for attr in 0..10 {
        builder = builder.allow(&format!("attr{attr}"), &format!("attr{}", (attr + 1) % 10), "file", &PERMS[..2]);
    }
    builder.build().expect("synthetic policy is consistent")
}

fn benchmark_full_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_diff");
    for size in [100, 1_000, 5_000] {
        let original = synthetic(size, 0);
        let modified = synthetic(size, 3);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let result = DiffEngine::new().diff(black_box(&original), black_box(&modified));
                black_box(result.expect("diff should succeed"));
            });
        });
    }
    group.finish();
}

fn benchmark_rules_sequential(c: &mut Criterion) {
    let original = synthetic(2_000, 0);
    let modified = synthetic(2_000, 3);
    let engine = DiffEngine::new()
        .with_selection([DiffKind::AccessRules])
        .with_parallel(false);

    c.bench_function("access_rules_sequential_2000", |b| {
        b.iter(|| black_box(engine.diff(black_box(&original), black_box(&modified))));
    });
}

criterion_group!(benches, benchmark_full_diff, benchmark_rules_sequential);
criterion_main!(benches);
