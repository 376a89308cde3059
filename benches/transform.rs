//! Benchmarks for parsing, patching and writing `ItemInWorldManager`.
//!
//! The class is assembled in memory with the integration test helpers, so the numbers cover
//! the library alone and no file I/O.

extern crate veinpatch;

#[path = "../tests/common/mod.rs"]
mod common;

use common::{Shape, SRG};
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;
use veinpatch::{patch_class, ClassFile, VeinMinerTransformer};

fn bench_parse(c: &mut Criterion) {
    let data = Shape::default().build();

    let mut group = c.benchmark_group("classfile");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("from_mem", |b| {
        b.iter(|| {
            let class = ClassFile::from_mem(black_box(&data)).unwrap();
            black_box(class)
        });
    });

    let class = ClassFile::from_mem(&data).unwrap();
    group.bench_function("to_bytes", |b| {
        b.iter(|| black_box(black_box(&class).to_bytes().unwrap()));
    });
    group.finish();
}

fn bench_patch(c: &mut Criterion) {
    let canonical = Shape::default().build();
    let obfuscated = Shape::named(SRG).build();
    let guarded = Shape {
        guarded: true,
        ..Shape::default()
    }
    .build();

    let mut group = c.benchmark_group("patch");
    group.bench_function("canonical", |b| {
        b.iter(|| black_box(patch_class(black_box(&canonical), false).unwrap()));
    });
    group.bench_function("srg", |b| {
        b.iter(|| black_box(patch_class(black_box(&obfuscated), true).unwrap()));
    });
    group.bench_function("guarded", |b| {
        b.iter(|| black_box(patch_class(black_box(&guarded), false).unwrap()));
    });

    // Model only, without parsing or writing
    let transformer = VeinMinerTransformer::new();
    let class = ClassFile::from_mem(&canonical).unwrap();
    group.bench_function("model", |b| {
        b.iter(|| {
            let mut class = class.clone();
            black_box(transformer.patch(&mut class, false).unwrap())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_parse, bench_patch);
criterion_main!(benches);
