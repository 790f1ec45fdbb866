extern crate publicizer;

#[path = "../src/test/image.rs"]
mod image;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use image::{member_flags, type_flags, ImageBuilder, MetadataBuilder};
use publicizer::{publicize, walker::flatten_all, Module};
use std::hint::black_box;

/// A module with many top-level types, each carrying a nested chain and a handful of members.
fn wide_metadata() -> MetadataBuilder {
    let mut meta = MetadataBuilder::new();
    for i in 0..500 {
        let outer = meta.add_type("Bench", &format!("Type{i}"), type_flags::NOT_PUBLIC);
        let inner = meta.add_nested_type(outer, "Inner", type_flags::NESTED_PRIVATE);
        for m in 0..4 {
            meta.add_method(outer, &format!("M{m}"), member_flags::PRIVATE);
            meta.add_field(inner, &format!("f{m}"), member_flags::ASSEMBLY);
        }
    }
    meta
}

fn bench_publicize(c: &mut Criterion) {
    let data = ImageBuilder::new().metadata(wide_metadata()).build();

    let mut group = c.benchmark_group("publicize");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("load", |b| {
        b.iter(|| black_box(Module::from_mem(black_box(data.clone())).unwrap()));
    });

    group.bench_function("load_publicize_serialize", |b| {
        b.iter(|| {
            let mut module = Module::from_mem(black_box(data.clone())).unwrap();
            let types = flatten_all(&module);
            let stats = publicize(&mut module, &types);
            black_box((stats, module.to_bytes().unwrap()))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_publicize);
criterion_main!(benches);
