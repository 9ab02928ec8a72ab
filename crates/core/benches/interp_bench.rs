//! Benchmarks for content stream conversion.
//!
//! Benchmark groups:
//! - `content_parse`: Tokenizing and grouping operators
//! - `page_convert`: Full page conversion (paths, clips, text)
//! - `pages_parallel`: Multi-page conversion sharing one cache

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;

use folio_core::geometry::Rectangle;
use folio_core::model::{FallbackFont, MemoryResources};
use folio_core::parser::parse_content;
use folio_core::{ConvertOptions, Page, PageConverter};

// =============================================================================
// Data Generation
// =============================================================================

/// Generates a content stream with `n` drawing blocks.
///
/// Each block mixes the operators of a typical text-heavy page: state
/// save/restore, a rectangle clip, filled and stroked paths and a short
/// text object.
fn generate_page(n: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(n * 160);
    for i in 0..n {
        let x = (i % 40) * 15;
        let y = (i / 40 % 50) * 15;
        let block = format!(
            "q {x} {y} 14 14 re W n 0.{r} 0 0 rg {x} {y} 10 10 re f \
             1 w {x} {y} m {x2} {y2} l S \
             BT /F1 9 Tf {x} {y} Td (cell {i}) Tj ET Q\n",
            x = x,
            y = y,
            x2 = x + 10,
            y2 = y + 10,
            r = i % 10,
            i = i,
        );
        data.extend_from_slice(block.as_bytes());
    }
    data
}

fn resources() -> Arc<MemoryResources> {
    Arc::new(MemoryResources::new().with_font("F1", Arc::new(FallbackFont::default())))
}

fn page(n: usize) -> Page {
    Page::from_bytes(
        Rectangle::new(0.0, 0.0, 612.0, 792.0),
        &generate_page(n),
        resources(),
    )
}

// =============================================================================
// Benchmark Groups
// =============================================================================

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("content_parse");

    for blocks in [100usize, 1_000, 10_000] {
        let data = generate_page(blocks);
        group.bench_with_input(BenchmarkId::new("blocks", blocks), &data, |b, data| {
            b.iter(|| parse_content(black_box(data)).len())
        });
    }

    group.finish();
}

fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_convert");
    let converter = PageConverter::new(ConvertOptions::default()).unwrap();

    for blocks in [100usize, 1_000, 5_000] {
        let page = page(blocks);
        group.bench_with_input(BenchmarkId::new("blocks", blocks), &page, |b, page| {
            b.iter(|| converter.convert(black_box(page)).unwrap().root.count())
        });
    }

    group.finish();
}

/// Serialization is measured with conversion so the optimizer output is
/// included.
fn bench_convert_to_svg(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_convert");
    let converter = PageConverter::new(ConvertOptions::default()).unwrap();
    let page = page(1_000);

    group.bench_function("to_svg", |b| {
        b.iter(|| converter.convert(black_box(&page)).unwrap().to_svg().len())
    });

    group.finish();
}

fn bench_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("pages_parallel");
    let converter = PageConverter::new(ConvertOptions::default()).unwrap();

    for pages in [4usize, 16] {
        let batch: Vec<Page> = (0..pages).map(|_| page(500)).collect();
        group.bench_with_input(BenchmarkId::new("pages", pages), &batch, |b, batch| {
            b.iter(|| converter.convert_all(black_box(batch)).len())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_convert,
    bench_convert_to_svg,
    bench_parallel
);
criterion_main!(benches);
