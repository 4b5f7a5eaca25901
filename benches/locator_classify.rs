//! Benchmark locator classification and range parsing, both on every playback request.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mediavault::locator::classify_shape;
use mediavault::sandbox::normalize_lexically;
use mediavault::streaming::parse_range_header;
use std::path::Path;

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify_shape");

    let inputs = [
        ("youtube_short", "https://youtu.be/dQw4w9WgXcQ"),
        (
            "youtube_watch_with_list",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL123&index=4",
        ),
        (
            "youtube_playlist",
            "https://www.youtube.com/playlist?list=PLx0sYbCqOb8TBPRdmBHs5Iftvv9TPboYG",
        ),
        ("remote", "https://cdn.example.com/audio/track-01.mp3"),
        ("local", "3f2a9c1e_Holiday.mp4"),
    ];

    for (name, locator) in inputs {
        group.bench_function(name, |b| {
            b.iter(|| classify_shape(black_box(locator)));
        });
    }

    group.finish();
}

fn bench_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_range_header");
    let size = 4 * 1024 * 1024 * 1024u64;

    group.bench_function("bounded", |b| {
        b.iter(|| parse_range_header(black_box("bytes=1048576-2097151"), size));
    });
    group.bench_function("suffix", |b| {
        b.iter(|| parse_range_header(black_box("bytes=-65536"), size));
    });
    group.bench_function("malformed", |b| {
        b.iter(|| parse_range_header(black_box("bytes=0-10,20-30"), size));
    });

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize_lexically", |b| {
        let path = Path::new("/srv/media/uploads/a/./b/../../c/clip.mp4");
        b.iter(|| normalize_lexically(black_box(path)));
    });
}

criterion_group!(benches, bench_classify, bench_range, bench_normalize);
criterion_main!(benches);
