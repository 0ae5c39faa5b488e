//! Benchmark upload normalization and thumbnail generation on a 12MP photo.

use std::io::Cursor;

use criterion::{criterion_group, criterion_main, Criterion};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use picfolio::media::codec;

fn photo_bytes() -> Vec<u8> {
    let img = RgbImage::from_fn(4000, 3000, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}

fn bench_codec(c: &mut Criterion) {
    let bytes = photo_bytes();
    let decoded = codec::decode_normalized(&bytes).unwrap().image;

    let mut group = c.benchmark_group("codec");
    group.sample_size(10);

    group.bench_function("decode_normalized_12mp", |b| {
        b.iter(|| codec::decode_normalized(&bytes).unwrap());
    });

    group.bench_function("make_thumbnail_650", |b| {
        b.iter(|| codec::make_thumbnail(&decoded, 650));
    });

    group.bench_function("rotate_ccw_12mp", |b| {
        b.iter(|| codec::rotate_ccw(&decoded));
    });

    group.finish();
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
