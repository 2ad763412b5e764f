use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use recog_core::{Image, Point};
use recog_detect::{
    adaptive_non_maximum_suppression, euclidean_distance, harris, HarrisParams, Pyramid,
    PyramidConfig,
};

/// Blocky texture with plenty of corners
fn create_benchmark_image(size: usize) -> Image {
    Image::from_fn(size, size, |r, c| {
        let block = ((r / 8) * 31 + (c / 8) * 17) % 13;
        block as f32 / 12.0
    })
    .unwrap()
}

fn bench_pyramid(c: &mut Criterion) {
    let mut group = c.benchmark_group("pyramid");
    for &size in &[64usize, 128, 256] {
        let img = create_benchmark_image(size);
        let config = PyramidConfig::default();
        group.bench_with_input(BenchmarkId::new("build_and_dog", size), &img, |b, img| {
            b.iter(|| {
                let pyramid = Pyramid::build(black_box(img), &config).unwrap();
                black_box(pyramid.dog().unwrap())
            })
        });
    }
    group.finish();
}

fn bench_harris(c: &mut Criterion) {
    let mut group = c.benchmark_group("harris");
    for &size in &[64usize, 128, 256] {
        let img = create_benchmark_image(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &img, |b, img| {
            b.iter(|| black_box(harris(black_box(img), &HarrisParams::default()).unwrap()))
        });
    }
    group.finish();
}

fn bench_anms(c: &mut Criterion) {
    let points: Vec<Point> = (0..2000usize)
        .map(|i| Point::new((i * 37) % 256, (i * 91) % 256, ((i * 13) % 101) as f32))
        .collect();
    c.bench_function("anms_2000_to_300", |b| {
        b.iter(|| {
            black_box(adaptive_non_maximum_suppression(
                black_box(&points),
                300,
                181.0,
                euclidean_distance,
            ))
        })
    });
}

criterion_group!(benches, bench_pyramid, bench_harris, bench_anms);
criterion_main!(benches);
