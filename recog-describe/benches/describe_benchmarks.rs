use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use recog_core::{Image, Point};
use recog_describe::{histogrid, match_descriptors, rhistogrid, HogParams, OrientationParams};

fn create_benchmark_image(size: usize) -> Image {
    Image::from_fn(size, size, |r, c| ((r * 131 + c * 71 + (r * c) % 17) % 29) as f32 / 28.0).unwrap()
}

fn grid_points(size: usize, step: usize) -> Vec<Point> {
    (step..size - step)
        .step_by(step)
        .flat_map(|r| (step..size - step).step_by(step).map(move |c| Point::new(r, c, 1.0)))
        .collect()
}

fn bench_hog(c: &mut Criterion) {
    let img = create_benchmark_image(256);
    let points = grid_points(256, 16);
    let params = HogParams::default();
    let mut group = c.benchmark_group("descriptors");
    group.bench_function("histogrid", |b| {
        b.iter(|| black_box(histogrid(black_box(&points), &img, &params).unwrap()))
    });
    group.bench_function("rhistogrid", |b| {
        b.iter(|| {
            black_box(rhistogrid(black_box(&points), &img, &params, &OrientationParams::default()).unwrap())
        })
    });
    group.finish();
}

fn bench_matching(c: &mut Criterion) {
    let img = create_benchmark_image(256);
    let params = HogParams::default();
    let mut group = c.benchmark_group("matching");
    for &step in &[32usize, 16, 8] {
        let descriptors = histogrid(&grid_points(256, step), &img, &params).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(descriptors.len()),
            &descriptors,
            |b, d| b.iter(|| black_box(match_descriptors(d, d, 0.75).unwrap())),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_hog, bench_matching);
criterion_main!(benches);
