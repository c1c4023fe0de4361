use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pano_core::{FeatureConfig, Image};
use pano_fast::{CornerDetector, FastDetector, ImagePyramid};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Blocky random scene with many rectangle corners
fn create_benchmark_image(width: usize, height: usize) -> Image {
    let mut rng = StdRng::seed_from_u64(7);
    let mut img = vec![128u8; width * height];
    for _ in 0..(width * height / 200) {
        let w = rng.gen_range(4..24);
        let h = rng.gen_range(4..24);
        let x0 = rng.gen_range(0..width.saturating_sub(w).max(1));
        let y0 = rng.gen_range(0..height.saturating_sub(h).max(1));
        let v = rng.gen_range(20..235u8);
        for y in y0..(y0 + h).min(height) {
            for x in x0..(x0 + w).min(width) {
                img[y * width + x] = v;
            }
        }
    }
    img
}

fn create_test_config() -> FeatureConfig {
    FeatureConfig {
        n_threads: 1,
        ..FeatureConfig::default()
    }
}

fn bench_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("fast_detection");
    for &(w, h) in &[(320usize, 240usize), (640, 480), (1280, 720)] {
        let img = create_benchmark_image(w, h);
        let detector = FastDetector::new(create_test_config(), w, h).unwrap();
        group.bench_with_input(BenchmarkId::new("detect_keypoints", format!("{}x{}", w, h)), &img, |b, img| {
            b.iter(|| detector.detect_keypoints(black_box(img)).unwrap())
        });
    }
    group.finish();
}

fn bench_scoring(c: &mut Criterion) {
    let (w, h) = (640, 480);
    let img = create_benchmark_image(w, h);
    let mut group = c.benchmark_group("corner_scoring");
    group.bench_function("harris", |b| {
        b.iter(|| CornerDetector::detect_corners(black_box(&img), w, h, 20, 18, true))
    });
    group.bench_function("arc_contrast", |b| {
        b.iter(|| CornerDetector::detect_corners(black_box(&img), w, h, 20, 18, false))
    });
    group.finish();
}

fn bench_downsample(c: &mut Criterion) {
    let (w, h) = (1920, 1080);
    let img = create_benchmark_image(w, h);
    let level = ImagePyramid::analysis_level(w, h, 1024);
    c.bench_function("downsample_1080p", |b| {
        b.iter(|| ImagePyramid::downsample(black_box(&img), w, h, &level).unwrap())
    });
}

criterion_group!(benches, bench_detection, bench_scoring, bench_downsample);
criterion_main!(benches);
