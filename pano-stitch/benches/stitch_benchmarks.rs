use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pano_stitch::compositor::composite;
use pano_stitch::features::extract_features;
use pano_stitch::{CompositorConfig, Frame, Homography, StitchConfig, StitcherBuilder};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// RGBA mosaic of random rectangles
fn create_scene(width: u32, height: u32) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(11);
    let mut px = vec![255u8; (width * height * 4) as usize];
    for _ in 0..(width * height / 150) {
        let (w, h) = (rng.gen_range(5..30u32), rng.gen_range(5..30u32));
        let x0 = rng.gen_range(0..width - w);
        let y0 = rng.gen_range(0..height - h);
        let color: [u8; 3] = [rng.gen_range(20..230), rng.gen_range(20..230), rng.gen_range(20..230)];
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                let i = ((y * width + x) * 4) as usize;
                px[i..i + 3].copy_from_slice(&color);
            }
        }
    }
    px
}

fn crop(scene: &[u8], scene_width: u32, x0: u32, w: u32, h: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        let start = ((y * scene_width + x0) * 4) as usize;
        out.extend_from_slice(&scene[start..start + (w * 4) as usize]);
    }
    out
}

fn bench_features(c: &mut Criterion) {
    let mut group = c.benchmark_group("feature_extraction");
    let cfg = StitchConfig::default();
    for &(w, h) in &[(320u32, 240u32), (640, 480), (1280, 720)] {
        let frame = Frame::new(0, &create_scene(w, h), w, h).unwrap();
        group.bench_with_input(BenchmarkId::new("extract", format!("{}x{}", w, h)), &frame, |b, frame| {
            b.iter(|| extract_features(black_box(frame), &cfg.features, cfg.analysis_max_dimension).unwrap())
        });
    }
    group.finish();
}

fn bench_composite(c: &mut Criterion) {
    let (w, h) = (640u32, 480u32);
    let scene = create_scene(w + 400, h);
    let frames: Vec<Frame> = (0..3)
        .map(|i| Frame::new(i, &crop(&scene, w + 400, i as u32 * 200, w, h), w, h).unwrap())
        .collect();
    let transforms: Vec<Homography> = (0..3).map(|i| Homography::from_translation(i as f64 * 200.0, 0.0)).collect();
    let cfg = CompositorConfig::default();

    c.bench_function("composite_3x640x480", |b| {
        b.iter(|| composite(black_box(&frames), &transforms, &cfg).unwrap())
    });
}

fn bench_stitch(c: &mut Criterion) {
    let (w, h) = (640u32, 480u32);
    let scene = create_scene(w + 800, h);
    let mut group = c.benchmark_group("stitch");
    group.sample_size(10);
    for &threads in &[1usize, 4] {
        let mut stitcher = StitcherBuilder::new().threads(threads).build().unwrap();
        for i in 0..5 {
            stitcher.add_frame(&crop(&scene, w + 800, i * 200, w, h), w, h).unwrap();
        }
        group.bench_with_input(BenchmarkId::new("5_frames_640x480", threads), &stitcher, |b, s| {
            b.iter(|| s.stitch().unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_features, bench_composite, bench_stitch);
criterion_main!(benches);
