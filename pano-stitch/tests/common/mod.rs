#![allow(dead_code)]

use rand::{rngs::StdRng, Rng, SeedableRng};

pub const FRAME_W: u32 = 200;
pub const FRAME_H: u32 = 150;

/// Deterministic RGBA mosaic of overlapping rectangles with light texture
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pixels: Vec<u8>,
}

impl Scene {
    pub fn new(width: u32, height: u32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pixels = vec![0u8; (width * height * 4) as usize];
        for px in pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[110, 110, 110, 255]);
        }

        let count = width * height / 150;
        for _ in 0..count {
            let bw = rng.gen_range(5..28u32).min(width);
            let bh = rng.gen_range(5..28u32).min(height);
            let x0 = rng.gen_range(0..=width - bw);
            let y0 = rng.gen_range(0..=height - bh);
            let color: [u8; 3] = [rng.gen_range(30..200), rng.gen_range(30..200), rng.gen_range(30..200)];
            for y in y0..y0 + bh {
                for x in x0..x0 + bw {
                    let i = ((y * width + x) * 4) as usize;
                    pixels[i..i + 3].copy_from_slice(&color);
                }
            }
        }

        for px in pixels.chunks_exact_mut(4) {
            let grain: u8 = rng.gen_range(0..8);
            for c in px.iter_mut().take(3) {
                *c = c.saturating_add(grain);
            }
        }

        Self { width, height, pixels }
    }

    /// `w x h` window at `(x0, y0)`, with `brightness` added to every colour channel
    pub fn crop(&self, x0: u32, y0: u32, w: u32, h: u32, brightness: i16) -> Vec<u8> {
        assert!(x0 + w <= self.width && y0 + h <= self.height);
        let mut out = Vec::with_capacity((w * h * 4) as usize);
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                let i = ((y * self.width + x) * 4) as usize;
                for c in 0..3 {
                    out.push((self.pixels[i + c] as i16 + brightness).clamp(0, 255) as u8);
                }
                out.push(255);
            }
        }
        out
    }

    /// Standard-size frame at horizontal offset `x0`
    pub fn frame(&self, x0: u32) -> Vec<u8> {
        self.crop(x0, 0, FRAME_W, FRAME_H, 0)
    }
}

/// Uniform random RGBA noise, unrelated to any scene
pub fn noise_frame(w: u32, h: u32, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..w * h)
        .flat_map(|_| [rng.gen::<u8>(), rng.gen::<u8>(), rng.gen::<u8>(), 255])
        .collect()
}

/// RGBA pixel of an interleaved buffer
pub fn pixel(buf: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
}
