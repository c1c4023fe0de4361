//! JavaScript bindings.

use crate::Stitcher;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = error)]
    fn log_error(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

/// Browser-facing wrapper around [`Stitcher`] with default settings
#[wasm_bindgen]
pub struct PanoramaStitcher {
    inner: Stitcher,
}

impl Default for PanoramaStitcher {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl PanoramaStitcher {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console_error_panic_hook::set_once();
        Self { inner: Stitcher::default() }
    }

    /// Add an RGBA frame (e.g. `ImageData.data`); throws on a size mismatch
    pub fn add_frame(&mut self, image_data: &[u8], width: u32, height: u32) -> Result<(), JsValue> {
        self.inner
            .add_frame(image_data, width, height)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        console_log!("added {}x{} frame, {} total", width, height, self.inner.frame_count());
        Ok(())
    }

    /// PNG bytes of the panorama, or an empty array when nothing could be stitched
    pub fn stitch(&self) -> Vec<u8> {
        console_log!("stitching {} frames", self.inner.frame_count());
        match self.inner.stitch() {
            Ok(png) => png,
            Err(e) => {
                log_error(&format!("stitch failed: {}", e));
                Vec::new()
            }
        }
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn frame_count(&self) -> u32 {
        self.inner.frame_count()
    }
}
