/// Thread-pool backend: identical pipeline semantics to the software
/// path, with rasterization parallelized over disjoint row stripes.
///
/// Every stripe walks the full back-to-front draw list and writes only
/// its own rows, so stripes never race and the composed frame is
/// byte-identical to a single-threaded fill.
use rayon::prelude::*;

use crate::model::Rgba;
use crate::rendering::composer::Renderer;
use crate::rendering::framebuffer::PixelBuffer;
use crate::rendering::rasterizer::{fill_convex_quad, RasterTarget};

use super::{decode_voxels, AccelError, AccelFrame, AccelParams, RenderBackend};

pub struct ThreadedBackend {
    pool: rayon::ThreadPool,
    renderer: Renderer,
}

impl ThreadedBackend {
    /// Build the worker pool. Pool construction failing (resource
    /// limits, spawn failure) reads as "backend unavailable".
    pub fn probe() -> Result<Self, AccelError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("raster-{i}"))
            .build()
            .map_err(|err| AccelError::CallFailed(err.to_string()))?;
        Ok(Self {
            pool,
            renderer: Renderer::new(),
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }
}

/// One horizontal band of the frame, borrowing its slice of the pixel
/// buffer. Frame coordinates come in; the band rebases rows itself.
struct Stripe<'a> {
    width: usize,
    y0: i32,
    y1: i32,
    pixels: &'a mut [u8],
}

impl RasterTarget for Stripe<'_> {
    fn width(&self) -> usize {
        self.width
    }

    fn y_range(&self) -> (i32, i32) {
        (self.y0, self.y1)
    }

    fn set_frame_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if x < 0 || x as usize >= self.width || y < self.y0 || y >= self.y1 {
            return;
        }
        let off = ((y - self.y0) as usize * self.width + x as usize) * 4;
        self.pixels[off] = color.r;
        self.pixels[off + 1] = color.g;
        self.pixels[off + 2] = color.b;
        self.pixels[off + 3] = color.a;
    }
}

impl RenderBackend for ThreadedBackend {
    fn name(&self) -> &'static str {
        "threaded"
    }

    fn render(&mut self, voxels: &[f32], params: &AccelParams) -> Result<AccelFrame, AccelError> {
        let model = decode_voxels(voxels)?;
        let view = params.to_view();
        let plan = self.renderer.plan(&model, &view, true);

        let mut buf = PixelBuffer::filled(plan.width, plan.height, plan.background);
        if !plan.items.is_empty() {
            let width = plan.width;
            let workers = self.pool.current_num_threads().max(1);
            let band_rows = plan.height.div_ceil(workers).max(1);
            let items = &plan.items;
            self.pool.install(|| {
                buf.pixels
                    .par_chunks_mut(band_rows * width * 4)
                    .enumerate()
                    .for_each(|(band, chunk)| {
                        let y0 = (band * band_rows) as i32;
                        let y1 = y0 + (chunk.len() / (width * 4)) as i32;
                        let mut stripe = Stripe {
                            width,
                            y0,
                            y1,
                            pixels: chunk,
                        };
                        for item in items {
                            fill_convex_quad(&mut stripe, &item.quad, item.color);
                        }
                    });
            });
        }

        if let Some(outline) = &plan.outline {
            buf.apply_outline(outline, plan.background.a);
        }
        let out = buf.downsample(plan.supersample, plan.downsample);
        Ok(AccelFrame {
            width: out.width as u32,
            height: out.height as u32,
            pixel_bytes: out.pixels,
        })
    }
}
