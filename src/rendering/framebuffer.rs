/// Off-screen RGBA pixel buffer plus the whole-image post passes
/// (outline, downsample).
///
/// Layout mirrors the framebuffer the rasterizer expects: width/height
/// first for bounds checks, pixels as one contiguous RGBA byte vector.
use crate::model::Rgba;
use crate::view::{DownsampleMode, OutlinePlacement, OutlineSettings};

#[derive(Clone, Debug)]
pub struct PixelBuffer {
    pub width: usize,
    pub height: usize,
    /// RGBA, row-major, length = width * height * 4.
    pub pixels: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 4],
        }
    }

    pub fn filled(width: usize, height: usize, color: Rgba) -> Self {
        let mut buf = Self::new(width, height);
        buf.clear(color);
        buf
    }

    pub fn clear(&mut self, color: Rgba) {
        for px in self.pixels.chunks_exact_mut(4) {
            px[0] = color.r;
            px[1] = color.g;
            px[2] = color.b;
            px[3] = color.a;
        }
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgba) {
        if x < self.width && y < self.height {
            let off = (y * self.width + x) * 4;
            self.pixels[off] = color.r;
            self.pixels[off + 1] = color.g;
            self.pixels[off + 2] = color.b;
            self.pixels[off + 3] = color.a;
        }
    }

    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize) -> Rgba {
        let off = (y * self.width + x) * 4;
        Rgba::new(
            self.pixels[off],
            self.pixels[off + 1],
            self.pixels[off + 2],
            self.pixels[off + 3],
        )
    }

    /// Silhouette outline pass over the finished image.
    ///
    /// Outside mode paints transparent pixels that touch an opaque pixel
    /// through the selected kernel; inside mode paints opaque pixels that
    /// touch transparency. Decisions are taken against a snapshot of the
    /// alpha channel so freshly painted outline pixels never cascade.
    pub fn apply_outline(&mut self, settings: &OutlineSettings, background_alpha: u8) {
        let covered: Vec<bool> = (0..self.width * self.height)
            .map(|i| self.pixels[i * 4 + 3] != background_alpha)
            .collect();
        let offsets = settings.kernel.offsets();

        for y in 0..self.height {
            for x in 0..self.width {
                let here_covered = covered[y * self.width + x];
                let candidate = match settings.placement {
                    OutlinePlacement::Outside => !here_covered,
                    OutlinePlacement::Inside => here_covered,
                };
                if !candidate {
                    continue;
                }
                let touches_other = offsets.iter().any(|(dx, dy)| {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    self.in_bounds(nx, ny)
                        && covered[ny as usize * self.width + nx as usize] != here_covered
                });
                if touches_other {
                    self.set_pixel(x, y, settings.color);
                }
            }
        }
    }

    /// Reduce a supersampled buffer by an integer factor. Factor 1 is the
    /// identity. Nearest picks the top-left sample of each block; box
    /// averaging averages all four channels (alpha included).
    pub fn downsample(&self, factor: usize, mode: DownsampleMode) -> PixelBuffer {
        if factor <= 1 {
            return self.clone();
        }
        let out_w = (self.width / factor).max(1);
        let out_h = (self.height / factor).max(1);
        let mut out = PixelBuffer::new(out_w, out_h);

        for oy in 0..out_h {
            for ox in 0..out_w {
                let color = match mode {
                    DownsampleMode::Nearest => self.get_pixel(ox * factor, oy * factor),
                    DownsampleMode::BoxAverage => {
                        let mut sum = [0u32; 4];
                        let mut count = 0u32;
                        for sy in 0..factor {
                            for sx in 0..factor {
                                let x = ox * factor + sx;
                                let y = oy * factor + sy;
                                if x < self.width && y < self.height {
                                    let p = self.get_pixel(x, y);
                                    sum[0] += p.r as u32;
                                    sum[1] += p.g as u32;
                                    sum[2] += p.b as u32;
                                    sum[3] += p.a as u32;
                                    count += 1;
                                }
                            }
                        }
                        let avg = |v: u32| ((v + count / 2) / count.max(1)) as u8;
                        Rgba::new(avg(sum[0]), avg(sum[1]), avg(sum[2]), avg(sum[3]))
                    }
                };
                out.set_pixel(ox, oy, color);
            }
        }
        out
    }

    /// Count pixels whose color differs from `background`.
    pub fn count_not(&self, background: Rgba) -> usize {
        self.pixels
            .chunks_exact(4)
            .filter(|px| {
                px[0] != background.r
                    || px[1] != background.g
                    || px[2] != background.b
                    || px[3] != background.a
            })
            .count()
    }
}
