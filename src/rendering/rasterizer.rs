/// Scanline rasterization of projected voxel faces.
///
/// Every face arrives as a convex quad in screen space. Rows sample at
/// pixel centers (y + 0.5) and edges are half-open in Y, so two quads
/// sharing an edge produce adjacent spans with no gap and no overlap.
use glam::Vec2;

use crate::model::Rgba;
use crate::rendering::framebuffer::PixelBuffer;

/// Writable raster surface. The composer renders into a full frame; the
/// threaded backend renders into disjoint row bands of the same frame,
/// each band exposing only its own rows through `y_range`.
pub trait RasterTarget {
    fn width(&self) -> usize;
    /// Half-open range of frame rows this target accepts.
    fn y_range(&self) -> (i32, i32);
    /// Write one pixel in frame coordinates. Out-of-range writes are
    /// ignored, not errors.
    fn set_frame_pixel(&mut self, x: i32, y: i32, color: Rgba);
}

impl RasterTarget for PixelBuffer {
    fn width(&self) -> usize {
        self.width
    }

    fn y_range(&self) -> (i32, i32) {
        (0, self.height as i32)
    }

    fn set_frame_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if self.in_bounds(x, y) {
            self.set_pixel(x as usize, y as usize, color);
        }
    }
}

/// Destination for projected faces. The software path fills pixels; other
/// sinks may collect the quads instead (e.g. vector export or testing).
pub trait QuadSink {
    fn fill_quad(&mut self, pts: &[Vec2; 4], color: Rgba);
}

impl QuadSink for PixelBuffer {
    fn fill_quad(&mut self, pts: &[Vec2; 4], color: Rgba) {
        fill_convex_quad(self, pts, color);
    }
}

/// Fill a convex quad with a flat color.
///
/// Fill rule, chosen so abutting faces tile exactly:
/// - a row is covered when its center `y + 0.5` lies inside `[y0, y1)`
///   of an edge (low-Y vertex first, half-open at the top);
/// - within a row the span runs `floor(xa + 0.5) ..= floor(xb - 0.5)`,
///   which hands the shared column of two adjacent quads to exactly one
///   of them.
pub fn fill_convex_quad<T: RasterTarget + ?Sized>(target: &mut T, pts: &[Vec2; 4], color: Rgba) {
    let min_y = pts.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    let max_y = pts.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
    if !min_y.is_finite() || !max_y.is_finite() {
        return;
    }

    let (band_lo, band_hi) = target.y_range();
    let row_lo = min_y.floor() as i32;
    let row_hi = (max_y.ceil() as i32) - 1;
    let width = target.width() as i32;

    // Coverage is computed for the whole quad even when the target only
    // accepts a row band, so banded targets agree with a full frame on
    // whether the centroid fallback fires.
    let mut any_covered = false;

    for row in row_lo..=row_hi {
        let sample_y = row as f32 + 0.5;

        // Convex polygon: at most two edge crossings per scanline.
        let mut xs = [0.0f32; 4];
        let mut n = 0;
        for i in 0..4 {
            let a = pts[i];
            let b = pts[(i + 1) % 4];
            let (lo, hi) = if a.y <= b.y { (a, b) } else { (b, a) };
            if sample_y >= lo.y && sample_y < hi.y {
                let t = (sample_y - lo.y) / (hi.y - lo.y);
                xs[n] = lo.x + t * (hi.x - lo.x);
                n += 1;
            }
        }
        if n < 2 {
            continue;
        }
        xs[..n].sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let (xa, xb) = (xs[0], xs[n - 1]);

        let mut x_start = (xa + 0.5).floor() as i32;
        let mut x_end = (xb - 0.5).floor() as i32;
        if x_end < x_start {
            // Thin span between pixel centers: keep one pixel.
            let mid = ((xa + xb) * 0.5).floor() as i32;
            x_start = mid;
            x_end = mid;
        }
        let x_start = x_start.max(0);
        let x_end = x_end.min(width - 1);
        if x_start <= x_end {
            any_covered = true;
        }
        if row < band_lo || row >= band_hi {
            continue;
        }
        for x in x_start..=x_end {
            target.set_frame_pixel(x, row, color);
        }
    }

    // Sub-pixel quad that straddles no pixel center: still land one
    // pixel at the centroid so tiny faces never vanish entirely.
    if !any_covered {
        let cx = ((pts.iter().map(|p| p.x).sum::<f32>()) * 0.25).floor() as i32;
        let cy = ((pts.iter().map(|p| p.y).sum::<f32>()) * 0.25).floor() as i32;
        if cy >= band_lo && cy < band_hi && cx >= 0 && cx < width {
            target.set_frame_pixel(cx, cy, color);
        }
    }
}

/// Bresenham outline for non-quad polygons (debug overlays and vector
/// previews). Faces themselves always go through `fill_convex_quad`.
pub fn draw_polygon_outline<T: RasterTarget + ?Sized>(target: &mut T, pts: &[Vec2], color: Rgba) {
    if pts.len() < 2 {
        return;
    }
    for i in 0..pts.len() {
        let a = pts[i];
        let b = pts[(i + 1) % pts.len()];
        draw_line(target, a, b, color);
    }
}

fn draw_line<T: RasterTarget + ?Sized>(target: &mut T, a: Vec2, b: Vec2, color: Rgba) {
    let mut x0 = a.x.round() as i32;
    let mut y0 = a.y.round() as i32;
    let x1 = b.x.round() as i32;
    let y1 = b.y.round() as i32;

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        target.set_frame_pixel(x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = Rgba::opaque(255, 0, 0);

    fn quad(x0: f32, y0: f32, x1: f32, y1: f32) -> [Vec2; 4] {
        [
            Vec2::new(x0, y0),
            Vec2::new(x1, y0),
            Vec2::new(x1, y1),
            Vec2::new(x0, y1),
        ]
    }

    #[test]
    fn integer_corner_rectangle_fills_exactly() {
        let mut buf = PixelBuffer::new(16, 16);
        buf.fill_quad(&quad(2.0, 3.0, 8.0, 7.0), RED);
        // A [2,8)x[3,7) rectangle covers columns 2..=7 and rows 3..=6.
        for y in 0..16usize {
            for x in 0..16usize {
                let inside = (2..8).contains(&x) && (3..7).contains(&y);
                assert_eq!(
                    buf.get_pixel(x, y) == RED,
                    inside,
                    "pixel ({x},{y}) inside={inside}"
                );
            }
        }
        assert_eq!(buf.count_not(Rgba::TRANSPARENT), 6 * 4);
    }

    #[test]
    fn abutting_quads_tile_without_gap_or_overlap() {
        let mut buf = PixelBuffer::new(20, 10);
        buf.fill_quad(&quad(2.0, 2.0, 9.0, 8.0), Rgba::opaque(10, 0, 0));
        buf.fill_quad(&quad(9.0, 2.0, 16.0, 8.0), Rgba::opaque(0, 10, 0));
        for y in 2..8usize {
            for x in 2..16usize {
                let p = buf.get_pixel(x, y);
                assert!(!p.is_transparent(), "gap at ({x},{y})");
            }
            // Shared column 9 belongs to exactly the right quad.
            assert_eq!(buf.get_pixel(8, y), Rgba::opaque(10, 0, 0));
            assert_eq!(buf.get_pixel(9, y), Rgba::opaque(0, 10, 0));
        }
    }

    #[test]
    fn subpixel_quad_still_lands_one_pixel() {
        let mut buf = PixelBuffer::new(8, 8);
        buf.fill_quad(&quad(3.2, 3.1, 3.6, 3.4), RED);
        assert_eq!(buf.count_not(Rgba::TRANSPARENT), 1);
        assert_eq!(buf.get_pixel(3, 3), RED);
    }

    #[test]
    fn rows_clip_to_target_band() {
        struct Band {
            hits: Vec<(i32, i32)>,
        }
        impl RasterTarget for Band {
            fn width(&self) -> usize {
                32
            }
            fn y_range(&self) -> (i32, i32) {
                (4, 8)
            }
            fn set_frame_pixel(&mut self, x: i32, y: i32, _color: Rgba) {
                self.hits.push((x, y));
            }
        }
        let mut band = Band { hits: Vec::new() };
        fill_convex_quad(&mut band, &quad(0.0, 0.0, 10.0, 20.0), RED);
        assert!(!band.hits.is_empty());
        for (_, y) in &band.hits {
            assert!((4..8).contains(y), "row {y} escaped the band");
        }
    }

    #[test]
    fn rotated_quad_spans_match_symmetry() {
        // A diamond centered on a pixel grid fills symmetrically.
        let mut buf = PixelBuffer::new(16, 16);
        let pts = [
            Vec2::new(8.0, 2.0),
            Vec2::new(14.0, 8.0),
            Vec2::new(8.0, 14.0),
            Vec2::new(2.0, 8.0),
        ];
        buf.fill_quad(&pts, RED);
        // The diamond is symmetric about x = 8, so every non-empty row's
        // span must be centered there.
        let mut rows = 0;
        for y in 0..16usize {
            let filled: Vec<usize> = (0..16).filter(|&x| buf.get_pixel(x, y) == RED).collect();
            if let (Some(first), Some(last)) = (filled.first(), filled.last()) {
                rows += 1;
                assert_eq!(
                    first + last,
                    16,
                    "row {y} span {first}..={last} is not centered on x=8"
                );
                assert_eq!(filled.len(), last - first + 1, "row {y} has a hole");
            }
        }
        assert!(rows > 0);
    }

    #[test]
    fn outline_connects_all_vertices() {
        let mut buf = PixelBuffer::new(12, 12);
        let pts = [
            Vec2::new(2.0, 2.0),
            Vec2::new(9.0, 2.0),
            Vec2::new(9.0, 9.0),
        ];
        draw_polygon_outline(&mut buf, &pts, RED);
        assert_eq!(buf.get_pixel(2, 2), RED);
        assert_eq!(buf.get_pixel(9, 2), RED);
        assert_eq!(buf.get_pixel(9, 9), RED);
        assert_eq!(buf.get_pixel(5, 2), RED, "top edge");
        assert_eq!(buf.get_pixel(9, 5), RED, "right edge");
    }
}
