/// Frame composition: one render call turns (model, view params) into a
/// finished RGBA frame, or into a stream of filled quads on a caller
/// surface. Both modes share the same planning path, so geometry,
/// shading and draw order are identical; only the fill sink differs.
use glam::Vec2;

use crate::model::{Rgba, VoxelModel};
use crate::rendering::depth::{sort_back_to_front, DepthSortable};
use crate::rendering::framebuffer::PixelBuffer;
use crate::rendering::geometry::Calibration;
use crate::rendering::rasterizer::QuadSink;
use crate::rendering::visibility::VisibilityCache;
use crate::shaders::{FaceBatch, FaceSample, FrameInfo, ShaderRegistry, StackExecutor};
use crate::view::{DownsampleMode, OutlineSettings, ViewParams};

/// A finished frame: packed RGBA bytes, row-major.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// One shaded face ready for rasterization.
#[derive(Copy, Clone, Debug)]
pub struct FaceRenderItem {
    pub quad: [Vec2; 4],
    pub color: Rgba,
    depth: f32,
}

impl DepthSortable for FaceRenderItem {
    fn depth(&self) -> f32 {
        self.depth
    }
}

/// Everything needed to produce the frame once planning is done. The
/// threaded backend consumes the same plan and only parallelizes the
/// fill, which keeps its output byte-identical to the software path.
pub(crate) struct RenderPlan {
    /// Render-resolution dimensions (supersampling already applied).
    pub width: usize,
    pub height: usize,
    pub supersample: usize,
    pub background: Rgba,
    pub outline: Option<OutlineSettings>,
    pub downsample: DownsampleMode,
    /// Back-to-front, ready to draw in order.
    pub items: Vec<FaceRenderItem>,
}

/// The renderer owns the per-call caches and the shader machinery.
/// A render call never mutates the model.
pub struct Renderer {
    visibility: VisibilityCache,
    registry: ShaderRegistry,
    executor: StackExecutor,
}

impl Renderer {
    pub fn new() -> Self {
        Self::with_registry(ShaderRegistry::with_builtins())
    }

    pub fn with_registry(registry: ShaderRegistry) -> Self {
        Self {
            visibility: VisibilityCache::new(),
            registry,
            executor: StackExecutor::new(),
        }
    }

    /// Render into an owned frame.
    pub fn render(&mut self, model: &VoxelModel, params: &ViewParams) -> Frame {
        let plan = self.plan(model, params, true);
        let mut buf = PixelBuffer::filled(plan.width, plan.height, plan.background);
        for item in &plan.items {
            buf.fill_quad(&item.quad, item.color);
        }
        if let Some(outline) = &plan.outline {
            buf.apply_outline(outline, plan.background.a);
        }
        let out = buf.downsample(plan.supersample, plan.downsample);
        Frame {
            width: out.width as u32,
            height: out.height as u32,
            pixels: out.pixels,
        }
    }

    /// Emit the frame's filled quads to a caller-owned surface, in the
    /// same order the buffer path draws them. The sink sees geometry at
    /// the requested output scale; whole-image post passes (outline,
    /// supersampling) do not apply to a live surface.
    pub fn render_to_sink(&mut self, model: &VoxelModel, params: &ViewParams, sink: &mut dyn QuadSink) {
        let plan = self.plan(model, params, false);
        for item in &plan.items {
            sink.fill_quad(&item.quad, item.color);
        }
    }

    /// Shared planning path: calibrate, cull, shade, sort.
    pub(crate) fn plan(&mut self, model: &VoxelModel, params: &ViewParams, allow_supersample: bool) -> RenderPlan {
        let params = params.sanitized();
        let ss = if allow_supersample {
            params.supersample_factor() as usize
        } else {
            1
        };
        let width = params.width as usize * ss;
        let height = params.height as usize * ss;
        let scale = params.scale * ss as f32;

        let mut plan = RenderPlan {
            width,
            height,
            supersample: ss,
            background: params.background,
            outline: params.outline,
            downsample: params.downsample,
            items: Vec::new(),
        };

        // Empty model: a valid background-only frame, not an error.
        let Some(bounds) = model.bounds() else {
            return plan;
        };

        let cal = Calibration::compute(
            &bounds,
            &params.rotation,
            &params.projection,
            scale,
            width as u32,
            height as u32,
        );
        let m = params.rotation.matrix();
        let vis = self.visibility.resolve(&params.rotation, cal.voxel_size);

        // Collect the frame's visible faces in model order and shade them
        // as one batch.
        let mut batch = FaceBatch {
            faces: Vec::with_capacity(model.len()),
            frame: FrameInfo {
                camera_pos: cal.camera_pos,
                view_dir: cal.view_dir(),
                middle: cal.middle,
                model_size: bounds.size(),
                output_width: params.width,
                output_height: params.height,
                voxel_size: cal.voxel_size,
            },
        };
        for voxel in model.voxels() {
            if voxel.color.is_transparent() {
                continue;
            }
            let exposed = model.exposed_faces(voxel.pos);
            for face in crate::model::Face::ALL {
                if vis.is_visible(face) && exposed[face.index()] {
                    batch.faces.push(FaceSample {
                        voxel_pos: voxel.pos.as_vec3(),
                        face,
                        normal: vis.normal(face),
                        color: voxel.color,
                    });
                }
            }
        }
        self.executor
            .run(&self.registry, &params.shader_stack, &mut batch);

        plan.items.reserve(batch.faces.len());
        for sample in &batch.faces {
            let rotated_center = cal.rotate(&m, sample.voxel_pos);
            let corners = sample.face.corners();
            let quad = [
                cal.project_corner(&m, rotated_center, corners[0]),
                cal.project_corner(&m, rotated_center, corners[1]),
                cal.project_corner(&m, rotated_center, corners[2]),
                cal.project_corner(&m, rotated_center, corners[3]),
            ];
            // Painter's key: squared camera distance to the face center.
            let face_center = rotated_center + sample.normal * 0.5;
            plan.items.push(FaceRenderItem {
                quad,
                color: sample.color,
                depth: cal.camera_pos.distance_squared(face_center),
            });
        }
        sort_back_to_front(&mut plan.items);
        plan
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Voxel;
    use crate::view::Rotation;

    fn red_voxel_params() -> ViewParams {
        ViewParams {
            scale: 10.0,
            width: 64,
            height: 64,
            ..ViewParams::default()
        }
    }

    #[test]
    fn empty_model_renders_background_only() {
        let mut renderer = Renderer::new();
        let params = ViewParams {
            background: Rgba::opaque(3, 5, 7),
            width: 8,
            height: 6,
            ..ViewParams::default()
        };
        let frame = renderer.render(&VoxelModel::new(), &params);
        assert_eq!(frame.width, 8);
        assert_eq!(frame.height, 6);
        for px in frame.pixels.chunks_exact(4) {
            assert_eq!(px, [3, 5, 7, 255]);
        }
    }

    #[test]
    fn single_voxel_head_on_is_a_centered_square() {
        let mut renderer = Renderer::new();
        let model = VoxelModel::from_voxels(vec![Voxel::new(0, 0, 0, Rgba::opaque(255, 0, 0))]);
        let frame = renderer.render(&model, &red_voxel_params());

        let red = Rgba::opaque(255, 0, 0);
        let mut filled = 0;
        for y in 0..64usize {
            for x in 0..64usize {
                let off = (y * 64 + x) * 4;
                let px = Rgba::new(
                    frame.pixels[off],
                    frame.pixels[off + 1],
                    frame.pixels[off + 2],
                    frame.pixels[off + 3],
                );
                let inside = (27..37).contains(&x) && (27..37).contains(&y);
                assert_eq!(px == red, inside, "pixel ({x},{y})");
                if px == red {
                    filled += 1;
                }
            }
        }
        assert_eq!(filled, 100, "exactly a 10x10 square");
    }

    #[test]
    fn sink_receives_quads_in_draw_order() {
        struct Collecting {
            quads: Vec<([Vec2; 4], Rgba)>,
        }
        impl QuadSink for Collecting {
            fn fill_quad(&mut self, pts: &[Vec2; 4], color: Rgba) {
                self.quads.push((*pts, color));
            }
        }

        let mut renderer = Renderer::new();
        let model = VoxelModel::from_voxels(vec![
            Voxel::new(0, 0, 0, Rgba::opaque(255, 0, 0)),
            Voxel::new(2, 0, 0, Rgba::opaque(0, 255, 0)),
        ]);
        let mut sink = Collecting { quads: Vec::new() };
        renderer.render_to_sink(&model, &red_voxel_params(), &mut sink);
        // Head-on: one front face per voxel, both at equal depth, so the
        // stable sort keeps model order.
        assert_eq!(sink.quads.len(), 2);
        assert_eq!(sink.quads[0].1, Rgba::opaque(255, 0, 0));
        assert_eq!(sink.quads[1].1, Rgba::opaque(0, 255, 0));
    }

    #[test]
    fn stacked_voxels_share_no_interior_face() {
        let mut renderer = Renderer::new();
        let model = VoxelModel::from_voxels(vec![
            Voxel::new(0, 0, 0, Rgba::opaque(255, 0, 0)),
            Voxel::new(0, 0, 1, Rgba::opaque(0, 255, 0)),
        ]);
        let plan = renderer.plan(&model, &red_voxel_params(), true);
        // Head-on only front faces are candidates; the rear voxel's front
        // face is interior, leaving a single drawn quad.
        assert_eq!(plan.items.len(), 1);
        assert_eq!(plan.items[0].color, Rgba::opaque(0, 255, 0));
    }

    #[test]
    fn transparent_voxels_are_skipped() {
        let mut renderer = Renderer::new();
        let model = VoxelModel::from_voxels(vec![Voxel::new(0, 0, 0, Rgba::TRANSPARENT)]);
        let plan = renderer.plan(&model, &red_voxel_params(), true);
        assert!(plan.items.is_empty());
    }

    #[test]
    fn rotated_model_draws_back_faces_first() {
        let mut renderer = Renderer::new();
        let model = VoxelModel::from_voxels(vec![
            Voxel::new(0, 0, 0, Rgba::opaque(10, 0, 0)),
            Voxel::new(0, 0, 3, Rgba::opaque(0, 10, 0)),
        ]);
        let params = ViewParams {
            rotation: Rotation::new(20.0, 35.0, 10.0),
            scale: 6.0,
            width: 128,
            height: 128,
            ..ViewParams::default()
        };
        let plan = renderer.plan(&model, &params, true);
        assert!(!plan.items.is_empty());
        for pair in plan.items.windows(2) {
            assert!(
                pair[0].depth() >= pair[1].depth(),
                "draw order must be farthest first"
            );
        }
    }
}
