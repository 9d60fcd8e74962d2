/// Rendering pipeline: geometry transform, visibility, depth ordering,
/// rasterization and frame composition.
pub mod composer;
pub mod depth;
pub mod framebuffer;
pub mod geometry;
pub mod rasterizer;
pub mod visibility;

pub use composer::{Frame, FaceRenderItem, Renderer};
pub use framebuffer::PixelBuffer;
pub use geometry::{Calibration, ScreenPoint};
pub use rasterizer::{fill_convex_quad, draw_polygon_outline, QuadSink, RasterTarget};
pub use visibility::{FrameVisibility, VisibilityCache};
