/// Voxelview - deterministic software voxel renderer
/// Rotation, culling, painter-sorted scanline rasterization and a
/// pluggable per-face shader stack, with an optional threaded backend.
pub mod accel;
pub mod model;
pub mod rendering;
pub mod shaders;
pub mod view;

pub use accel::{
    AccelError, AccelFrame, AccelParams, BackendArbiter, RenderBackend, SoftwareBackend,
    ThreadedBackend,
};
pub use model::{Bounds, Face, Rgba, Voxel, VoxelModel};
pub use rendering::{Frame, PixelBuffer, QuadSink, Renderer};
pub use shaders::{
    InputSource, ShaderEntry, ShaderModule, ShaderParams, ShaderRegistry, ShaderStackConfig,
    StackExecutor,
};
pub use view::{
    DepthReference, DownsampleMode, OutlineKernel, OutlinePlacement, OutlineSettings, Projection,
    Rotation, ViewParams,
};
