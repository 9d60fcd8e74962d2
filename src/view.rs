/// View parameters: everything a render call needs besides the model.
/// A render is a pure function of (model, view params); nothing here is
/// mutated by the pipeline.
use crate::model::Rgba;
use crate::shaders::ShaderStackConfig;

/// Euler rotation in degrees, composed X then Y then Z. The axis order is
/// fixed; face-normal math downstream depends on it.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rotation {
    pub x_deg: f32,
    pub y_deg: f32,
    pub z_deg: f32,
}

impl Rotation {
    pub const IDENTITY: Rotation = Rotation {
        x_deg: 0.0,
        y_deg: 0.0,
        z_deg: 0.0,
    };

    pub fn new(x_deg: f32, y_deg: f32, z_deg: f32) -> Self {
        Self { x_deg, y_deg, z_deg }
    }
}

/// Which depth plane of the rotated bounding box renders at exactly
/// `scale` pixels per voxel under perspective.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DepthReference {
    Front,
    #[default]
    Middle,
    Back,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Projection {
    Orthographic,
    Perspective {
        fov_degrees: f32,
        reference: DepthReference,
    },
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Orthographic
    }
}

/// Outline placement: paint the background side of the silhouette, or the
/// body side.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutlinePlacement {
    #[default]
    Outside,
    Inside,
}

/// Neighborhood probed by the outline pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutlineKernel {
    #[default]
    FourConnected,
    EightConnected,
    /// Only left/right neighbors.
    Horizontal,
    /// Only up/down neighbors.
    Vertical,
}

impl OutlineKernel {
    /// Neighbor offsets probed by this kernel.
    pub fn offsets(self) -> &'static [(i32, i32)] {
        match self {
            OutlineKernel::FourConnected => &[(1, 0), (-1, 0), (0, 1), (0, -1)],
            OutlineKernel::EightConnected => &[
                (1, 0),
                (-1, 0),
                (0, 1),
                (0, -1),
                (1, 1),
                (1, -1),
                (-1, 1),
                (-1, -1),
            ],
            OutlineKernel::Horizontal => &[(1, 0), (-1, 0)],
            OutlineKernel::Vertical => &[(0, 1), (0, -1)],
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OutlineSettings {
    pub color: Rgba,
    pub placement: OutlinePlacement,
    pub kernel: OutlineKernel,
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self {
            color: Rgba::opaque(0, 0, 0),
            placement: OutlinePlacement::Outside,
            kernel: OutlineKernel::FourConnected,
        }
    }
}

/// How supersampled frames are reduced to the requested size.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DownsampleMode {
    #[default]
    Nearest,
    BoxAverage,
}

/// Complete per-call view description.
#[derive(Clone, Debug)]
pub struct ViewParams {
    pub rotation: Rotation,
    pub scale: f32,
    pub projection: Projection,
    pub width: u32,
    pub height: u32,
    pub background: Rgba,
    pub outline: Option<OutlineSettings>,
    pub downsample: DownsampleMode,
    pub shader_stack: ShaderStackConfig,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            rotation: Rotation::IDENTITY,
            scale: 1.0,
            projection: Projection::Orthographic,
            width: 200,
            height: 200,
            background: Rgba::TRANSPARENT,
            outline: None,
            downsample: DownsampleMode::Nearest,
            shader_stack: ShaderStackConfig::default(),
        }
    }
}

impl ViewParams {
    /// Clamp degenerate inputs so a well-formed call can never fail
    /// downstream. Zero-sized outputs become 1x1; non-positive scale
    /// becomes 1.
    pub fn sanitized(&self) -> ViewParams {
        let mut p = self.clone();
        p.width = p.width.max(1);
        p.height = p.height.max(1);
        if !p.scale.is_finite() || p.scale <= 0.0 {
            p.scale = 1.0;
        }
        p
    }

    /// Integer supersampling factor for fractional scales: render at
    /// `ceil(1/scale)` times the output size, then downsample.
    pub fn supersample_factor(&self) -> u32 {
        if self.scale > 0.0 && self.scale < 1.0 {
            (1.0 / self.scale).ceil() as u32
        } else {
            1
        }
    }
}
