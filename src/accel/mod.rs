/// Dual-backend render dispatch.
///
/// An accelerated backend is consumed through a deliberately flat ABI:
/// voxels as a stride-7 float array, a plain parameter record, and a
/// packed RGBA byte buffer coming back. The arbiter probes for the
/// accelerated backend once at construction and falls back to the
/// software path per call; acceleration problems never reach the caller.
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::debug;

use crate::model::{Rgba, Voxel, VoxelModel};
use crate::rendering::composer::{Frame, Renderer};
use crate::shaders::ShaderStackConfig;
use crate::view::{
    DepthReference, DownsampleMode, OutlineSettings, Projection, Rotation, ViewParams,
};

pub mod threaded;

pub use threaded::ThreadedBackend;

/// Floats per voxel in the flat array: x, y, z, r, g, b, a.
pub const VOXEL_STRIDE: usize = 7;

#[derive(Debug, Error)]
pub enum AccelError {
    #[error("accelerated backend unavailable")]
    Unavailable,
    #[error("accelerated call failed: {0}")]
    CallFailed(String),
    #[error("malformed accelerated frame: expected {expected} bytes, got {actual}")]
    MalformedFrame { expected: usize, actual: usize },
}

/// Plain parameter record crossing the backend boundary. Geometry and
/// projection travel as scalars (`fov_degrees <= 0` selects
/// orthographic); post-pass and shader configuration travel as data.
#[derive(Clone, Debug)]
pub struct AccelParams {
    pub rotation: [f32; 3],
    pub scale: f32,
    /// Perspective FOV in degrees; zero or negative means orthographic.
    pub fov_degrees: f32,
    /// 0 = front, 1 = middle, 2 = back.
    pub depth_reference: u8,
    pub width: u32,
    pub height: u32,
    pub background: [u8; 4],
    pub outline: Option<OutlineSettings>,
    pub downsample: DownsampleMode,
    pub shader_stack: ShaderStackConfig,
}

impl AccelParams {
    pub fn from_view(params: &ViewParams) -> Self {
        let (fov_degrees, depth_reference) = match params.projection {
            Projection::Orthographic => (0.0, 1),
            Projection::Perspective {
                fov_degrees,
                reference,
            } => (
                fov_degrees,
                match reference {
                    DepthReference::Front => 0,
                    DepthReference::Middle => 1,
                    DepthReference::Back => 2,
                },
            ),
        };
        Self {
            rotation: [
                params.rotation.x_deg,
                params.rotation.y_deg,
                params.rotation.z_deg,
            ],
            scale: params.scale,
            fov_degrees,
            depth_reference,
            width: params.width,
            height: params.height,
            background: [
                params.background.r,
                params.background.g,
                params.background.b,
                params.background.a,
            ],
            outline: params.outline,
            downsample: params.downsample,
            shader_stack: params.shader_stack.clone(),
        }
    }

    pub fn to_view(&self) -> ViewParams {
        let projection = if self.fov_degrees > 0.0 {
            Projection::Perspective {
                fov_degrees: self.fov_degrees,
                reference: match self.depth_reference {
                    0 => DepthReference::Front,
                    2 => DepthReference::Back,
                    _ => DepthReference::Middle,
                },
            }
        } else {
            Projection::Orthographic
        };
        ViewParams {
            rotation: Rotation::new(self.rotation[0], self.rotation[1], self.rotation[2]),
            scale: self.scale,
            projection,
            width: self.width,
            height: self.height,
            background: Rgba::new(
                self.background[0],
                self.background[1],
                self.background[2],
                self.background[3],
            ),
            outline: self.outline,
            downsample: self.downsample,
            shader_stack: self.shader_stack.clone(),
        }
    }
}

/// Frame coming back across the backend boundary.
#[derive(Clone, Debug)]
pub struct AccelFrame {
    pub width: u32,
    pub height: u32,
    pub pixel_bytes: Vec<u8>,
}

impl AccelFrame {
    /// A frame whose byte length disagrees with its dimensions is
    /// discarded, never partially consumed.
    pub fn validate(&self) -> Result<(), AccelError> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.pixel_bytes.len() != expected {
            return Err(AccelError::MalformedFrame {
                expected,
                actual: self.pixel_bytes.len(),
            });
        }
        Ok(())
    }
}

/// A complete-frame backend behind the flat ABI.
pub trait RenderBackend {
    fn name(&self) -> &'static str;
    fn render(&mut self, voxels: &[f32], params: &AccelParams) -> Result<AccelFrame, AccelError>;
}

/// Flatten a model for the backend boundary. Channels are carried as
/// 0..=255 floats.
pub fn encode_voxels(model: &VoxelModel) -> Vec<f32> {
    let mut out = Vec::with_capacity(model.len() * VOXEL_STRIDE);
    for voxel in model.voxels() {
        out.extend_from_slice(&[
            voxel.pos.x as f32,
            voxel.pos.y as f32,
            voxel.pos.z as f32,
            voxel.color.r as f32,
            voxel.color.g as f32,
            voxel.color.b as f32,
            voxel.color.a as f32,
        ]);
    }
    out
}

/// Rebuild a model from the flat array.
pub fn decode_voxels(data: &[f32]) -> Result<VoxelModel, AccelError> {
    if data.len() % VOXEL_STRIDE != 0 {
        return Err(AccelError::CallFailed(format!(
            "voxel array length {} is not a multiple of {VOXEL_STRIDE}",
            data.len()
        )));
    }
    let channel = |v: f32| v.clamp(0.0, 255.0) as u8;
    let mut model = VoxelModel::new();
    for chunk in data.chunks_exact(VOXEL_STRIDE) {
        model.push(Voxel::new(
            chunk[0] as i32,
            chunk[1] as i32,
            chunk[2] as i32,
            Rgba::new(channel(chunk[3]), channel(chunk[4]), channel(chunk[5]), channel(chunk[6])),
        ));
    }
    Ok(model)
}

/// Software rendering behind the same ABI as the accelerated backend,
/// used for equivalence testing and as a registration target.
pub struct SoftwareBackend {
    renderer: Renderer,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self {
            renderer: Renderer::new(),
        }
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for SoftwareBackend {
    fn name(&self) -> &'static str {
        "software"
    }

    fn render(&mut self, voxels: &[f32], params: &AccelParams) -> Result<AccelFrame, AccelError> {
        let model = decode_voxels(voxels)?;
        let frame = self.renderer.render(&model, &params.to_view());
        Ok(AccelFrame {
            width: frame.width,
            height: frame.height,
            pixel_bytes: frame.pixels,
        })
    }
}

/// Probes the accelerated backend once, then dispatches per call with
/// silent per-call fallback to the software renderer.
pub struct BackendArbiter {
    accelerated: Option<Box<dyn RenderBackend>>,
    software: Renderer,
}

impl BackendArbiter {
    pub fn new() -> Self {
        match ThreadedBackend::probe() {
            Ok(backend) => Self::with_backend(Box::new(backend)),
            Err(err) => {
                debug!(error = %err, "accelerated backend unavailable, software only");
                Self::software_only()
            }
        }
    }

    /// Use a caller-supplied accelerated backend.
    pub fn with_backend(backend: Box<dyn RenderBackend>) -> Self {
        Self {
            accelerated: Some(backend),
            software: Renderer::new(),
        }
    }

    pub fn software_only() -> Self {
        Self {
            accelerated: None,
            software: Renderer::new(),
        }
    }

    pub fn is_accelerated(&self) -> bool {
        self.accelerated.is_some()
    }

    /// Render one frame. Any accelerated failure, panic or malformed
    /// frame falls back to the software path for this call only.
    pub fn render(&mut self, model: &VoxelModel, params: &ViewParams) -> Frame {
        if let Some(backend) = &mut self.accelerated {
            let voxels = encode_voxels(model);
            let accel_params = AccelParams::from_view(params);
            let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
                backend.render(&voxels, &accel_params)
            }));
            match attempt {
                Ok(Ok(frame)) => match frame.validate() {
                    Ok(()) => {
                        return Frame {
                            width: frame.width,
                            height: frame.height,
                            pixels: frame.pixel_bytes,
                        };
                    }
                    Err(err) => {
                        debug!(error = %err, "accelerated frame discarded, using software path");
                    }
                },
                Ok(Err(err)) => {
                    debug!(error = %err, "accelerated call failed, using software path");
                }
                Err(_) => {
                    debug!("accelerated backend panicked, using software path");
                }
            }
        }
        self.software.render(model, params)
    }
}

impl Default for BackendArbiter {
    fn default() -> Self {
        Self::new()
    }
}
