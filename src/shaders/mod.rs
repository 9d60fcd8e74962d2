/// Shader pipeline: pluggable per-face color stages.
///
/// A frame's visible faces are collected into one `FaceBatch` and the
/// configured stack runs over it once, lighting stages first, then fx
/// stages. Modules are looked up by stable string id in an explicit
/// registry. Every invocation goes through a safety wrapper: a failing
/// or panicking module yields its unmodified input and the pipeline
/// carries on.
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec3;
use thiserror::Error;
use tracing::warn;

use crate::model::{Face, Rgba};

mod basic;
mod dynamic;
mod faceshade;
mod iso;

pub use basic::BasicLighting;
pub use dynamic::DynamicLighting;
pub use faceshade::FaceShade;
pub use iso::IsoShade;

/// Stages slower than this log a one-time warning.
const SLOW_MODULE_THRESHOLD: Duration = Duration::from_millis(50);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShaderCategory {
    Lighting,
    Fx,
}

/// Static metadata a module declares about itself.
#[derive(Copy, Clone, Debug)]
pub struct ShaderInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub category: ShaderCategory,
    pub requires_normals: bool,
    pub requires_geometry: bool,
}

/// Parameter value kinds, with defaults. Schema data describes the
/// parameters for configuration surfaces; computation reads values out
/// of `ShaderParams` directly.
#[derive(Clone, Debug)]
pub enum ParamKind {
    Number { min: f64, max: f64, default: f64 },
    Bool { default: bool },
    Color { default: Rgba },
    Choice { options: &'static [&'static str], default: &'static str },
}

#[derive(Clone, Debug)]
pub struct ParamSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ParamKind,
}

/// Typed parameter bag for one stack entry. Reads fall back to the
/// caller-supplied default, so missing keys never fail.
#[derive(Clone, Debug, Default)]
pub struct ShaderParams {
    numbers: HashMap<String, f64>,
    bools: HashMap<String, bool>,
    strings: HashMap<String, String>,
    colors: HashMap<String, Rgba>,
}

impl ShaderParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_number(mut self, key: &str, value: f64) -> Self {
        self.numbers.insert(key.to_owned(), value);
        self
    }

    pub fn set_bool(mut self, key: &str, value: bool) -> Self {
        self.bools.insert(key.to_owned(), value);
        self
    }

    pub fn set_string(mut self, key: &str, value: &str) -> Self {
        self.strings.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn set_color(mut self, key: &str, value: Rgba) -> Self {
        self.colors.insert(key.to_owned(), value);
        self
    }

    pub fn number(&self, key: &str, default: f64) -> f64 {
        self.numbers.get(key).copied().unwrap_or(default)
    }

    pub fn boolean(&self, key: &str, default: bool) -> bool {
        self.bools.get(key).copied().unwrap_or(default)
    }

    pub fn string<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.strings.get(key).map(String::as_str).unwrap_or(default)
    }

    pub fn color(&self, key: &str, default: Rgba) -> Rgba {
        self.colors.get(key).copied().unwrap_or(default)
    }
}

/// One visible face of one voxel, as the shader stack sees it.
#[derive(Copy, Clone, Debug)]
pub struct FaceSample {
    pub voxel_pos: Vec3,
    pub face: Face,
    /// Face normal after rotation, unit length.
    pub normal: Vec3,
    /// Working color; stages read and overwrite this.
    pub color: Rgba,
}

/// Read-only frame context shared by every face in the batch.
#[derive(Copy, Clone, Debug)]
pub struct FrameInfo {
    pub camera_pos: Vec3,
    pub view_dir: Vec3,
    pub middle: Vec3,
    pub model_size: Vec3,
    pub output_width: u32,
    pub output_height: u32,
    pub voxel_size: f32,
}

/// All visible faces of the frame plus shared context. Stages mutate
/// colors only; the executor rejects outputs that change the shape.
#[derive(Clone, Debug)]
pub struct FaceBatch {
    pub faces: Vec<FaceSample>,
    pub frame: FrameInfo,
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader failed: {0}")]
    Failed(String),
    #[error("malformed shader output: expected {expected} faces, got {actual}")]
    MalformedOutput { expected: usize, actual: usize },
}

/// A color stage. Implementations must be pure over their inputs so the
/// executor can retry or discard their output freely.
pub trait ShaderModule: Send + Sync {
    fn info(&self) -> ShaderInfo;
    fn parameter_schema(&self) -> &'static [ParamSpec];
    fn process(&self, batch: &mut FaceBatch, params: &ShaderParams) -> Result<(), ShaderError>;
}

/// Input handed to a stage before it runs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum InputSource {
    /// Reset working colors to the per-voxel base colors.
    BaseColor,
    /// Keep the live output of the previous stage.
    #[default]
    Previous,
    /// Strip color entirely: every face becomes opaque white.
    Geometry,
}

/// One configured entry in the stack.
#[derive(Clone, Debug)]
pub struct ShaderEntry {
    pub id: String,
    pub enabled: bool,
    pub input_source: InputSource,
    pub params: ShaderParams,
}

impl ShaderEntry {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            enabled: true,
            input_source: InputSource::Previous,
            params: ShaderParams::new(),
        }
    }

    pub fn with_params(mut self, params: ShaderParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_input(mut self, input_source: InputSource) -> Self {
        self.input_source = input_source;
        self
    }
}

/// Ordered stack configuration. Both lists empty means colors pass
/// through bit-identical.
#[derive(Clone, Debug, Default)]
pub struct ShaderStackConfig {
    pub lighting: Vec<ShaderEntry>,
    pub fx: Vec<ShaderEntry>,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("shader '{id}' declares category {declared:?}, registered as {registered:?}")]
    CategoryMismatch {
        id: &'static str,
        declared: ShaderCategory,
        registered: ShaderCategory,
    },
}

/// Explicit module tables keyed by stable string id, one per category.
pub struct ShaderRegistry {
    lighting: HashMap<String, Arc<dyn ShaderModule>>,
    fx: HashMap<String, Arc<dyn ShaderModule>>,
}

impl ShaderRegistry {
    pub fn empty() -> Self {
        Self {
            lighting: HashMap::new(),
            fx: HashMap::new(),
        }
    }

    /// Registry with the four built-in modules.
    pub fn with_builtins() -> Self {
        let mut reg = Self::empty();
        // Built-ins declare consistent categories, so these cannot fail.
        let modules: [Arc<dyn ShaderModule>; 4] = [
            Arc::new(BasicLighting),
            Arc::new(DynamicLighting),
            Arc::new(IsoShade),
            Arc::new(FaceShade),
        ];
        for module in modules {
            let category = module.info().category;
            let _ = reg.register(category, module);
        }
        reg
    }

    /// Register under a category table; the module's declared category
    /// must match.
    pub fn register(
        &mut self,
        category: ShaderCategory,
        module: Arc<dyn ShaderModule>,
    ) -> Result<(), RegistryError> {
        let info = module.info();
        if info.category != category {
            return Err(RegistryError::CategoryMismatch {
                id: info.id,
                declared: info.category,
                registered: category,
            });
        }
        let table = match category {
            ShaderCategory::Lighting => &mut self.lighting,
            ShaderCategory::Fx => &mut self.fx,
        };
        table.insert(info.id.to_owned(), module);
        Ok(())
    }

    pub fn get(&self, category: ShaderCategory, id: &str) -> Option<&Arc<dyn ShaderModule>> {
        match category {
            ShaderCategory::Lighting => self.lighting.get(id),
            ShaderCategory::Fx => self.fx.get(id),
        }
    }
}

impl Default for ShaderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Runs a configured stack over a face batch, wrapping every module in
/// the failure containment described above. Warnings are de-duplicated
/// per (shader id, cause) across the executor's lifetime.
#[derive(Default)]
pub struct StackExecutor {
    warned: HashSet<(String, &'static str)>,
}

impl StackExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute lighting stages then fx stages over `batch`.
    pub fn run(&mut self, registry: &ShaderRegistry, config: &ShaderStackConfig, batch: &mut FaceBatch) {
        let base: Vec<Rgba> = batch.faces.iter().map(|f| f.color).collect();

        for (category, entries) in [
            (ShaderCategory::Lighting, &config.lighting),
            (ShaderCategory::Fx, &config.fx),
        ] {
            for entry in entries {
                if !entry.enabled {
                    continue;
                }
                let Some(module) = registry.get(category, &entry.id) else {
                    self.warn_once(&entry.id, "unknown", || {
                        warn!(shader = %entry.id, "unknown shader id in stack config, skipping entry");
                    });
                    continue;
                };

                match entry.input_source {
                    InputSource::Previous => {}
                    InputSource::BaseColor => {
                        for (face, color) in batch.faces.iter_mut().zip(&base) {
                            face.color = *color;
                        }
                    }
                    InputSource::Geometry => {
                        for face in &mut batch.faces {
                            face.color = Rgba::WHITE;
                        }
                    }
                }

                self.invoke(module.as_ref(), &entry.id, batch, &entry.params);
            }
        }
    }

    /// Run one module over a scratch copy; commit the scratch only when
    /// the module returns Ok, did not panic, and kept the batch shape.
    fn invoke(&mut self, module: &dyn ShaderModule, id: &str, batch: &mut FaceBatch, params: &ShaderParams) {
        let expected = batch.faces.len();
        let started = Instant::now();

        let mut scratch = batch.clone();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            module.process(&mut scratch, params).map(|_| scratch)
        }));

        let elapsed = started.elapsed();
        if elapsed > SLOW_MODULE_THRESHOLD {
            self.warn_once(id, "slow", || {
                warn!(shader = %id, elapsed_ms = elapsed.as_millis() as u64, "shader module is slow");
            });
        }

        match outcome {
            Ok(Ok(scratch)) => {
                if scratch.faces.len() != expected {
                    self.warn_once(id, "shape", || {
                        warn!(
                            shader = %id,
                            expected,
                            actual = scratch.faces.len(),
                            "shader changed the face count, output discarded"
                        );
                    });
                    return;
                }
                *batch = scratch;
            }
            Ok(Err(err)) => {
                self.warn_once(id, "error", || {
                    warn!(shader = %id, error = %err, "shader failed, keeping stage input");
                });
            }
            Err(_) => {
                self.warn_once(id, "panic", || {
                    warn!(shader = %id, "shader panicked, keeping stage input");
                });
            }
        }
    }

    fn warn_once(&mut self, id: &str, cause: &'static str, emit: impl FnOnce()) {
        if self.warned.insert((id.to_owned(), cause)) {
            emit();
        }
    }
}

/// True for the pure primaries and pure black/white the material mode
/// leaves untouched (channel tolerance 10 at the dark end, 245 at the
/// bright end).
pub(crate) fn is_pure_color(color: Rgba) -> bool {
    let lo = |c: u8| c <= 10;
    let hi = |c: u8| c >= 245;
    let (r, g, b) = (color.r, color.g, color.b);
    (hi(r) && lo(g) && lo(b))
        || (lo(r) && hi(g) && lo(b))
        || (lo(r) && lo(g) && hi(b))
        || (lo(r) && hi(g) && hi(b))
        || (hi(r) && lo(g) && hi(b))
        || (hi(r) && hi(g) && lo(b))
        || (lo(r) && lo(g) && lo(b))
        || (hi(r) && hi(g) && hi(b))
}

/// Shared alpha/literal application used by the palette fx modules.
pub(crate) fn apply_palette_color(face: &mut FaceSample, palette: Rgba, literal: bool, tint: bool) {
    if literal {
        face.color.r = palette.r;
        face.color.g = palette.g;
        face.color.b = palette.b;
        return;
    }
    let brightness = palette.a as f32 / 255.0;
    let apply = |c: u8, tint_c: u8| -> u8 {
        let factor = if tint {
            brightness * (tint_c as f32 / 255.0)
        } else {
            brightness
        };
        (c as f32 * factor + 0.5).min(255.0) as u8
    };
    face.color.r = apply(face.color.r, palette.r);
    face.color.g = apply(face.color.g, palette.g);
    face.color.b = apply(face.color.b, palette.b);
}

#[cfg(test)]
pub(crate) fn test_batch(colors: &[Rgba]) -> FaceBatch {
    let faces = colors
        .iter()
        .enumerate()
        .map(|(i, &color)| FaceSample {
            voxel_pos: Vec3::new(i as f32, 0.0, 0.0),
            face: Face::Front,
            normal: Vec3::Z,
            color,
        })
        .collect();
    FaceBatch {
        faces,
        frame: FrameInfo {
            camera_pos: Vec3::new(0.0, 0.0, 10.0),
            view_dir: Vec3::Z,
            middle: Vec3::ZERO,
            model_size: Vec3::ONE,
            output_width: 64,
            output_height: 64,
            voxel_size: 4.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PanickyShader;
    impl ShaderModule for PanickyShader {
        fn info(&self) -> ShaderInfo {
            ShaderInfo {
                id: "panicky",
                name: "Panicky",
                category: ShaderCategory::Fx,
                requires_normals: false,
                requires_geometry: false,
            }
        }
        fn parameter_schema(&self) -> &'static [ParamSpec] {
            &[]
        }
        fn process(&self, batch: &mut FaceBatch, _params: &ShaderParams) -> Result<(), ShaderError> {
            batch.faces.clear();
            panic!("boom");
        }
    }

    struct GrowingShader;
    impl ShaderModule for GrowingShader {
        fn info(&self) -> ShaderInfo {
            ShaderInfo {
                id: "growing",
                name: "Growing",
                category: ShaderCategory::Fx,
                requires_normals: false,
                requires_geometry: false,
            }
        }
        fn parameter_schema(&self) -> &'static [ParamSpec] {
            &[]
        }
        fn process(&self, batch: &mut FaceBatch, _params: &ShaderParams) -> Result<(), ShaderError> {
            let extra = batch.faces[0];
            batch.faces.push(extra);
            for face in &mut batch.faces {
                face.color = Rgba::opaque(1, 2, 3);
            }
            Ok(())
        }
    }

    #[test]
    fn empty_stack_leaves_colors_untouched() {
        let colors = [Rgba::opaque(10, 20, 30), Rgba::opaque(200, 100, 0)];
        let mut batch = test_batch(&colors);
        let registry = ShaderRegistry::with_builtins();
        let mut exec = StackExecutor::new();
        exec.run(&registry, &ShaderStackConfig::default(), &mut batch);
        for (face, original) in batch.faces.iter().zip(&colors) {
            assert_eq!(face.color, *original);
        }
    }

    #[test]
    fn panicking_module_keeps_stage_input() {
        let mut registry = ShaderRegistry::with_builtins();
        registry
            .register(ShaderCategory::Fx, Arc::new(PanickyShader))
            .unwrap();
        let colors = [Rgba::opaque(7, 8, 9)];
        let mut batch = test_batch(&colors);
        let config = ShaderStackConfig {
            lighting: vec![],
            fx: vec![ShaderEntry::new("panicky")],
        };
        StackExecutor::new().run(&registry, &config, &mut batch);
        assert_eq!(batch.faces.len(), 1);
        assert_eq!(batch.faces[0].color, colors[0], "panicking stage must be a no-op");
    }

    #[test]
    fn face_count_change_discards_module_output() {
        let mut registry = ShaderRegistry::with_builtins();
        registry
            .register(ShaderCategory::Fx, Arc::new(GrowingShader))
            .unwrap();
        let colors = [Rgba::opaque(50, 60, 70)];
        let mut batch = test_batch(&colors);
        let config = ShaderStackConfig {
            lighting: vec![],
            fx: vec![ShaderEntry::new("growing")],
        };
        StackExecutor::new().run(&registry, &config, &mut batch);
        assert_eq!(batch.faces.len(), 1, "grown output must be discarded");
        assert_eq!(batch.faces[0].color, colors[0]);
    }

    #[test]
    fn unknown_shader_id_is_a_noop() {
        let registry = ShaderRegistry::with_builtins();
        let colors = [Rgba::opaque(1, 1, 1)];
        let mut batch = test_batch(&colors);
        let config = ShaderStackConfig {
            lighting: vec![ShaderEntry::new("does-not-exist")],
            fx: vec![],
        };
        StackExecutor::new().run(&registry, &config, &mut batch);
        assert_eq!(batch.faces[0].color, colors[0]);
    }

    #[test]
    fn geometry_input_strips_colors_to_white() {
        struct Identity;
        impl ShaderModule for Identity {
            fn info(&self) -> ShaderInfo {
                ShaderInfo {
                    id: "identity",
                    name: "Identity",
                    category: ShaderCategory::Lighting,
                    requires_normals: false,
                    requires_geometry: false,
                }
            }
            fn parameter_schema(&self) -> &'static [ParamSpec] {
                &[]
            }
            fn process(&self, _b: &mut FaceBatch, _p: &ShaderParams) -> Result<(), ShaderError> {
                Ok(())
            }
        }
        let mut registry = ShaderRegistry::empty();
        registry
            .register(ShaderCategory::Lighting, Arc::new(Identity))
            .unwrap();
        let mut batch = test_batch(&[Rgba::opaque(9, 9, 9)]);
        let config = ShaderStackConfig {
            lighting: vec![ShaderEntry::new("identity").with_input(InputSource::Geometry)],
            fx: vec![],
        };
        StackExecutor::new().run(&registry, &config, &mut batch);
        assert_eq!(batch.faces[0].color, Rgba::WHITE);
    }

    #[test]
    fn category_mismatch_is_rejected() {
        let mut registry = ShaderRegistry::empty();
        let err = registry.register(ShaderCategory::Lighting, Arc::new(PanickyShader));
        assert!(err.is_err(), "fx module must not register as lighting");
    }

    #[test]
    fn pure_colors_are_detected() {
        assert!(is_pure_color(Rgba::opaque(255, 0, 0)));
        assert!(is_pure_color(Rgba::opaque(250, 3, 250)));
        assert!(is_pure_color(Rgba::opaque(0, 0, 0)));
        assert!(is_pure_color(Rgba::opaque(255, 255, 255)));
        assert!(!is_pure_color(Rgba::opaque(128, 64, 32)));
    }
}
