/// Basic camera-facing lighting: a Lambert-like term against the view
/// direction, tuned by two 0..100 sliders.
use super::{
    FaceBatch, ParamKind, ParamSpec, ShaderCategory, ShaderError, ShaderInfo, ShaderModule,
    ShaderParams,
};

const SCHEMA: &[ParamSpec] = &[
    ParamSpec {
        key: "light_intensity",
        label: "Light",
        kind: ParamKind::Number {
            min: 0.0,
            max: 100.0,
            default: 50.0,
        },
    },
    ParamSpec {
        key: "shade_intensity",
        label: "Shade",
        kind: ParamKind::Number {
            min: 0.0,
            max: 100.0,
            default: 50.0,
        },
    },
];

pub struct BasicLighting;

impl ShaderModule for BasicLighting {
    fn info(&self) -> ShaderInfo {
        ShaderInfo {
            id: "basic",
            name: "Basic Lighting",
            category: ShaderCategory::Lighting,
            requires_normals: true,
            requires_geometry: false,
        }
    }

    fn parameter_schema(&self) -> &'static [ParamSpec] {
        SCHEMA
    }

    fn process(&self, batch: &mut FaceBatch, params: &ShaderParams) -> Result<(), ShaderError> {
        let light = params.number("light_intensity", 50.0) as f32;
        let shade = params.number("shade_intensity", 50.0) as f32;

        // Floor brightness rises with the light slider; the shade slider
        // sharpens the falloff toward edge-on faces.
        let min_b = 0.05 + 0.9 * light / 100.0;
        let shade_t = 1.0 - shade / 100.0;
        let exponent = 1.0 + 6.0 * shade_t * shade_t;

        let view = batch.frame.view_dir.normalize_or_zero();
        for face in &mut batch.faces {
            let facing = face.normal.dot(view).max(0.0);
            let brightness = min_b + (1.0 - min_b) * facing.powf(exponent);
            face.color = face.color.scaled(brightness);
        }
        Ok(())
    }
}
