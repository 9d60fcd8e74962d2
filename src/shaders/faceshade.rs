/// Fixed per-face palette: each of the six physical faces gets its own
/// palette entry, applied in the same alpha/literal modes as the iso
/// shader but keyed by physical face rather than screen role.
use super::{
    apply_palette_color, is_pure_color, FaceBatch, ParamKind, ParamSpec, ShaderCategory,
    ShaderError, ShaderInfo, ShaderModule, ShaderParams,
};
use crate::model::{Face, Rgba};

const SCHEMA: &[ParamSpec] = &[
    ParamSpec {
        key: "shading_mode",
        label: "Mode",
        kind: ParamKind::Choice {
            options: &["alpha", "literal"],
            default: "alpha",
        },
    },
    ParamSpec {
        key: "material_mode",
        label: "Skip pure colors",
        kind: ParamKind::Bool { default: false },
    },
    ParamSpec {
        key: "enable_tint",
        label: "Tint",
        kind: ParamKind::Bool { default: false },
    },
    ParamSpec {
        key: "front_color",
        label: "Front",
        kind: ParamKind::Color { default: Rgba::WHITE },
    },
    ParamSpec {
        key: "back_color",
        label: "Back",
        kind: ParamKind::Color { default: Rgba::WHITE },
    },
    ParamSpec {
        key: "right_color",
        label: "Right",
        kind: ParamKind::Color { default: Rgba::WHITE },
    },
    ParamSpec {
        key: "left_color",
        label: "Left",
        kind: ParamKind::Color { default: Rgba::WHITE },
    },
    ParamSpec {
        key: "top_color",
        label: "Top",
        kind: ParamKind::Color { default: Rgba::WHITE },
    },
    ParamSpec {
        key: "bottom_color",
        label: "Bottom",
        kind: ParamKind::Color { default: Rgba::WHITE },
    },
];

pub struct FaceShade;

impl ShaderModule for FaceShade {
    fn info(&self) -> ShaderInfo {
        ShaderInfo {
            id: "faceshade",
            name: "Face Shading",
            category: ShaderCategory::Fx,
            requires_normals: false,
            requires_geometry: false,
        }
    }

    fn parameter_schema(&self) -> &'static [ParamSpec] {
        SCHEMA
    }

    fn process(&self, batch: &mut FaceBatch, params: &ShaderParams) -> Result<(), ShaderError> {
        let literal = params.string("shading_mode", "alpha") == "literal";
        let material_mode = params.boolean("material_mode", false);
        let tint = params.boolean("enable_tint", false);

        let mut palette = [Rgba::WHITE; 6];
        for face in Face::ALL {
            let key = match face {
                Face::Front => "front_color",
                Face::Back => "back_color",
                Face::Right => "right_color",
                Face::Left => "left_color",
                Face::Top => "top_color",
                Face::Bottom => "bottom_color",
            };
            palette[face.index()] = params.color(key, Rgba::WHITE);
        }

        for face in &mut batch.faces {
            if material_mode && is_pure_color(face.color) {
                continue;
            }
            apply_palette_color(face, palette[face.face.index()], literal, tint);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaders::test_batch;

    #[test]
    fn literal_mode_replaces_rgb_per_face() {
        let mut batch = test_batch(&[Rgba::opaque(40, 40, 40), Rgba::opaque(40, 40, 40)]);
        batch.faces[1].face = Face::Top;
        let params = ShaderParams::new()
            .set_string("shading_mode", "literal")
            .set_color("front_color", Rgba::opaque(10, 20, 30))
            .set_color("top_color", Rgba::opaque(90, 80, 70));
        FaceShade.process(&mut batch, &params).unwrap();
        assert_eq!(batch.faces[0].color, Rgba::opaque(10, 20, 30));
        assert_eq!(batch.faces[1].color, Rgba::opaque(90, 80, 70));
    }

    #[test]
    fn literal_mode_preserves_alpha() {
        let mut batch = test_batch(&[Rgba::new(40, 40, 40, 99)]);
        let params = ShaderParams::new()
            .set_string("shading_mode", "literal")
            .set_color("front_color", Rgba::new(1, 2, 3, 255));
        FaceShade.process(&mut batch, &params).unwrap();
        assert_eq!(batch.faces[0].color, Rgba::new(1, 2, 3, 99));
    }

    #[test]
    fn alpha_mode_with_tint_multiplies_channels() {
        let mut batch = test_batch(&[Rgba::opaque(200, 200, 200)]);
        // Half-brightness red tint on the front face.
        let params = ShaderParams::new()
            .set_bool("enable_tint", true)
            .set_color("front_color", Rgba::new(255, 0, 0, 128));
        FaceShade.process(&mut batch, &params).unwrap();
        let c = batch.faces[0].color;
        assert_eq!(c.r, 100, "255/255 tint * 128/255 brightness on 200");
        assert_eq!(c.g, 0);
        assert_eq!(c.b, 0);
    }

    #[test]
    fn default_palette_is_a_noop_in_alpha_mode() {
        let colors = [Rgba::opaque(123, 45, 67)];
        let mut batch = test_batch(&colors);
        FaceShade.process(&mut batch, &ShaderParams::new()).unwrap();
        assert_eq!(batch.faces[0].color, colors[0]);
    }
}
