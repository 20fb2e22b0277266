use std::borrow::Cow;
use std::fmt::Write as _;

use anyhow::{anyhow, Result};

use crate::geometry::BlobGeometry;
use crate::types::Palette;

pub(crate) const VERTEX_ENTRY: &str = "vs_main";
pub(crate) const FRAGMENT_ENTRY: &str = "fs_main";

const FULLSCREEN_WGSL: &str = include_str!("shaders/fullscreen.wgsl");
const BACKGROUND_WGSL: &str = include_str!("shaders/background.wgsl");
const GLASS_WGSL: &str = include_str!("shaders/glass.wgsl");

/// Uniform block shared by both passes. Must match [`crate::gpu::BlobUniforms`].
const UNIFORM_BLOCK: &str = r"struct Uniforms {
    time: f32,
    drag_progress: f32,
    sway_progress: f32,
    aspect_ratio: f32,
};
@group(0) @binding(0) var<uniform> u: Uniforms;
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlobPass {
    /// Gradient highlight line rendered into the offscreen target.
    Background,
    /// Frosted blob sampling the offscreen target, rendered into the swapchain.
    Glass,
}

impl BlobPass {
    pub fn label(self) -> &'static str {
        match self {
            BlobPass::Background => "background pass",
            BlobPass::Glass => "glass pass",
        }
    }

    fn body(self) -> &'static str {
        match self {
            BlobPass::Background => BACKGROUND_WGSL,
            BlobPass::Glass => GLASS_WGSL,
        }
    }
}

/// Compiles one pass into a shader module, surfacing WGSL validation errors
/// instead of letting `wgpu` abort.
pub(crate) fn compile_pass_module(
    device: &wgpu::Device,
    pass: BlobPass,
    geometry: &BlobGeometry,
    palette: &Palette,
) -> Result<wgpu::ShaderModule> {
    let source = compose_pass_source(pass, geometry, palette);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(pass.label()),
        source: wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(anyhow!("failed to compile {}: {err}", pass.label()));
    }
    Ok(module)
}

/// Full WGSL source for a pass: generated prelude, full-screen triangle, pass body.
pub(crate) fn compose_pass_source(
    pass: BlobPass,
    geometry: &BlobGeometry,
    palette: &Palette,
) -> String {
    let mut source = shader_prelude(geometry, palette);
    source.push('\n');
    source.push_str(FULLSCREEN_WGSL);
    source.push('\n');
    source.push_str(pass.body());
    source
}

/// Uniform block plus the constants the shaders share with the Rust side, so
/// the hit test and the drawn shape agree.
pub(crate) fn shader_prelude(geometry: &BlobGeometry, palette: &Palette) -> String {
    let mut prelude = String::from(UNIFORM_BLOCK);
    prelude.push('\n');

    push_scalar(&mut prelude, "LINE_Y", 0.8);
    push_scalar(&mut prelude, "LINE_THICKNESS", 0.03);
    push_scalar(&mut prelude, "LINE_FALLOFF", 0.002);
    push_scalar(&mut prelude, "CENTER_Y_CLOSED", geometry.center_y_closed);
    push_scalar(&mut prelude, "CENTER_Y_TRAVEL", geometry.center_y_travel);
    push_scalar(&mut prelude, "SWAY_SHIFT", geometry.sway_shift);

    push_color(&mut prelude, "LINE_TOP", palette.line_top);
    push_color(&mut prelude, "LINE_BOTTOM", palette.line_bottom);
    push_color(&mut prelude, "GLASS_COLOR", palette.glass);
    push_color(&mut prelude, "TINT_COLOR", palette.tint);
    push_color(&mut prelude, "RIM_COLOR", palette.rim);
    prelude
}

// `{:?}` always keeps a decimal point, which WGSL needs to type the literal as f32.
fn push_scalar(out: &mut String, name: &str, value: f32) {
    let _ = writeln!(out, "const {name}: f32 = {value:?};");
}

fn push_color(out: &mut String, name: &str, [r, g, b]: [f32; 3]) {
    let _ = writeln!(out, "const {name}: vec3f = vec3f({r:?}, {g:?}, {b:?});");
}
