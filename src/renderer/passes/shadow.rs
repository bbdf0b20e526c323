//! Shadow Depth Pass
//!
//! Renders per-light depth-only shadow maps before any camera draws.
//! Directional and spot lights get a single light-space matrix; point
//! lights get six cube-face matrices plus their position and far plane so
//! the shadow shader can linearize distance. Front faces are culled during
//! the pass to cut down on self-shadowing acne.

use glam::Vec4;

use crate::device::{ClearFlags, CullSide, GraphicsDevice, UniformValue};
use crate::renderer::context::RenderContext;
use crate::renderer::passes::PipelineKit;
use crate::resources::Material;
use crate::scene::{Light, LightKind, Renderable};

/// Renders every shadow map for the frame. Lights past the configured
/// shadow cap, and lights whose shadow target failed to build, are skipped
/// and simply cast no shadow.
pub fn render<D: GraphicsDevice>(
    ctx: &mut RenderContext<D>,
    kit: &mut PipelineKit,
    lights: &[Light],
    renderables: &mut [Renderable],
) {
    let mut rendered = 0;
    for light in lights {
        if !light.enable || !light.cast_shadows {
            continue;
        }
        if rendered >= ctx.settings.max_shadows {
            break;
        }
        let Some(target) = light.shadow_map() else {
            continue;
        };

        target.bind(ctx.states.device_mut());
        target.clear(ctx.states.device_mut(), Vec4::ZERO, ClearFlags::DEPTH);

        // front-face culling against peter panning
        ctx.states.set_face_side(CullSide::Front);

        let material = if light.kind == LightKind::Point {
            set_point_uniforms(light, &mut kit.point_shadow_material);
            &mut kit.point_shadow_material
        } else {
            kit.shadow_material
                .set_uniform("light_matrix", UniformValue::mat4(light.light_matrix()));
            &mut kit.shadow_material
        };

        for renderable in renderables.iter_mut() {
            if !renderable.enable || !renderable.casts_shadows() || renderable.is_transparent() {
                continue;
            }
            renderable.draw_with(&mut ctx.states, material);
        }

        ctx.states.set_face_side(CullSide::Back);
        ctx.states.device_mut().bind_framebuffer(None);
        rendered += 1;
    }
}

fn set_point_uniforms(light: &Light, material: &mut Material) {
    let projection = light.projection_matrix();
    material.set_uniform(
        "light_position",
        UniformValue::Vec3(light.position.to_array()),
    );
    material.set_uniform(
        "light_matrices",
        UniformValue::mat4_array(&light.omnidirectional_matrices(projection)),
    );
    material.set_uniform("light_far_plane", UniformValue::Float(light.far_plane));
}
