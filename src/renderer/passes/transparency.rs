//! Transparency Pass
//!
//! Transparent objects draw after the opaque/lighting resolution, in the
//! reverse of their submission order. This is a depth-unaware stand-in for
//! a back-to-front sort; overlapping transparent geometry can sort wrong,
//! and the ordering is kept as-is on purpose. Blend function and equation
//! come from each material's own state block.

use crate::device::GraphicsDevice;
use crate::renderer::context::RenderContext;
use crate::renderer::passes::PipelineKit;
use crate::renderer::passes::geometry::bind_forward_lighting;
use crate::resources::MaterialKind;
use crate::scene::{Camera, Light, Renderable};

/// Draws the postponed transparent renderables in reverse submission order.
pub fn render<D: GraphicsDevice>(
    ctx: &mut RenderContext<D>,
    kit: &PipelineKit,
    camera: &Camera,
    lights: &[Light],
    renderables: &mut [Renderable],
    transparent: &[usize],
) {
    let settings = ctx.settings;
    let brdf = kit.brdf_texture;
    for &index in transparent.iter().rev() {
        let Some(renderable) = renderables.get_mut(index) else {
            continue;
        };
        renderable.draw_materials(
            &mut ctx.states,
            |_| true,
            |states, material| {
                if material.kind == MaterialKind::Lit {
                    bind_forward_lighting(states, &settings, lights, camera, brdf, material);
                }
            },
        );
        ctx.states.reset();
    }
}
