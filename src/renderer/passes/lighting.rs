//! Deferred Lighting Resolve
//!
//! One full-screen draw turns the geometry buffer into the camera's lit
//! image. SSAO runs first so the resolve can sample the blurred occlusion,
//! then the geometry buffer's depth is copied across so the skybox and the
//! postponed forward objects test against the opaque scene.

use log::warn;

use crate::device::{ClearFlags, CullSide, FilterMode, GraphicsDevice, Winding};
use crate::renderer::context::{LightingModel, PipelineMode, RenderContext};
use crate::renderer::frame_resource::FrameResource;
use crate::renderer::passes::post::PostProcessChain;
use crate::renderer::passes::{PipelineKit, geometry, transparency};
use crate::resources::MaterialKind;
use crate::scene::{Camera, Light, Renderable};

/// Resolve-shader sampler layout. Geometry attachments stay at their
/// attachment indices; the occlusion and environment inputs follow.
const RESOLVE_SSAO_UNIT: u32 = 5;
const RESOLVE_IRRADIANCE_UNIT: u32 = 6;
const RESOLVE_RADIANCE_UNIT: u32 = 7;
const RESOLVE_BRDF_UNIT: u32 = 8;

/// Resolves the geometry buffer into the camera's default target, then
/// forward-draws the postponed unlit and transparent objects on top.
pub fn render<D: GraphicsDevice>(
    ctx: &mut RenderContext<D>,
    kit: &PipelineKit,
    post: &mut PostProcessChain,
    camera: &Camera,
    lights: &[Light],
    renderables: &mut [Renderable],
    postponed: &geometry::Postponed,
) {
    let (Some(gbuffer), Some(target)) = (camera.geometry_buffer(), camera.default_target())
    else {
        // degraded camera: the geometry stage already forward-drew it
        transparency::render(ctx, kit, camera, lights, renderables, &postponed.transparent);
        return;
    };
    let Some(resolve) = &kit.deferred_material else {
        warn!("deferred pipeline without a resolve material, skipping lighting");
        transparency::render(ctx, kit, camera, lights, renderables, &postponed.transparent);
        return;
    };

    if ctx.settings.ssao {
        post.apply_ssao(ctx, kit, camera);
    }

    // pure quad write; rasterizer state must not interfere
    ctx.states.set_depth_test(false);
    ctx.states.set_stencil_test(false);
    ctx.states.set_blend(false);
    ctx.states.set_face_cull(true);
    ctx.states.set_face_side(CullSide::Back);
    ctx.states.set_face_winding(Winding::CounterClockwise);

    target.bind(ctx.states.device_mut());
    target.clear(ctx.states.device_mut(), camera.background, ClearFlags::all());

    let settings = ctx.settings;
    {
        let device = ctx.states.device_mut();
        resolve.apply_uniforms(device);
        for index in 0..gbuffer.color_count() {
            gbuffer.bind_color_texture(device, index, index as u32);
        }
        if settings.ssao {
            post.ssao_result()
                .bind_color_texture(device, 0, RESOLVE_SSAO_UNIT);
        }
        if settings.lighting == LightingModel::Pbr {
            if let Some(irradiance) = &camera.irradiance {
                irradiance.bind(device, RESOLVE_IRRADIANCE_UNIT);
            }
            if let Some(radiance) = &camera.radiance {
                radiance.bind(device, RESOLVE_RADIANCE_UNIT);
            }
            kit.brdf_texture.bind(device, RESOLVE_BRDF_UNIT);
        }
    }
    geometry::bind_shadow_maps(&mut ctx.states, &settings, lights, resolve);
    kit.screen_mesh.draw(ctx.states.device_mut());

    ctx.states.set_depth_test(true);
    ctx.states.set_stencil_test(true);
    ctx.states.set_blend(true);

    // carry the opaque depth over so later draws test against it
    let rect = [
        camera.viewport.x,
        camera.viewport.y,
        camera.viewport.z,
        camera.viewport.w,
    ];
    FrameResource::blit(
        ctx.states.device_mut(),
        gbuffer,
        target,
        rect,
        rect,
        ClearFlags::DEPTH,
        FilterMode::Nearest,
    );
    target.bind(ctx.states.device_mut());

    geometry::draw_skybox(ctx, kit, camera);

    // postponed objects take the forward path against the resolved image
    ctx.mode = PipelineMode::Forward;
    let brdf = kit.brdf_texture;
    for &index in &postponed.unlit {
        let renderable = &mut renderables[index];
        renderable.draw_materials(
            &mut ctx.states,
            |_| true,
            |states, material| {
                if material.kind == MaterialKind::Lit {
                    geometry::bind_forward_lighting(
                        states, &settings, lights, camera, brdf, material,
                    );
                }
            },
        );
        ctx.states.reset();
    }
    transparency::render(ctx, kit, camera, lights, renderables, &postponed.transparent);
    ctx.mode = PipelineMode::Deferred;
}
