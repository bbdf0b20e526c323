//! Geometry Pass
//!
//! Forward mode rasterizes straight into the camera's default target,
//! lighting each object as it draws. Deferred mode fills the geometry
//! buffer with Lit surfaces and postpones Unlit and Transparent objects to
//! the forward sub-pass that follows the lighting resolve. In both modes
//! transparent objects are collected in submission order and drawn later.

use glam::Vec4;
use log::warn;

use crate::device::{
    ClearFlags, CompareFunc, CullSide, GraphicsDevice, PipelineState, UniformValue,
};
use crate::renderer::context::{
    FORWARD_BRDF_UNIT, FORWARD_IRRADIANCE_UNIT, FORWARD_RADIANCE_UNIT, LightingModel,
    PipelineMode, RenderContext, RenderSettings, SHADOW_UNIT_BASE,
};
use crate::renderer::passes::PipelineKit;
use crate::resources::{Material, MaterialKind, Texture};
use crate::scene::{Camera, Light, LightKind, Renderable};

/// Renderable indices postponed past the opaque stage, in submission order.
#[derive(Default)]
pub struct Postponed {
    pub unlit: Vec<usize>,
    pub transparent: Vec<usize>,
}

/// Runs the geometry stage for one camera in the current pipeline mode.
pub fn render<D: GraphicsDevice>(
    ctx: &mut RenderContext<D>,
    kit: &PipelineKit,
    camera: &Camera,
    lights: &[Light],
    renderables: &mut [Renderable],
) -> Postponed {
    match ctx.mode {
        PipelineMode::Forward => forward(ctx, kit, camera, lights, renderables),
        PipelineMode::Deferred => {
            if camera.geometry_buffer().is_some() {
                deferred(ctx, camera, renderables)
            } else {
                // degraded camera: no geometry buffer means no deferred path
                warn!("camera {:?} has no geometry buffer, falling back to forward", camera.id());
                forward(ctx, kit, camera, lights, renderables)
            }
        }
    }
}

fn forward<D: GraphicsDevice>(
    ctx: &mut RenderContext<D>,
    kit: &PipelineKit,
    camera: &Camera,
    lights: &[Light],
    renderables: &mut [Renderable],
) -> Postponed {
    let mut postponed = Postponed::default();
    let Some(target) = camera.default_target() else {
        return postponed;
    };
    target.bind(ctx.states.device_mut());
    target.clear(ctx.states.device_mut(), camera.background, ClearFlags::all());

    draw_skybox(ctx, kit, camera);

    let settings = ctx.settings;
    let brdf = kit.brdf_texture;
    for (index, renderable) in renderables.iter_mut().enumerate() {
        if !renderable.visible() {
            continue;
        }
        if renderable.is_transparent() {
            postponed.transparent.push(index);
            continue;
        }
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
    postponed
}

fn deferred<D: GraphicsDevice>(
    ctx: &mut RenderContext<D>,
    camera: &Camera,
    renderables: &mut [Renderable],
) -> Postponed {
    let mut postponed = Postponed::default();
    let Some(gbuffer) = camera.geometry_buffer() else {
        return postponed;
    };

    // keep blending away from the geometry buffer
    ctx.states.set_blend(false);
    gbuffer.bind(ctx.states.device_mut());
    gbuffer.clear(ctx.states.device_mut(), Vec4::ZERO, ClearFlags::all());

    for (index, renderable) in renderables.iter_mut().enumerate() {
        if !renderable.visible() {
            continue;
        }
        match renderable.kind() {
            MaterialKind::Lit => {
                renderable.draw_materials(&mut ctx.states, |_| true, |_, _| {});
                ctx.states.reset();
            }
            MaterialKind::Unlit => postponed.unlit.push(index),
            MaterialKind::Transparent => postponed.transparent.push(index),
        }
    }
    postponed
}

/// Draws the camera's skybox (when present) from inside the volume:
/// front-face culling with depth relaxed to less-or-equal, restored to
/// back/less immediately after.
pub(crate) fn draw_skybox<D: GraphicsDevice>(
    ctx: &mut RenderContext<D>,
    kit: &PipelineKit,
    camera: &Camera,
) {
    let Some(skybox) = &camera.skybox else {
        return;
    };
    ctx.states.set_depth_func(CompareFunc::LessOrEqual);
    ctx.states.set_face_side(CullSide::Front);

    let device = ctx.states.device_mut();
    skybox.shader().activate(device);
    skybox.bind_textures(device);
    kit.skybox_mesh.draw(device);

    ctx.states.set_depth_func(CompareFunc::Less);
    ctx.states.set_face_side(CullSide::Back);
}

/// Binds the per-draw lighting inputs of a forward-lit material: shadow
/// maps at two units per shadowed light from [`SHADOW_UNIT_BASE`], the
/// light count, and the environment maps when PBR shading is active.
pub(crate) fn bind_forward_lighting<D: GraphicsDevice>(
    states: &mut PipelineState<D>,
    settings: &RenderSettings,
    lights: &[Light],
    camera: &Camera,
    brdf: Texture,
    material: &Material,
) {
    bind_shadow_maps(states, settings, lights, material);

    if settings.lighting == LightingModel::Pbr {
        let device = states.device_mut();
        if let Some(irradiance) = &camera.irradiance {
            irradiance.bind(device, FORWARD_IRRADIANCE_UNIT);
        }
        if let Some(radiance) = &camera.radiance {
            radiance.bind(device, FORWARD_RADIANCE_UNIT);
        }
        brdf.bind(device, FORWARD_BRDF_UNIT);
    }
}

/// Binds the shadow maps at two units per shadowed light from
/// [`SHADOW_UNIT_BASE`] (2D map first, cube map second) and writes the
/// light count the shading loop iterates over. Shared by the forward draw
/// path and the deferred resolve.
pub(crate) fn bind_shadow_maps<D: GraphicsDevice>(
    states: &mut PipelineState<D>,
    settings: &RenderSettings,
    lights: &[Light],
    material: &Material,
) {
    let mut shadow_map_id = 0usize;
    let mut unit = SHADOW_UNIT_BASE;
    let mut lights_count = 0u32;
    for light in lights.iter().take(settings.max_lights) {
        if !light.enable {
            continue;
        }
        if light.cast_shadows && shadow_map_id < settings.max_shadows {
            let (flat_unit, cube_unit) = (unit, unit + 1);
            unit += 2;
            shadow_map_id += 1;
            if let Some(map) = light.shadow_map() {
                let sampler = if light.kind == LightKind::Point {
                    cube_unit
                } else {
                    flat_unit
                };
                map.bind_depth_stencil_texture(states.device_mut(), sampler);
            }
        }
        lights_count += 1;
    }
    material.shader().set_uniform(
        states.device_mut(),
        "lights_count",
        &UniformValue::UInt(lights_count),
    );
}
