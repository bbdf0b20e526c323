//! Post-Process Chain
//!
//! Screen-space effects over each camera's finished image: a copy into the
//! screen target, FXAA, a ping-pong Gaussian bloom, tone-mapping into the
//! final target, camera-supplied extra effects and the backbuffer copy for
//! the main camera.
//!
//! SSAO lives here too because it owns the occlusion targets, kernel and
//! noise texture, but it executes earlier, inside the deferred camera loop
//! before the lighting resolve consumes it. The textual order of this
//! module is not the execution order.

use glam::{Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::device::{
    AttachmentFlags, ClearFlags, CullSide, FilterMode, GraphicsDevice, TextureDesc,
    TextureFormat, TextureTarget, UniformValue, Winding, WrapMode,
};
use crate::errors::Result;
use crate::renderer::context::{PipelineMode, RenderContext, RenderSettings};
use crate::renderer::frame_resource::{FrameResource, FrameResourceDesc};
use crate::renderer::passes::PipelineKit;
use crate::resources::Texture;
use crate::scene::Camera;

/// Hemisphere kernel size; fixed because the SSAO shader is compiled
/// against it.
const SSAO_KERNEL_SIZE: usize = 64;
/// Rotation-noise tile side; the noise texture tiles across the screen.
const SSAO_NOISE_SIDE: u32 = 4;
/// Gaussian blur iterations, alternating horizontal/vertical.
const BLOOM_ITERATIONS: u32 = 10;

pub struct PostProcessChain {
    ssao_targets: [FrameResource; 2],
    blur_targets: [FrameResource; 2],
    noise_texture: Option<Texture>,
    /// Index of the blur target written last; the final pass reads it.
    last_blur: usize,
}

impl PostProcessChain {
    /// Builds the shared intermediate targets at the presentation size and,
    /// for deferred pipelines, the SSAO kernel and noise texture. Failure
    /// here is fatal to pipeline construction.
    pub fn new<D: GraphicsDevice>(
        device: &mut D,
        settings: &RenderSettings,
        kit: &mut PipelineKit,
    ) -> Result<Self> {
        let occlusion = |width, height| {
            FrameResourceDesc::texture_2d(
                width,
                height,
                FilterMode::Nearest,
                AttachmentFlags::COLOR,
                vec![TextureFormat::R16F],
            )
        };
        let blur = |width, height| {
            FrameResourceDesc::texture_2d(
                width,
                height,
                FilterMode::Linear,
                AttachmentFlags::COLOR,
                vec![TextureFormat::Rgba16F],
            )
        };

        let ssao_targets = [
            FrameResource::build(device, &occlusion(settings.width, settings.height))?,
            FrameResource::build(device, &occlusion(settings.width, settings.height))?,
        ];
        let blur_targets = [
            FrameResource::build(device, &blur(settings.width, settings.height))?,
            FrameResource::build(device, &blur(settings.width, settings.height))?,
        ];

        let noise_texture = if settings.mode == PipelineMode::Deferred {
            let mut rng = StdRng::seed_from_u64(0);
            kit.ssao_material
                .set_uniform("kernel", UniformValue::Vec3Array(sample_kernel(&mut rng)));
            Some(build_noise_texture(device, &mut rng)?)
        } else {
            None
        };

        Ok(Self {
            ssao_targets,
            blur_targets,
            noise_texture,
            last_blur: 0,
        })
    }

    pub fn release<D: GraphicsDevice>(&mut self, device: &mut D) {
        for target in self.ssao_targets.iter_mut().chain(self.blur_targets.iter_mut()) {
            target.release(device);
        }
        if let Some(noise) = self.noise_texture.take() {
            device.delete_texture(noise.id);
        }
    }

    /// State setup for the whole post-process stage: no depth/stencil/blend,
    /// back culling. Full-screen draws are pure quad writes.
    pub fn begin<D: GraphicsDevice>(ctx: &mut RenderContext<D>) {
        ctx.states.set_depth_test(false);
        ctx.states.set_stencil_test(false);
        ctx.states.set_blend(false);
        ctx.states.set_face_cull(true);
        ctx.states.set_face_side(CullSide::Back);
        ctx.states.set_face_winding(Winding::CounterClockwise);
    }

    pub fn end<D: GraphicsDevice>(ctx: &mut RenderContext<D>) {
        ctx.states.set_depth_test(true);
        ctx.states.set_stencil_test(true);
        ctx.states.set_blend(true);
    }

    /// The per-camera chain: screen copy, gated FXAA and bloom, the final
    /// tone-map plus extra materials, and the backbuffer copy for the main
    /// camera. SSAO is not here; it already ran before the resolve.
    pub fn run<D: GraphicsDevice>(
        &mut self,
        ctx: &mut RenderContext<D>,
        kit: &PipelineKit,
        camera: &Camera,
        is_main: bool,
    ) {
        self.render_screen(ctx, kit, camera);
        if ctx.settings.fxaa {
            self.apply_fxaa(ctx, kit, camera);
        }
        if ctx.settings.bloom {
            self.apply_bloom(ctx, kit, camera);
        }
        self.render_final(ctx, kit, camera);
        if is_main {
            self.render_backbuffer(ctx, kit, camera);
        }
    }

    /// Occlusion over the geometry buffer's position/normal, immediately
    /// blurred into the second target. Runs inside the deferred camera loop
    /// before the lighting resolve samples the blurred result.
    pub fn apply_ssao<D: GraphicsDevice>(
        &mut self,
        ctx: &mut RenderContext<D>,
        kit: &PipelineKit,
        camera: &Camera,
    ) {
        let Some(gbuffer) = camera.geometry_buffer() else {
            return;
        };
        let Some(noise) = self.noise_texture else {
            return;
        };

        let device = ctx.states.device_mut();
        self.ssao_targets[0].bind(device);
        self.ssao_targets[0].clear(device, Vec4::ZERO, ClearFlags::COLOR);
        kit.ssao_material.apply_uniforms(device);
        gbuffer.bind_color_texture(device, 0, 0);
        gbuffer.bind_color_texture(device, 1, 1);
        noise.bind(device, 2);
        kit.screen_mesh.draw(device);

        self.ssao_targets[1].bind(device);
        self.ssao_targets[1].clear(device, Vec4::ZERO, ClearFlags::COLOR);
        kit.ssao_blur_material.apply_uniforms(device);
        self.ssao_targets[0].bind_color_texture(device, 0, 0);
        kit.screen_mesh.draw(device);
    }

    /// The blurred occlusion target the lighting resolve samples.
    #[must_use]
    pub fn ssao_result(&self) -> &FrameResource {
        &self.ssao_targets[1]
    }

    fn render_screen<D: GraphicsDevice>(
        &self,
        ctx: &mut RenderContext<D>,
        kit: &PipelineKit,
        camera: &Camera,
    ) {
        let (Some(screen), Some(source)) = (camera.screen_target(), camera.default_target())
        else {
            return;
        };
        let device = ctx.states.device_mut();
        screen.bind(device);
        kit.screen_material.apply_uniforms(device);
        source.bind_color_texture(device, 0, 0);
        kit.screen_mesh.draw(device);
    }

    fn apply_fxaa<D: GraphicsDevice>(
        &self,
        ctx: &mut RenderContext<D>,
        kit: &PipelineKit,
        camera: &Camera,
    ) {
        let Some(screen) = camera.screen_target() else {
            return;
        };
        let device = ctx.states.device_mut();
        // in place: the screen target samples its own primary attachment
        screen.bind(device);
        kit.fxaa_material.apply_uniforms(device);
        screen.bind_color_texture(device, 0, 0);
        kit.screen_mesh.draw(device);
    }

    fn apply_bloom<D: GraphicsDevice>(
        &mut self,
        ctx: &mut RenderContext<D>,
        kit: &PipelineKit,
        camera: &Camera,
    ) {
        let Some(screen) = camera.screen_target() else {
            return;
        };
        let device = ctx.states.device_mut();
        kit.blur_material.shader().activate(device);

        let mut horizontal = true;
        for iteration in 0..BLOOM_ITERATIONS {
            let current = usize::from(!horizontal);
            let other = usize::from(horizontal);

            self.blur_targets[current].bind(device);
            kit.blur_material.shader().set_uniform(
                device,
                "horizontal",
                &UniformValue::Bool(horizontal),
            );
            if iteration == 0 {
                // seed from the bright-pass attachment
                screen.bind_color_texture(device, 1, 0);
            } else {
                self.blur_targets[other].bind_color_texture(device, 0, 0);
            }
            kit.screen_mesh.draw(device);

            horizontal = !horizontal;
            self.last_blur = current;
        }
    }

    fn render_final<D: GraphicsDevice>(
        &self,
        ctx: &mut RenderContext<D>,
        kit: &PipelineKit,
        camera: &Camera,
    ) {
        let (Some(final_target), Some(screen)) = (camera.final_target(), camera.screen_target())
        else {
            return;
        };
        let bloom = ctx.settings.bloom;
        let device = ctx.states.device_mut();
        final_target.bind(device);
        final_target.clear(device, Vec4::ZERO, ClearFlags::all());

        kit.final_material.apply_uniforms(device);
        screen.bind_color_texture(device, 0, 0);
        if bloom {
            self.blur_targets[self.last_blur].bind_color_texture(device, 0, 1);
        }
        kit.screen_mesh.draw(device);

        // order-dependent extras, each reading the final target's own output
        for material in &camera.post_materials {
            if !material.enable {
                continue;
            }
            material.apply_uniforms(device);
            final_target.bind_color_texture(device, 0, 0);
            kit.screen_mesh.draw(device);
        }
    }

    fn render_backbuffer<D: GraphicsDevice>(
        &self,
        ctx: &mut RenderContext<D>,
        kit: &PipelineKit,
        camera: &Camera,
    ) {
        let Some(final_target) = camera.final_target() else {
            return;
        };
        let (width, height) = (ctx.settings.width, ctx.settings.height);
        let device = ctx.states.device_mut();
        device.bind_framebuffer(None);
        device.set_viewport(0, 0, width as i32, height as i32);
        device.clear(Vec4::ZERO, ClearFlags::all());

        kit.screen_material.apply_uniforms(device);
        final_target.bind_color_texture(device, 0, 0);
        kit.screen_mesh.draw(device);
    }
}

/// 64 hemisphere samples in tangent space, scaled toward the kernel center.
fn sample_kernel(rng: &mut StdRng) -> Vec<[f32; 3]> {
    let mut kernel = Vec::with_capacity(SSAO_KERNEL_SIZE);
    for i in 0..SSAO_KERNEL_SIZE {
        let sample = Vec3::new(
            rng.random::<f32>() * 2.0 - 1.0,
            rng.random::<f32>() * 2.0 - 1.0,
            rng.random::<f32>(),
        )
        .normalize()
            * rng.random::<f32>();
        let scale = i as f32 / SSAO_KERNEL_SIZE as f32;
        let scale = 0.1 + scale * scale * 0.9;
        kernel.push((sample * scale).to_array());
    }
    kernel
}

/// 4x4 tiled rotation noise: tangent-space vectors rotating around Z.
fn build_noise_texture<D: GraphicsDevice>(device: &mut D, rng: &mut StdRng) -> Result<Texture> {
    let mut noise = Vec::with_capacity((SSAO_NOISE_SIDE * SSAO_NOISE_SIDE) as usize);
    for _ in 0..SSAO_NOISE_SIDE * SSAO_NOISE_SIDE {
        noise.push([
            rng.random::<f32>() * 2.0 - 1.0,
            rng.random::<f32>() * 2.0 - 1.0,
            0.0f32,
        ]);
    }
    let id = device.create_texture(&TextureDesc {
        target: TextureTarget::Texture2D,
        format: TextureFormat::Rgb32F,
        width: SSAO_NOISE_SIDE,
        height: SSAO_NOISE_SIDE,
        wrap: WrapMode::Repeat,
        filter: FilterMode::Nearest,
        border_color: Vec4::ONE,
        data: Some(bytemuck::cast_slice(&noise)),
    })?;
    Ok(Texture::new(id, TextureTarget::Texture2D))
}
