//! Scene Renderer
//!
//! [`SceneRenderer`] owns the render context, the built-in pipeline kit and
//! the post-process chain, and drives the frame: shadow maps first, then
//! per camera the geometry stage, the lighting resolution for deferred
//! pipelines and the forward transparent tail, and finally the post-process
//! chain with the main camera copied to the backbuffer.
//!
//! Scene objects enter the pipeline through the `activate_*` methods, which
//! allocate their GPU targets, and leave through `destroy_*`, which release
//! them. The scene lists themselves live in [`RenderScene`].

use log::debug;

use crate::device::GraphicsDevice;
use crate::errors::Result;
use crate::renderer::context::{PipelineMode, RenderContext, RenderSettings};
use crate::renderer::passes::post::PostProcessChain;
use crate::renderer::passes::{PipelineKit, geometry, lighting, shadow, transparency};
use crate::scene::{
    Camera, CameraId, Light, LightId, RenderScene, Renderable, RenderableId,
};

pub struct SceneRenderer<D: GraphicsDevice> {
    ctx: RenderContext<D>,
    kit: PipelineKit,
    post: PostProcessChain,
}

impl<D: GraphicsDevice> SceneRenderer<D> {
    /// Builds the pipeline over a device: baseline state, uniform blocks
    /// and the shared post-process targets. The kit's shaders were compiled
    /// by the asset collaborator against
    /// [`RenderSettings::shader_macros`].
    pub fn new(device: D, settings: RenderSettings, mut kit: PipelineKit) -> Result<Self> {
        let mut ctx = RenderContext::new(device, settings)?;
        let post = PostProcessChain::new(ctx.device_mut(), &settings, &mut kit)?;
        debug!(
            "pipeline up: {}x{} {:?} {:?}",
            settings.width, settings.height, settings.mode, settings.lighting
        );
        Ok(Self { ctx, kit, post })
    }

    #[must_use]
    pub fn settings(&self) -> &RenderSettings {
        &self.ctx.settings
    }

    pub fn device_mut(&mut self) -> &mut D {
        self.ctx.device_mut()
    }

    /// Renders one frame of the scene.
    pub fn render(&mut self, scene: &mut RenderScene) {
        let main_camera = scene.main_camera();
        let ambient = scene.ambient;
        let (cameras, lights, renderables) = scene.split_for_render();

        self.ctx.fill_video_buffer(ambient);
        self.ctx.fill_scene_buffer(lights);

        shadow::render(&mut self.ctx, &mut self.kit, lights, renderables);

        for camera in cameras {
            if !camera.enable {
                continue;
            }
            self.ctx.fill_camera_buffer(camera);

            let postponed = geometry::render(&mut self.ctx, &self.kit, camera, lights, renderables);
            if self.ctx.mode == PipelineMode::Deferred {
                lighting::render(
                    &mut self.ctx,
                    &self.kit,
                    &mut self.post,
                    camera,
                    lights,
                    renderables,
                    &postponed,
                );
            } else {
                transparency::render(
                    &mut self.ctx,
                    &self.kit,
                    camera,
                    lights,
                    renderables,
                    &postponed.transparent,
                );
            }
        }

        PostProcessChain::begin(&mut self.ctx);
        for camera in cameras {
            if !camera.enable {
                continue;
            }
            self.ctx.fill_camera_buffer(camera);
            let is_main = main_camera == Some(camera.id());
            self.post.run(&mut self.ctx, &self.kit, camera, is_main);
        }
        PostProcessChain::end(&mut self.ctx);
    }

    /// Builds the camera's render targets and registers it; the first
    /// activated camera becomes the main camera.
    pub fn activate_camera(&mut self, scene: &mut RenderScene, mut camera: Camera) -> CameraId {
        let mode = self.ctx.settings.mode;
        camera.build_targets(self.ctx.device_mut(), mode);
        scene.insert_camera(camera)
    }

    /// Unregisters the camera and frees its targets.
    pub fn destroy_camera(&mut self, scene: &mut RenderScene, id: CameraId) {
        if let Some(mut camera) = scene.take_camera(id) {
            camera.release_targets(self.ctx.device_mut());
        }
    }

    /// Registers a light, allocating its shadow map when it casts shadows.
    pub fn activate_light(&mut self, scene: &mut RenderScene, mut light: Light) -> LightId {
        if light.cast_shadows {
            light.build_shadow_map(self.ctx.device_mut());
        }
        scene.insert_light(light)
    }

    /// Unregisters the light and frees its shadow map.
    pub fn destroy_light(&mut self, scene: &mut RenderScene, id: LightId) {
        if let Some(mut light) = scene.take_light(id) {
            light.release_shadow_map(self.ctx.device_mut());
        }
    }

    /// Registers a renderable. Its mesh and materials are plain handles;
    /// nothing is allocated here.
    pub fn activate_renderable(
        &mut self,
        scene: &mut RenderScene,
        renderable: Renderable,
    ) -> RenderableId {
        scene.insert_renderable(renderable)
    }

    pub fn destroy_renderable(&mut self, scene: &mut RenderScene, id: RenderableId) {
        scene.take_renderable(id);
    }

    /// Tears the pipeline down: releases every scene-owned GPU target, the
    /// shared post-process targets and the uniform blocks, and hands the
    /// device back.
    pub fn destroy(mut self, scene: &mut RenderScene) -> D {
        for camera in scene.cameras_mut() {
            camera.release_targets(self.ctx.device_mut());
        }
        for light in scene.lights_mut() {
            light.release_shadow_map(self.ctx.device_mut());
        }
        self.post.release(self.ctx.device_mut());
        self.ctx.into_device()
    }
}
