//! Render Context
//!
//! [`RenderContext`] is the explicit object the whole pipeline threads
//! through its calls: the deduplicating state cache over the device, the
//! immutable pipeline settings and the three fixed-index uniform buffers.
//! Nothing in the crate reaches for a global.

use bytemuck::bytes_of;
use glam::Vec4;

use crate::device::{BufferId, GraphicsDevice, PipelineState};
use crate::errors::Result;
use crate::renderer::uniforms::{
    self, CAMERA_BLOCK_BINDING, CameraBlock, LightRecord, SCENE_BLOCK_BINDING, VIDEO_BLOCK_BINDING,
    VideoBlock,
};
use crate::scene::{Camera, Light};

/// First texture unit of the shadow-map range; each shadowed light takes
/// two consecutive units (2D map, cube map).
pub const SHADOW_UNIT_BASE: u32 = 16;
/// Environment maps for forward-lit materials.
pub const FORWARD_IRRADIANCE_UNIT: u32 = 24;
pub const FORWARD_RADIANCE_UNIT: u32 = 25;
pub const FORWARD_BRDF_UNIT: u32 = 26;

/// Geometry pass style.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PipelineMode {
    Forward = 1,
    Deferred = 2,
}

/// Shading model the built-in materials were compiled for.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LightingModel {
    BlinnPhong = 1,
    Pbr = 2,
}

/// Fixed pipeline configuration. Shaders are compiled against
/// [`RenderSettings::shader_macros`] once, so the limits must not change
/// for the pipeline's lifetime.
#[derive(Clone, Copy, Debug)]
pub struct RenderSettings {
    /// Presentation size.
    pub width: u32,
    pub height: u32,
    pub mode: PipelineMode,
    pub lighting: LightingModel,
    pub max_lights: usize,
    pub max_shadows: usize,
    pub ssao: bool,
    pub fxaa: bool,
    pub bloom: bool,
}

impl RenderSettings {
    #[must_use]
    pub fn new(width: u32, height: u32, mode: PipelineMode) -> Self {
        Self {
            width,
            height,
            mode,
            lighting: LightingModel::BlinnPhong,
            max_lights: 4,
            max_shadows: 4,
            ssao: false,
            fxaa: false,
            bloom: false,
        }
    }

    /// Macro block injected into every shader at compile time.
    #[must_use]
    pub fn shader_macros(&self) -> String {
        format!(
            "#define MAX_LIGHTS {}\n#define MAX_SHADOWS {}\n#define MAX_REFLECTION_LOD 4.0",
            self.max_lights, self.max_shadows
        )
    }
}

pub struct RenderContext<D: GraphicsDevice> {
    pub states: PipelineState<D>,
    pub settings: RenderSettings,
    /// Current geometry-pass mode. Flipped to `Forward` while the deferred
    /// path forward-draws its postponed objects, then restored.
    pub mode: PipelineMode,
    video_ubo: BufferId,
    camera_ubo: BufferId,
    scene_ubo: BufferId,
}

impl<D: GraphicsDevice> RenderContext<D> {
    /// Wraps the device, applies the baseline state and allocates the three
    /// uniform blocks at their fixed bindings.
    pub fn new(device: D, settings: RenderSettings) -> Result<Self> {
        let mut states = PipelineState::new(device);
        states.reset();

        let device = states.device_mut();
        let video_ubo =
            device.create_uniform_buffer(std::mem::size_of::<VideoBlock>(), VIDEO_BLOCK_BINDING)?;
        let camera_ubo = device
            .create_uniform_buffer(std::mem::size_of::<CameraBlock>(), CAMERA_BLOCK_BINDING)?;
        let scene_ubo = device.create_uniform_buffer(
            settings.max_lights * std::mem::size_of::<LightRecord>(),
            SCENE_BLOCK_BINDING,
        )?;

        Ok(Self {
            states,
            settings,
            mode: settings.mode,
            video_ubo,
            camera_ubo,
            scene_ubo,
        })
    }

    pub fn device_mut(&mut self) -> &mut D {
        self.states.device_mut()
    }

    /// Uploads block 0 for the frame.
    pub fn fill_video_buffer(&mut self, ambient: Vec4) {
        let block = VideoBlock {
            ambient: ambient.to_array(),
            ssao: i32::from(self.settings.ssao),
            bloom: i32::from(self.settings.bloom),
        };
        let buffer = self.video_ubo;
        self.states
            .device_mut()
            .write_uniform_buffer(buffer, 0, bytes_of(&block));
    }

    /// Uploads block 1 for the camera about to render.
    pub fn fill_camera_buffer(&mut self, camera: &Camera) {
        let block = CameraBlock {
            view: camera.view_matrix().to_cols_array(),
            projection: camera
                .projection_matrix(self.settings.width, self.settings.height)
                .to_cols_array(),
            position: camera.position.extend(0.0).to_array(),
            viewport: camera.viewport.as_vec4().to_array(),
            image_based_lighting: i32::from(camera.image_based_lighting()),
        };
        let buffer = self.camera_ubo;
        self.states
            .device_mut()
            .write_uniform_buffer(buffer, 0, bytes_of(&block));
    }

    /// Uploads block 2 with the frame's light records.
    pub fn fill_scene_buffer(&mut self, lights: &[Light]) {
        let records =
            uniforms::build_light_records(lights, self.settings.max_lights, self.settings.max_shadows);
        if records.is_empty() {
            return;
        }
        let buffer = self.scene_ubo;
        self.states
            .device_mut()
            .write_uniform_buffer(buffer, 0, bytemuck::cast_slice(&records));
    }

    /// Frees the uniform buffers and hands the device back.
    pub fn into_device(mut self) -> D {
        let (video, camera, scene) = (self.video_ubo, self.camera_ubo, self.scene_ubo);
        let device = self.states.device_mut();
        device.delete_buffer(video);
        device.delete_buffer(camera);
        device.delete_buffer(scene);
        self.states.into_device()
    }
}
