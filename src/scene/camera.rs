//! Cameras
//!
//! A [`Camera`] owns four render targets sized to its viewport: `default`
//! (forward target / deferred resolve destination), the geometry buffer
//! (deferred mode only), `screen` (post-process staging, primary +
//! bright-pass) and `final` (tone-mapped output). Targets are built on
//! activation and released on destruction; a failed build is logged and
//! the camera runs degraded without that buffer.

use glam::{IVec4, Mat4, Vec3, Vec4};
use log::{error, info};

use crate::device::{AttachmentFlags, FilterMode, GraphicsDevice, TextureFormat};
use crate::renderer::{FrameResource, FrameResourceDesc, PipelineMode};
use crate::resources::{Material, Texture};

/// Projection kind.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Projection {
    Perspective,
    Orthographic,
}

/// Identity key of a camera in the scene registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CameraId(pub u32);

pub struct Camera {
    pub enable: bool,
    pub projection: Projection,
    pub background: Vec4,
    /// Viewport rectangle (x, y, width, height); targets match its size.
    pub viewport: IVec4,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub position: Vec3,
    pub front: Vec3,
    pub up: Vec3,
    pub skybox: Option<Material>,
    pub irradiance: Option<Texture>,
    pub radiance: Option<Texture>,
    /// Extra full-screen materials applied after tone-mapping, in order.
    pub post_materials: Vec<Material>,
    default_target: Option<FrameResource>,
    geometry_buffer: Option<FrameResource>,
    screen_target: Option<FrameResource>,
    final_target: Option<FrameResource>,
    pub(crate) id: CameraId,
}

impl Camera {
    #[must_use]
    pub fn new(background: Vec4, viewport: IVec4) -> Self {
        Self {
            enable: true,
            projection: Projection::Perspective,
            background,
            viewport,
            fov: 45.0,
            near_plane: 0.1,
            far_plane: 100.0,
            position: Vec3::ZERO,
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            skybox: None,
            irradiance: None,
            radiance: None,
            post_materials: Vec::new(),
            default_target: None,
            geometry_buffer: None,
            screen_target: None,
            final_target: None,
            id: CameraId(0),
        }
    }

    #[must_use]
    pub fn id(&self) -> CameraId {
        self.id
    }

    /// Builds the owned render targets for `mode`. Each target fails
    /// independently; failures are logged and leave the slot empty.
    pub fn build_targets<D: GraphicsDevice>(&mut self, device: &mut D, mode: PipelineMode) {
        let width = self.viewport.z as u32;
        let height = self.viewport.w as u32;

        self.default_target = self.try_build(
            device,
            "default",
            FrameResourceDesc::texture_2d(
                width,
                height,
                FilterMode::Linear,
                AttachmentFlags::COLOR | AttachmentFlags::DEPTH | AttachmentFlags::STENCIL,
                vec![TextureFormat::Rgba16F],
            ),
        );

        if mode == PipelineMode::Deferred {
            self.geometry_buffer = self.try_build(
                device,
                "geometry",
                FrameResourceDesc::texture_2d(
                    width,
                    height,
                    FilterMode::Nearest,
                    AttachmentFlags::COLOR | AttachmentFlags::DEPTH | AttachmentFlags::STENCIL,
                    vec![
                        TextureFormat::Rgb16F,  // position
                        TextureFormat::Rgb16F,  // normal
                        TextureFormat::Rgba8,   // albedo
                        TextureFormat::Rgba16F, // specular+shininess / PBR params
                        TextureFormat::Rg16F,   // extra
                    ],
                ),
            );
        }

        self.screen_target = self.try_build(
            device,
            "screen",
            FrameResourceDesc::texture_2d(
                width,
                height,
                FilterMode::Linear,
                AttachmentFlags::COLOR,
                vec![TextureFormat::Rgba16F, TextureFormat::Rgba16F],
            ),
        );

        self.final_target = self.try_build(
            device,
            "final",
            FrameResourceDesc::texture_2d(
                width,
                height,
                FilterMode::Linear,
                AttachmentFlags::COLOR,
                vec![TextureFormat::Rgba16F],
            ),
        );
    }

    fn try_build<D: GraphicsDevice>(
        &self,
        device: &mut D,
        name: &str,
        desc: FrameResourceDesc,
    ) -> Option<FrameResource> {
        match FrameResource::build(device, &desc) {
            Ok(resource) => Some(resource),
            Err(err) => {
                error!("failed to create camera {name} frame buffer: {err}");
                info!("camera {:?}", self.id);
                None
            }
        }
    }

    pub fn release_targets<D: GraphicsDevice>(&mut self, device: &mut D) {
        for target in [
            self.default_target.take(),
            self.geometry_buffer.take(),
            self.screen_target.take(),
            self.final_target.take(),
        ] {
            if let Some(mut target) = target {
                target.release(device);
            }
        }
    }

    #[must_use]
    pub fn default_target(&self) -> Option<&FrameResource> {
        self.default_target.as_ref()
    }

    #[must_use]
    pub fn geometry_buffer(&self) -> Option<&FrameResource> {
        self.geometry_buffer.as_ref()
    }

    #[must_use]
    pub fn screen_target(&self) -> Option<&FrameResource> {
        self.screen_target.as_ref()
    }

    #[must_use]
    pub fn final_target(&self) -> Option<&FrameResource> {
        self.final_target.as_ref()
    }

    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Projection over the window size (not the viewport rectangle).
    #[must_use]
    pub fn projection_matrix(&self, width: u32, height: u32) -> Mat4 {
        match self.projection {
            Projection::Orthographic => Mat4::orthographic_rh_gl(
                0.0,
                width as f32,
                0.0,
                height as f32,
                self.near_plane,
                self.far_plane,
            ),
            Projection::Perspective => Mat4::perspective_rh_gl(
                self.fov.to_radians(),
                width as f32 / height as f32,
                self.near_plane,
                self.far_plane,
            ),
        }
    }

    /// Image-based lighting is active when both environment maps are set.
    #[must_use]
    pub fn image_based_lighting(&self) -> bool {
        self.irradiance.is_some() && self.radiance.is_some()
    }
}
