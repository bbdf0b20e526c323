//! Scene Registries
//!
//! [`RenderScene`] holds the flat, insertion-ordered lists of cameras,
//! lights and renderables the pipeline consumes, plus the ambient color and
//! the designated main camera. Lists are mutated only between frames:
//! activation appends, destruction erases by identity. The simulation side
//! owns when; this module owns the bookkeeping.

pub mod camera;
pub mod light;
pub mod renderable;

pub use camera::{Camera, CameraId, Projection};
pub use light::{Light, LightId, LightKind, SHADOW_MAP_SIZE};
pub use renderable::{Renderable, RenderableId, ShadowMode};

use glam::Vec4;

pub struct RenderScene {
    /// Global ambient color, uploaded once per frame.
    pub ambient: Vec4,
    cameras: Vec<Camera>,
    lights: Vec<Light>,
    renderables: Vec<Renderable>,
    main_camera: Option<CameraId>,
    next_id: u32,
}

impl Default for RenderScene {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderScene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ambient: Vec4::new(0.2, 0.2, 0.2, 1.0),
            cameras: Vec::new(),
            lights: Vec::new(),
            renderables: Vec::new(),
            main_camera: None,
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Appends a camera; the first camera becomes the main camera.
    pub fn insert_camera(&mut self, mut camera: Camera) -> CameraId {
        let id = CameraId(self.next_id());
        camera.id = id;
        self.cameras.push(camera);
        if self.main_camera.is_none() {
            self.main_camera = Some(id);
        }
        id
    }

    /// Removes a camera by identity, clearing the main-camera slot when it
    /// pointed at it. The caller releases the camera's targets.
    pub fn take_camera(&mut self, id: CameraId) -> Option<Camera> {
        let index = self.cameras.iter().position(|c| c.id == id)?;
        if self.main_camera == Some(id) {
            self.main_camera = None;
        }
        Some(self.cameras.remove(index))
    }

    pub fn insert_light(&mut self, mut light: Light) -> LightId {
        let id = LightId(self.next_id());
        light.id = id;
        self.lights.push(light);
        id
    }

    /// Removes a light by identity. The caller releases its shadow map.
    pub fn take_light(&mut self, id: LightId) -> Option<Light> {
        let index = self.lights.iter().position(|l| l.id == id)?;
        Some(self.lights.remove(index))
    }

    pub fn insert_renderable(&mut self, mut renderable: Renderable) -> RenderableId {
        let id = RenderableId(self.next_id());
        renderable.id = id;
        self.renderables.push(renderable);
        id
    }

    pub fn take_renderable(&mut self, id: RenderableId) -> Option<Renderable> {
        let index = self.renderables.iter().position(|r| r.id == id)?;
        Some(self.renderables.remove(index))
    }

    #[must_use]
    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn cameras_mut(&mut self) -> &mut [Camera] {
        &mut self.cameras
    }

    #[must_use]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut [Light] {
        &mut self.lights
    }

    #[must_use]
    pub fn renderables(&self) -> &[Renderable] {
        &self.renderables
    }

    pub fn renderables_mut(&mut self) -> &mut [Renderable] {
        &mut self.renderables
    }

    pub fn camera_mut(&mut self, id: CameraId) -> Option<&mut Camera> {
        self.cameras.iter_mut().find(|c| c.id == id)
    }

    pub fn light_mut(&mut self, id: LightId) -> Option<&mut Light> {
        self.lights.iter_mut().find(|l| l.id == id)
    }

    pub fn renderable_mut(&mut self, id: RenderableId) -> Option<&mut Renderable> {
        self.renderables.iter_mut().find(|r| r.id == id)
    }

    #[must_use]
    pub fn main_camera(&self) -> Option<CameraId> {
        self.main_camera
    }

    pub fn set_main_camera(&mut self, id: CameraId) {
        if self.cameras.iter().any(|c| c.id == id) {
            self.main_camera = Some(id);
        }
    }

    /// Splits the scene into the borrows a frame needs: cameras and lights
    /// are read, renderables are drawn (per-object uniforms go through
    /// their materials).
    pub fn split_for_render(&mut self) -> (&[Camera], &[Light], &mut [Renderable]) {
        (&self.cameras, &self.lights, &mut self.renderables)
    }
}
