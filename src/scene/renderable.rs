//! Drawable Objects
//!
//! A [`Renderable`] is a capability description, not a subclass: a mesh,
//! the materials to draw it with, its shadow contribution and optional
//! per-instance transforms. Passes decide which materials to draw when;
//! the renderable only knows how to issue its own geometry.

use glam::Mat4;

use crate::device::{GraphicsDevice, PipelineState, UniformValue};
use crate::resources::{Material, MaterialKind, Mesh};

/// How an object participates in shadow rendering.
///
/// `OnlyShadows` objects are excluded from the color passes but still cast
/// shadows (occluders for light leaks, proxy geometry).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShadowMode {
    Off,
    On,
    OnlyShadows,
}

/// Identity key of a renderable in the scene registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RenderableId(pub u32);

pub struct Renderable {
    pub enable: bool,
    pub mesh: Mesh,
    pub materials: Vec<Material>,
    pub shadows: ShadowMode,
    pub model: Mat4,
    /// Per-instance transforms; non-empty switches to instanced drawing.
    pub instances: Vec<Mat4>,
    pub(crate) id: RenderableId,
}

impl Renderable {
    #[must_use]
    pub fn new(mesh: Mesh, material: Material) -> Self {
        Self {
            enable: true,
            mesh,
            materials: vec![material],
            shadows: ShadowMode::On,
            model: Mat4::IDENTITY,
            instances: Vec::new(),
            id: RenderableId(0),
        }
    }

    #[must_use]
    pub fn id(&self) -> RenderableId {
        self.id
    }

    #[must_use]
    pub fn casts_shadows(&self) -> bool {
        matches!(self.shadows, ShadowMode::On | ShadowMode::OnlyShadows)
    }

    /// Whether the object appears in the color passes at all.
    #[must_use]
    pub fn visible(&self) -> bool {
        self.enable && self.shadows != ShadowMode::OnlyShadows
    }

    /// The first material's kind classifies the whole object.
    #[must_use]
    pub fn kind(&self) -> MaterialKind {
        self.materials.first().map_or(MaterialKind::Unlit, |m| m.kind)
    }

    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.kind() == MaterialKind::Transparent
    }

    /// Draws the mesh once per enabled material matching `keep`, feeding
    /// each material the model/normal transforms and the shadow mode.
    /// `after_bind` runs between the material bind and the draw so the
    /// calling pass can attach its own inputs (shadow maps, environment
    /// maps) to the activated program.
    pub fn draw_materials<D: GraphicsDevice>(
        &mut self,
        states: &mut PipelineState<D>,
        keep: impl Fn(MaterialKind) -> bool,
        mut after_bind: impl FnMut(&mut PipelineState<D>, &Material),
    ) {
        let model = self.model;
        let normal = model.inverse().transpose();
        let shadows = self.shadows;
        let instances = instance_uniform(&self.instances);
        for index in 0..self.materials.len() {
            if !self.materials[index].enable || !keep(self.materials[index].kind) {
                continue;
            }
            let material = &mut self.materials[index];
            material.set_uniform("transform.model", UniformValue::mat4(model));
            material.set_uniform("transform.normal", UniformValue::mat4(normal));
            material.set_uniform("renderer.shadows", UniformValue::Int(shadows as i32));
            if let Some(value) = instances.clone() {
                material.set_uniform("transform.instances", value);
            }
            material.bind(states);
            after_bind(states, &self.materials[index]);
            issue(states, &self.mesh, self.instances.len());
        }
    }

    /// Draws the mesh with an externally supplied material (shadow and
    /// other pass-owned materials). Only the program and its uniforms are
    /// applied; the pass's own pipeline state stays untouched.
    pub fn draw_with<D: GraphicsDevice>(
        &self,
        states: &mut PipelineState<D>,
        material: &mut Material,
    ) {
        material.set_uniform("transform.model", UniformValue::mat4(self.model));
        if let Some(value) = instance_uniform(&self.instances) {
            material.set_uniform("transform.instances", value);
        }
        material.apply_uniforms(states.device_mut());
        issue(states, &self.mesh, self.instances.len());
    }
}

fn instance_uniform(instances: &[Mat4]) -> Option<UniformValue> {
    if instances.is_empty() {
        None
    } else {
        Some(UniformValue::mat4_array(instances))
    }
}

fn issue<D: GraphicsDevice>(states: &mut PipelineState<D>, mesh: &Mesh, instances: usize) {
    let device = states.device_mut();
    if instances > 0 {
        mesh.draw_instanced(device, instances as i32);
    } else {
        mesh.draw(device);
    }
}
