//! Materials
//!
//! A [`Material`] is a shader plus everything a draw needs around it: named
//! uniform values (a closed tagged union, written by pattern dispatch),
//! bound textures, and a fixed render-state block applied through the
//! deduplicating [`PipelineState`] before each draw.

use std::sync::Arc;

use glam::Vec4;
use rustc_hash::FxHashMap;

use crate::device::{
    BlendEquation, BlendFactor, CompareFunc, CullSide, GraphicsDevice, PipelineState,
    UniformValue, Winding,
};
use crate::resources::{Shader, Texture};

/// Units 0..=15 are reserved for material textures; shadow and environment
/// maps live above them.
pub const MATERIAL_TEXTURE_UNITS: usize = 16;

/// How the pipeline classifies a material.
///
/// `Lit` draws into the geometry buffer in deferred mode; `Unlit` is
/// postponed to the forward sub-pass after the resolve; `Transparent` is
/// always drawn last, in reverse submission order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MaterialKind {
    Lit,
    Unlit,
    Transparent,
}

/// Fixed render-state block applied before each draw with this material.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct RenderStates {
    pub color_mask: bool,
    pub depth_func: CompareFunc,
    pub depth_mask: bool,
    pub stencil_func: CompareFunc,
    pub stencil_ref: i32,
    pub stencil_func_mask: u32,
    pub stencil_mask: u32,
    pub blend_src: BlendFactor,
    pub blend_dst: BlendFactor,
    pub blend_equation: BlendEquation,
    pub blend_color: Vec4,
    pub face_cull: bool,
    pub face_side: CullSide,
    pub face_winding: Winding,
}

impl Default for RenderStates {
    fn default() -> Self {
        Self {
            color_mask: true,
            depth_func: CompareFunc::Less,
            depth_mask: true,
            stencil_func: CompareFunc::Always,
            stencil_ref: 1,
            stencil_func_mask: 0xFF,
            // materials do not write stencil unless asked to
            stencil_mask: 0x00,
            blend_src: BlendFactor::One,
            blend_dst: BlendFactor::Zero,
            blend_equation: BlendEquation::Add,
            blend_color: Vec4::ONE,
            face_cull: true,
            face_side: CullSide::Back,
            face_winding: Winding::CounterClockwise,
        }
    }
}

impl RenderStates {
    /// Standard alpha-blended transparency.
    #[must_use]
    pub fn transparent() -> Self {
        Self {
            blend_src: BlendFactor::SrcAlpha,
            blend_dst: BlendFactor::OneMinusSrcAlpha,
            ..Self::default()
        }
    }

    /// Issues every axis through the deduplicating state cache.
    pub fn apply<D: GraphicsDevice>(&self, states: &mut PipelineState<D>) {
        states.set_color_mask(self.color_mask);
        states.set_depth_func(self.depth_func);
        states.set_depth_mask(self.depth_mask);
        states.set_stencil_func(self.stencil_func, self.stencil_ref, self.stencil_func_mask);
        states.set_stencil_mask(self.stencil_mask);
        states.set_blend_func(self.blend_src, self.blend_dst);
        states.set_blend_equation(self.blend_equation);
        states.set_blend_color(self.blend_color);
        states.set_face_cull(self.face_cull);
        states.set_face_side(self.face_side);
        states.set_face_winding(self.face_winding);
    }
}

#[derive(Clone)]
pub struct Material {
    pub name: String,
    pub enable: bool,
    pub kind: MaterialKind,
    pub states: RenderStates,
    shader: Arc<Shader>,
    uniforms: FxHashMap<String, UniformValue>,
    textures: Vec<Texture>,
}

impl Material {
    #[must_use]
    pub fn new(name: &str, kind: MaterialKind, shader: Arc<Shader>) -> Self {
        let states = if kind == MaterialKind::Transparent {
            RenderStates::transparent()
        } else {
            RenderStates::default()
        };
        Self {
            name: name.to_owned(),
            enable: true,
            kind,
            states,
            shader,
            uniforms: FxHashMap::default(),
            textures: Vec::new(),
        }
    }

    #[must_use]
    pub fn shader(&self) -> &Shader {
        &self.shader
    }

    /// Stores (or replaces) a named uniform value. Values are written to the
    /// program on every [`Material::bind`].
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.uniforms.insert(name.to_owned(), value);
    }

    /// Appends a texture; it binds at the next material unit in list order.
    pub fn add_texture(&mut self, texture: Texture) {
        self.textures.push(texture);
    }

    #[must_use]
    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    /// Activates the program and writes the stored uniforms, leaving the
    /// pipeline state alone. Pass-owned materials (shadow, full-screen)
    /// use this so the pass's own culling/depth setup survives.
    pub fn apply_uniforms<D: GraphicsDevice>(&self, device: &mut D) {
        self.shader.activate(device);
        for (name, value) in &self.uniforms {
            self.shader.set_uniform(device, name, value);
        }
    }

    /// Binds the texture list to units `0..16` in list order.
    pub fn bind_textures<D: GraphicsDevice>(&self, device: &mut D) {
        for (unit, texture) in self.textures.iter().enumerate().take(MATERIAL_TEXTURE_UNITS) {
            texture.bind(device, unit as u32);
        }
    }

    /// Applies the state block, activates the program, writes the stored
    /// uniforms and binds the texture list to units `0..16`.
    pub fn bind<D: GraphicsDevice>(&self, states: &mut PipelineState<D>) {
        self.states.apply(states);
        let device = states.device_mut();
        self.apply_uniforms(device);
        self.bind_textures(device);
    }
}
