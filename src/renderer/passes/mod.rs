//! Pipeline Passes
//!
//! Each pass is a function over the [`RenderContext`], the built-in
//! [`PipelineKit`] and the scene lists. The per-frame ordering lives in
//! [`SceneRenderer::render`](crate::renderer::SceneRenderer::render) and is
//! load-bearing: shadow maps complete before any camera samples them, SSAO
//! runs before the deferred resolve consumes it, transparency follows the
//! opaque/lighting resolution.

pub mod geometry;
pub mod lighting;
pub mod post;
pub mod shadow;
pub mod transparency;

use crate::resources::{Material, Mesh, Texture};

/// The pipeline's built-in meshes, materials and lookup textures. Resolved
/// by the asset collaborator before rendering starts; shader compile/link
/// failures never happen mid-frame.
pub struct PipelineKit {
    /// Full-screen quad.
    pub screen_mesh: Mesh,
    /// Unit cube drawn from the inside.
    pub skybox_mesh: Mesh,
    /// Depth-only material for directional and spot shadow maps.
    pub shadow_material: Material,
    /// Depth-only material for point (cube) shadow maps.
    pub point_shadow_material: Material,
    /// Full-screen deferred lighting resolve; `None` for forward pipelines.
    pub deferred_material: Option<Material>,
    pub screen_material: Material,
    pub ssao_material: Material,
    pub ssao_blur_material: Material,
    pub fxaa_material: Material,
    pub blur_material: Material,
    pub final_material: Material,
    /// Precomputed BRDF integration lookup for PBR shading.
    pub brdf_texture: Texture,
}
