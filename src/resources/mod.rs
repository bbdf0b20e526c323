//! Asset Handles
//!
//! GPU-side handles supplied by the asset collaborator: compiled shaders
//! with their reflected uniform tables, textures, meshes and the materials
//! that tie them together. Loading and parsing happen elsewhere; the
//! pipeline only consumes compiled handles.

pub mod material;
pub mod mesh;
pub mod shader;
pub mod texture;

pub use material::{Material, MaterialKind, RenderStates};
pub use mesh::Mesh;
pub use shader::Shader;
pub use texture::Texture;
