//! Error Types
//!
//! The main error type [`HarrierError`] covers the renderer's failure modes:
//! off-screen target construction, device resource creation and shader
//! compilation. All public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, HarrierError>`.
//!
//! Frame-resource failures are recoverable per resource: the owner logs the
//! error and proceeds without that buffer, and downstream passes degrade
//! silently. Shader compile/link failures surface during startup, before the
//! scene renders its first frame, and are treated as fatal by callers.

use thiserror::Error;

/// The main error type for the Harrier renderer.
#[derive(Error, Debug)]
pub enum HarrierError {
    /// A frame resource was requested with a stencil attachment but no
    /// depth attachment. The two share one combined texture; a separate
    /// stencil plane is not supported.
    #[error("Can't have separate stencil attachment")]
    StencilWithoutDepth,

    /// The device reported the framebuffer incomplete after all attachments
    /// were allocated. The partially built resource has been released.
    #[error("Framebuffer incomplete ({width}x{height})")]
    FramebufferIncomplete {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// The device failed to allocate a GPU object (framebuffer, texture,
    /// buffer or vertex array).
    #[error("Failed to create device resource: {0}")]
    ResourceCreation(String),

    /// A shader stage failed to compile.
    #[error("Failed to compile {stage} shader '{name}': {diagnostic}")]
    ShaderCompile {
        /// Shader name, as registered with the asset collaborator.
        name: String,
        /// Stage that failed ("vertex" or "fragment").
        stage: &'static str,
        /// Raw compiler diagnostic.
        diagnostic: String,
    },

    /// A shader program failed to link.
    #[error("Failed to link shader '{name}': {diagnostic}")]
    ShaderLink {
        /// Shader name, as registered with the asset collaborator.
        name: String,
        /// Raw linker diagnostic.
        diagnostic: String,
    },
}

/// Alias for `Result<T, HarrierError>`.
pub type Result<T> = std::result::Result<T, HarrierError>;
