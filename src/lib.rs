#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod device;
pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;

pub use device::{GraphicsDevice, PipelineState, TraceDevice, UniformValue};
pub use errors::{HarrierError, Result};
pub use renderer::{
    FrameResource, FrameResourceDesc, LightingModel, PipelineKit, PipelineMode, RenderContext,
    RenderSettings, SceneRenderer,
};
pub use resources::{Material, MaterialKind, Mesh, RenderStates, Shader, Texture};
pub use scene::{
    Camera, CameraId, Light, LightId, LightKind, Projection, RenderScene, Renderable,
    RenderableId, ShadowMode,
};
