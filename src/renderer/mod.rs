//! Rendering Pipeline
//!
//! The frame pipeline over a [`GraphicsDevice`](crate::device::GraphicsDevice):
//! shadow maps, the forward or deferred geometry stage, the deferred
//! lighting resolve, transparency and the post-process chain, all driven by
//! [`SceneRenderer`] through an explicit [`RenderContext`].

pub mod context;
pub mod frame_resource;
pub mod passes;
pub mod scene_renderer;
pub mod uniforms;

pub use context::{
    FORWARD_BRDF_UNIT, FORWARD_IRRADIANCE_UNIT, FORWARD_RADIANCE_UNIT, LightingModel,
    PipelineMode, RenderContext, RenderSettings, SHADOW_UNIT_BASE,
};
pub use frame_resource::{FrameResource, FrameResourceDesc};
pub use passes::PipelineKit;
pub use scene_renderer::SceneRenderer;
