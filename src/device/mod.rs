//! Graphics Device Abstraction
//!
//! The pipeline never talks to a graphics API through a global; every draw,
//! state change and resource allocation goes through an explicit
//! [`GraphicsDevice`] handle threaded down the call tree. Two backends ship
//! with the crate:
//!
//! - [`GlDevice`]: the OpenGL 3.3+ backend, built on `glow`.
//! - [`TraceDevice`]: a headless backend that records every issued command,
//!   used by the integration tests and available for debugging.
//!
//! State deduplication does not live here: backends issue exactly what they
//! are told. [`PipelineState`] wraps a device and filters redundant state
//! changes against its snapshot.

pub mod gl;
pub mod state;
pub mod trace;

pub use gl::GlDevice;
pub use state::PipelineState;
pub use trace::{Command, TraceDevice};

use bitflags::bitflags;
use glam::Vec4;

use crate::errors::Result;

// ─── Handles ──────────────────────────────────────────────────────────────────

macro_rules! handle_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        pub struct $name(pub u32);
    };
}

handle_type!(
    /// Off-screen framebuffer object handle.
    FramebufferId
);
handle_type!(
    /// GPU texture handle.
    TextureId
);
handle_type!(
    /// GPU buffer handle (uniform buffers).
    BufferId
);
handle_type!(
    /// Linked shader program handle.
    ProgramId
);
handle_type!(
    /// Vertex array handle carrying a mesh's buffer bindings.
    VertexArrayId
);

// ─── State Enums ──────────────────────────────────────────────────────────────

/// Depth/stencil comparison function.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Stencil buffer update operation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    Increment,
    IncrementWrap,
    Decrement,
    DecrementWrap,
    Invert,
}

/// Blend factor for source or destination color.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
}

/// Blend combining equation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BlendEquation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Which face side gets culled.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CullSide {
    Front,
    Back,
    FrontAndBack,
}

/// Front-face winding order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Winding {
    Clockwise,
    CounterClockwise,
}

// ─── Resource Enums ───────────────────────────────────────────────────────────

/// Texture bind target. Cube targets populate all six faces on allocation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TextureTarget {
    Texture2D,
    CubeMap,
}

/// Texel storage format. Backends map each variant to the matching
/// internal-format / data-layout / component-type triple.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TextureFormat {
    R8,
    R16F,
    Rg16F,
    Rgb16F,
    Rgb32F,
    Rgba8,
    Rgba16F,
    DepthComponent,
    Depth24Stencil8,
}

impl TextureFormat {
    /// Whether this format allocates a depth (or depth+stencil) plane.
    #[must_use]
    pub fn is_depth(self) -> bool {
        matches!(self, Self::DepthComponent | Self::Depth24Stencil8)
    }
}

/// Texture coordinate wrapping mode.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum WrapMode {
    ClampToEdge,
    ClampToBorder,
    Repeat,
}

/// Texture sampling filter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Primitive assembly mode for draws.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DrawMode {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

bitflags! {
    /// Buffer bit-planes selected by clears and blits.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct ClearFlags: u32 {
        const COLOR = 1;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

bitflags! {
    /// Attachment planes requested when building a frame resource.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct AttachmentFlags: u32 {
        const COLOR = 1;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

// ─── Uniform Values ───────────────────────────────────────────────────────────

/// A shader uniform value as a closed tagged union.
///
/// Array variants carry their element count in the payload length; matrix
/// variants carry an explicit transpose flag. Backends match on the variant
/// to issue the corresponding typed upload.
#[derive(Clone, PartialEq, Debug)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    UInt(u32),
    Float(f32),
    Double(f64),
    IntVec2([i32; 2]),
    IntVec3([i32; 3]),
    IntVec4([i32; 4]),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat3 {
        value: [f32; 9],
        transpose: bool,
    },
    Mat4 {
        value: [f32; 16],
        transpose: bool,
    },
    IntArray(Vec<i32>),
    FloatArray(Vec<f32>),
    Vec3Array(Vec<[f32; 3]>),
    Mat4Array {
        values: Vec<[f32; 16]>,
        transpose: bool,
    },
}

impl UniformValue {
    /// Element count: 1 for scalars/vectors/matrices, length for arrays.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::IntArray(v) => v.len(),
            Self::FloatArray(v) => v.len(),
            Self::Vec3Array(v) => v.len(),
            Self::Mat4Array { values, .. } => values.len(),
            _ => 1,
        }
    }

    /// Non-transposed matrix helper.
    #[must_use]
    pub fn mat4(value: glam::Mat4) -> Self {
        Self::Mat4 {
            value: value.to_cols_array(),
            transpose: false,
        }
    }

    /// Non-transposed matrix array helper.
    #[must_use]
    pub fn mat4_array(values: &[glam::Mat4]) -> Self {
        Self::Mat4Array {
            values: values.iter().map(glam::Mat4::to_cols_array).collect(),
            transpose: false,
        }
    }
}

/// Reflected shader uniform: array size, raw type tag and bind location as
/// reported by the backend at link time.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct UniformInfo {
    /// Array size (1 for non-arrays).
    pub size: i32,
    /// Backend type tag (e.g. `GL_FLOAT_MAT4` for the GL backend).
    pub type_tag: u32,
    /// Presence marker: non-negative when the backend resolved the name,
    /// -1 when the uniform was optimized out. The value itself is
    /// backend-defined; uniform writes resolve the real location by name.
    pub location: i32,
}

/// Texture allocation request. Cube targets allocate all six faces with the
/// same format and size.
#[derive(Clone, Copy, Debug)]
pub struct TextureDesc<'a> {
    pub target: TextureTarget,
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    pub wrap: WrapMode,
    pub filter: FilterMode,
    /// Sampled when `wrap` is [`WrapMode::ClampToBorder`].
    pub border_color: Vec4,
    /// Initial texel data; `None` leaves the storage unwritten.
    pub data: Option<&'a [u8]>,
}

// ─── Device Trait ─────────────────────────────────────────────────────────────

/// Raw command surface of a graphics backend.
///
/// Methods issue unconditionally. Redundant-state filtering is the job of
/// [`PipelineState`]; callers that bypass it forfeit deduplication.
pub trait GraphicsDevice {
    // pipeline state
    fn set_color_mask(&mut self, mask: bool);
    fn set_depth_test(&mut self, enable: bool);
    fn set_depth_func(&mut self, func: CompareFunc);
    fn set_depth_mask(&mut self, mask: bool);
    fn set_stencil_test(&mut self, enable: bool);
    fn set_stencil_func(&mut self, func: CompareFunc, reference: i32, mask: u32);
    fn set_stencil_op(&mut self, fail: StencilOp, zfail: StencilOp, zpass: StencilOp);
    fn set_stencil_mask(&mut self, mask: u32);
    fn set_blend(&mut self, enable: bool);
    fn set_blend_func(&mut self, src: BlendFactor, dst: BlendFactor);
    fn set_blend_equation(&mut self, equation: BlendEquation);
    fn set_blend_color(&mut self, color: Vec4);
    fn set_face_cull(&mut self, enable: bool);
    fn set_face_side(&mut self, side: CullSide);
    fn set_face_winding(&mut self, winding: Winding);
    fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32);

    // framebuffers
    fn create_framebuffer(&mut self) -> Result<FramebufferId>;
    /// `None` binds the presentation backbuffer.
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);
    fn bind_read_framebuffer(&mut self, framebuffer: Option<FramebufferId>);
    fn bind_draw_framebuffer(&mut self, framebuffer: Option<FramebufferId>);
    /// Attaches `texture` as color attachment `index` of the bound framebuffer.
    fn attach_color_texture(&mut self, index: u32, texture: TextureId, target: TextureTarget);
    /// Attaches `texture` as the depth (or combined depth+stencil) plane of
    /// the bound framebuffer.
    fn attach_depth_stencil_texture(
        &mut self,
        texture: TextureId,
        target: TextureTarget,
        stencil: bool,
    );
    /// Declares the first `count` color attachments as active draw buffers.
    fn set_draw_buffers(&mut self, count: u32);
    /// Disables color reads and writes on the bound framebuffer
    /// (depth-only targets).
    fn disable_color_buffers(&mut self);
    /// Selects color attachment `index` as both read and draw buffer for a
    /// region copy.
    fn select_copy_attachment(&mut self, index: u32);
    /// Completeness check of the bound framebuffer.
    fn framebuffer_complete(&mut self) -> bool;
    /// Copies a region between the bound read/draw framebuffers.
    /// Rects are `(x0, y0, x1, y1)`.
    fn blit(
        &mut self,
        src_rect: [i32; 4],
        dst_rect: [i32; 4],
        flags: ClearFlags,
        filter: FilterMode,
    );
    fn delete_framebuffer(&mut self, framebuffer: FramebufferId);

    // textures
    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureId>;
    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: Option<TextureId>);
    fn delete_texture(&mut self, texture: TextureId);

    // uniform buffers
    /// Allocates a uniform buffer of `size` bytes bound at block index
    /// `binding` for the lifetime of the buffer.
    fn create_uniform_buffer(&mut self, size: usize, binding: u32) -> Result<BufferId>;
    fn write_uniform_buffer(&mut self, buffer: BufferId, offset: usize, data: &[u8]);
    fn delete_buffer(&mut self, buffer: BufferId);

    // programs
    /// Compiles and links a program; errors carry `name` and the backend
    /// diagnostic.
    fn create_program(&mut self, name: &str, vertex_src: &str, fragment_src: &str)
    -> Result<ProgramId>;
    /// Reflects the active uniform table of a linked program.
    fn program_uniforms(&mut self, program: ProgramId) -> Vec<(String, UniformInfo)>;
    fn use_program(&mut self, program: Option<ProgramId>);
    /// Writes a uniform by name on `program`. Unknown names are ignored.
    fn set_uniform(&mut self, program: ProgramId, name: &str, value: &UniformValue);
    fn delete_program(&mut self, program: ProgramId);

    // geometry
    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>);
    fn draw_arrays(&mut self, mode: DrawMode, first: i32, count: i32);
    fn draw_elements(&mut self, mode: DrawMode, count: i32);
    fn draw_arrays_instanced(&mut self, mode: DrawMode, first: i32, count: i32, instances: i32);
    fn draw_elements_instanced(&mut self, mode: DrawMode, count: i32, instances: i32);

    // clears
    /// Clears the selected bit-planes of the bound framebuffer; `color` is
    /// the clear color when [`ClearFlags::COLOR`] is selected.
    fn clear(&mut self, color: Vec4, flags: ClearFlags);
}
