//! Trace Backend
//!
//! [`TraceDevice`] implements [`GraphicsDevice`] without a GPU: every call
//! is appended to a command log that tests and tools can inspect. Handles
//! are sequential, programs reflect an empty uniform table, and
//! framebuffers report complete unless completeness failure is injected
//! with [`fail_framebuffers`](TraceDevice::fail_framebuffers).

use glam::Vec4;

use super::{
    BlendEquation, BlendFactor, BufferId, ClearFlags, CompareFunc, CullSide, DrawMode, FilterMode,
    FramebufferId, GraphicsDevice, ProgramId, StencilOp, TextureDesc, TextureId, TextureTarget,
    UniformInfo, UniformValue, VertexArrayId, Winding,
};
use crate::errors::Result;

/// One recorded device command.
#[derive(Clone, PartialEq, Debug)]
pub enum Command {
    ColorMask(bool),
    DepthTest(bool),
    DepthFunc(CompareFunc),
    DepthMask(bool),
    StencilTest(bool),
    StencilFunc(CompareFunc, i32, u32),
    StencilOp(StencilOp, StencilOp, StencilOp),
    StencilMask(u32),
    Blend(bool),
    BlendFunc(BlendFactor, BlendFactor),
    BlendEquation(BlendEquation),
    BlendColor(Vec4),
    FaceCull(bool),
    FaceSide(CullSide),
    FaceWinding(Winding),
    Viewport(i32, i32, i32, i32),
    BindFramebuffer(Option<FramebufferId>),
    BindReadFramebuffer(Option<FramebufferId>),
    BindDrawFramebuffer(Option<FramebufferId>),
    AttachColorTexture(u32, TextureId),
    AttachDepthStencilTexture(TextureId, bool),
    SetDrawBuffers(u32),
    DisableColorBuffers,
    SelectCopyAttachment(u32),
    Blit([i32; 4], [i32; 4], ClearFlags, FilterMode),
    DeleteFramebuffer(FramebufferId),
    CreateTexture(TextureId, TextureTarget),
    BindTexture(u32, TextureTarget, Option<TextureId>),
    DeleteTexture(TextureId),
    CreateUniformBuffer(BufferId, usize, u32),
    WriteUniformBuffer(BufferId, usize, usize),
    DeleteBuffer(BufferId),
    CreateProgram(ProgramId, String),
    UseProgram(Option<ProgramId>),
    SetUniform(ProgramId, String, UniformValue),
    DeleteProgram(ProgramId),
    BindVertexArray(Option<VertexArrayId>),
    Draw {
        vertex_array: Option<VertexArrayId>,
        mode: DrawMode,
        count: i32,
        indexed: bool,
        instances: i32,
    },
    Clear(Vec4, ClearFlags),
}

impl Command {
    /// Whether this command is a raw pipeline state change.
    #[must_use]
    pub fn is_state_change(&self) -> bool {
        matches!(
            self,
            Self::ColorMask(_)
                | Self::DepthTest(_)
                | Self::DepthFunc(_)
                | Self::DepthMask(_)
                | Self::StencilTest(_)
                | Self::StencilFunc(..)
                | Self::StencilOp(..)
                | Self::StencilMask(_)
                | Self::Blend(_)
                | Self::BlendFunc(..)
                | Self::BlendEquation(_)
                | Self::BlendColor(_)
                | Self::FaceCull(_)
                | Self::FaceSide(_)
                | Self::FaceWinding(_)
        )
    }

    /// Whether this command rasterizes geometry.
    #[must_use]
    pub fn is_draw(&self) -> bool {
        matches!(self, Self::Draw { .. })
    }
}

/// Headless command-recording backend.
#[derive(Default)]
pub struct TraceDevice {
    commands: Vec<Command>,
    next_id: u32,
    bound_vertex_array: Option<VertexArrayId>,
    fail_framebuffers: bool,
}

impl TraceDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command issued so far, in order.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Clears the log; handle counters keep running.
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of raw state changes issued.
    #[must_use]
    pub fn state_changes(&self) -> usize {
        self.commands.iter().filter(|c| c.is_state_change()).count()
    }

    /// Number of draw calls issued.
    #[must_use]
    pub fn draw_calls(&self) -> usize {
        self.commands.iter().filter(|c| c.is_draw()).count()
    }

    /// Vertex arrays of all draws, in issue order.
    #[must_use]
    pub fn draw_order(&self) -> Vec<Option<VertexArrayId>> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Draw { vertex_array, .. } => Some(*vertex_array),
                _ => None,
            })
            .collect()
    }

    /// Number of blit region copies issued.
    #[must_use]
    pub fn blit_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Blit(..)))
            .count()
    }

    /// When set, subsequent framebuffer completeness checks fail.
    pub fn fail_framebuffers(&mut self, fail: bool) {
        self.fail_framebuffers = fail;
    }

    /// Allocates a vertex array handle for feeding test meshes.
    pub fn create_vertex_array(&mut self) -> VertexArrayId {
        VertexArrayId(self.next_id())
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn push(&mut self, command: Command) {
        self.commands.push(command);
    }
}

impl GraphicsDevice for TraceDevice {
    fn set_color_mask(&mut self, mask: bool) {
        self.push(Command::ColorMask(mask));
    }

    fn set_depth_test(&mut self, enable: bool) {
        self.push(Command::DepthTest(enable));
    }

    fn set_depth_func(&mut self, func: CompareFunc) {
        self.push(Command::DepthFunc(func));
    }

    fn set_depth_mask(&mut self, mask: bool) {
        self.push(Command::DepthMask(mask));
    }

    fn set_stencil_test(&mut self, enable: bool) {
        self.push(Command::StencilTest(enable));
    }

    fn set_stencil_func(&mut self, func: CompareFunc, reference: i32, mask: u32) {
        self.push(Command::StencilFunc(func, reference, mask));
    }

    fn set_stencil_op(&mut self, fail: StencilOp, zfail: StencilOp, zpass: StencilOp) {
        self.push(Command::StencilOp(fail, zfail, zpass));
    }

    fn set_stencil_mask(&mut self, mask: u32) {
        self.push(Command::StencilMask(mask));
    }

    fn set_blend(&mut self, enable: bool) {
        self.push(Command::Blend(enable));
    }

    fn set_blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.push(Command::BlendFunc(src, dst));
    }

    fn set_blend_equation(&mut self, equation: BlendEquation) {
        self.push(Command::BlendEquation(equation));
    }

    fn set_blend_color(&mut self, color: Vec4) {
        self.push(Command::BlendColor(color));
    }

    fn set_face_cull(&mut self, enable: bool) {
        self.push(Command::FaceCull(enable));
    }

    fn set_face_side(&mut self, side: CullSide) {
        self.push(Command::FaceSide(side));
    }

    fn set_face_winding(&mut self, winding: Winding) {
        self.push(Command::FaceWinding(winding));
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.push(Command::Viewport(x, y, width, height));
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferId> {
        Ok(FramebufferId(self.next_id()))
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.push(Command::BindFramebuffer(framebuffer));
    }

    fn bind_read_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.push(Command::BindReadFramebuffer(framebuffer));
    }

    fn bind_draw_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.push(Command::BindDrawFramebuffer(framebuffer));
    }

    fn attach_color_texture(&mut self, index: u32, texture: TextureId, _target: TextureTarget) {
        self.push(Command::AttachColorTexture(index, texture));
    }

    fn attach_depth_stencil_texture(
        &mut self,
        texture: TextureId,
        _target: TextureTarget,
        stencil: bool,
    ) {
        self.push(Command::AttachDepthStencilTexture(texture, stencil));
    }

    fn set_draw_buffers(&mut self, count: u32) {
        self.push(Command::SetDrawBuffers(count));
    }

    fn disable_color_buffers(&mut self) {
        self.push(Command::DisableColorBuffers);
    }

    fn select_copy_attachment(&mut self, index: u32) {
        self.push(Command::SelectCopyAttachment(index));
    }

    fn framebuffer_complete(&mut self) -> bool {
        !self.fail_framebuffers
    }

    fn blit(
        &mut self,
        src_rect: [i32; 4],
        dst_rect: [i32; 4],
        flags: ClearFlags,
        filter: FilterMode,
    ) {
        self.push(Command::Blit(src_rect, dst_rect, flags, filter));
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.push(Command::DeleteFramebuffer(framebuffer));
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureId> {
        let id = TextureId(self.next_id());
        self.push(Command::CreateTexture(id, desc.target));
        Ok(id)
    }

    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: Option<TextureId>) {
        self.push(Command::BindTexture(unit, target, texture));
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.push(Command::DeleteTexture(texture));
    }

    fn create_uniform_buffer(&mut self, size: usize, binding: u32) -> Result<BufferId> {
        let id = BufferId(self.next_id());
        self.push(Command::CreateUniformBuffer(id, size, binding));
        Ok(id)
    }

    fn write_uniform_buffer(&mut self, buffer: BufferId, offset: usize, data: &[u8]) {
        self.push(Command::WriteUniformBuffer(buffer, offset, data.len()));
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.push(Command::DeleteBuffer(buffer));
    }

    fn create_program(
        &mut self,
        name: &str,
        _vertex_src: &str,
        _fragment_src: &str,
    ) -> Result<ProgramId> {
        let id = ProgramId(self.next_id());
        self.push(Command::CreateProgram(id, name.to_owned()));
        Ok(id)
    }

    fn program_uniforms(&mut self, _program: ProgramId) -> Vec<(String, UniformInfo)> {
        Vec::new()
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.push(Command::UseProgram(program));
    }

    fn set_uniform(&mut self, program: ProgramId, name: &str, value: &UniformValue) {
        self.push(Command::SetUniform(program, name.to_owned(), value.clone()));
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.push(Command::DeleteProgram(program));
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        self.bound_vertex_array = vertex_array;
        self.push(Command::BindVertexArray(vertex_array));
    }

    fn draw_arrays(&mut self, mode: DrawMode, _first: i32, count: i32) {
        self.push(Command::Draw {
            vertex_array: self.bound_vertex_array,
            mode,
            count,
            indexed: false,
            instances: 0,
        });
    }

    fn draw_elements(&mut self, mode: DrawMode, count: i32) {
        self.push(Command::Draw {
            vertex_array: self.bound_vertex_array,
            mode,
            count,
            indexed: true,
            instances: 0,
        });
    }

    fn draw_arrays_instanced(&mut self, mode: DrawMode, _first: i32, count: i32, instances: i32) {
        self.push(Command::Draw {
            vertex_array: self.bound_vertex_array,
            mode,
            count,
            indexed: false,
            instances,
        });
    }

    fn draw_elements_instanced(&mut self, mode: DrawMode, count: i32, instances: i32) {
        self.push(Command::Draw {
            vertex_array: self.bound_vertex_array,
            mode,
            count,
            indexed: true,
            instances,
        });
    }

    fn clear(&mut self, color: Vec4, flags: ClearFlags) {
        self.push(Command::Clear(color, flags));
    }
}
