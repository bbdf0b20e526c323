//! OpenGL Backend
//!
//! [`GlDevice`] maps the [`GraphicsDevice`] surface onto an OpenGL 3.3+
//! context through `glow`. Crate handles are small integers mapped to the
//! native objects; uniform locations are resolved by name and cached per
//! program.

use glam::Vec4;
use glow::HasContext;
use rustc_hash::FxHashMap;

use super::{
    BlendEquation, BlendFactor, BufferId, ClearFlags, CompareFunc, CullSide, DrawMode, FilterMode,
    FramebufferId, GraphicsDevice, ProgramId, StencilOp, TextureDesc, TextureFormat, TextureId,
    TextureTarget, UniformInfo, UniformValue, VertexArrayId, Winding, WrapMode,
};
use crate::errors::{HarrierError, Result};

type GlFramebuffer = <glow::Context as HasContext>::Framebuffer;
type GlTexture = <glow::Context as HasContext>::Texture;
type GlBuffer = <glow::Context as HasContext>::Buffer;
type GlProgram = <glow::Context as HasContext>::Program;
type GlVertexArray = <glow::Context as HasContext>::VertexArray;
type GlUniformLocation = <glow::Context as HasContext>::UniformLocation;

/// OpenGL implementation of [`GraphicsDevice`].
pub struct GlDevice {
    gl: glow::Context,
    framebuffers: FxHashMap<u32, GlFramebuffer>,
    textures: FxHashMap<u32, GlTexture>,
    buffers: FxHashMap<u32, GlBuffer>,
    programs: FxHashMap<u32, GlProgram>,
    vertex_arrays: FxHashMap<u32, GlVertexArray>,
    uniform_locations: FxHashMap<(u32, String), Option<GlUniformLocation>>,
    current_program: Option<u32>,
    next_id: u32,
}

impl GlDevice {
    /// Wraps a loaded GL context. Seamless cube-map filtering is enabled
    /// up front: mipped radiance maps show face seams without it.
    #[must_use]
    pub fn new(gl: glow::Context) -> Self {
        unsafe {
            gl.enable(glow::TEXTURE_CUBE_MAP_SEAMLESS);
        }
        Self {
            gl,
            framebuffers: FxHashMap::default(),
            textures: FxHashMap::default(),
            buffers: FxHashMap::default(),
            programs: FxHashMap::default(),
            vertex_arrays: FxHashMap::default(),
            uniform_locations: FxHashMap::default(),
            current_program: None,
            next_id: 0,
        }
    }

    /// Raw context access.
    #[must_use]
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// Registers an externally created vertex array (the asset collaborator
    /// owns mesh buffers) and returns its crate handle.
    pub fn register_vertex_array(&mut self, vertex_array: GlVertexArray) -> VertexArrayId {
        let id = self.next_id();
        self.vertex_arrays.insert(id, vertex_array);
        VertexArrayId(id)
    }

    /// Registers an externally created texture and returns its crate handle.
    pub fn register_texture(&mut self, texture: GlTexture) -> TextureId {
        let id = self.next_id();
        self.textures.insert(id, texture);
        TextureId(id)
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn location(&mut self, program: ProgramId, name: &str) -> Option<GlUniformLocation> {
        if let Some(cached) = self.uniform_locations.get(&(program.0, name.to_owned())) {
            return cached.clone();
        }
        let native = self.programs.get(&program.0).copied();
        let location =
            native.and_then(|p| unsafe { self.gl.get_uniform_location(p, name) });
        self.uniform_locations
            .insert((program.0, name.to_owned()), location.clone());
        location
    }

    fn ensure_program(&mut self, program: ProgramId) {
        if self.current_program != Some(program.0) {
            self.use_program(Some(program));
        }
    }

    fn compile_stage(
        &self,
        name: &str,
        stage: &'static str,
        stage_type: u32,
        source: &str,
    ) -> Result<<glow::Context as HasContext>::Shader> {
        unsafe {
            let shader = self
                .gl
                .create_shader(stage_type)
                .map_err(HarrierError::ResourceCreation)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let diagnostic = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(HarrierError::ShaderCompile {
                    name: name.to_owned(),
                    stage,
                    diagnostic,
                });
            }
            Ok(shader)
        }
    }
}

fn compare_func(func: CompareFunc) -> u32 {
    match func {
        CompareFunc::Never => glow::NEVER,
        CompareFunc::Less => glow::LESS,
        CompareFunc::Equal => glow::EQUAL,
        CompareFunc::LessOrEqual => glow::LEQUAL,
        CompareFunc::Greater => glow::GREATER,
        CompareFunc::NotEqual => glow::NOTEQUAL,
        CompareFunc::GreaterOrEqual => glow::GEQUAL,
        CompareFunc::Always => glow::ALWAYS,
    }
}

fn stencil_op(op: StencilOp) -> u32 {
    match op {
        StencilOp::Keep => glow::KEEP,
        StencilOp::Zero => glow::ZERO,
        StencilOp::Replace => glow::REPLACE,
        StencilOp::Increment => glow::INCR,
        StencilOp::IncrementWrap => glow::INCR_WRAP,
        StencilOp::Decrement => glow::DECR,
        StencilOp::DecrementWrap => glow::DECR_WRAP,
        StencilOp::Invert => glow::INVERT,
    }
}

fn blend_factor(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcColor => glow::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
        BlendFactor::DstColor => glow::DST_COLOR,
        BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => glow::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
        BlendFactor::ConstantColor => glow::CONSTANT_COLOR,
        BlendFactor::OneMinusConstantColor => glow::ONE_MINUS_CONSTANT_COLOR,
    }
}

fn blend_equation(equation: BlendEquation) -> u32 {
    match equation {
        BlendEquation::Add => glow::FUNC_ADD,
        BlendEquation::Subtract => glow::FUNC_SUBTRACT,
        BlendEquation::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
        BlendEquation::Min => glow::MIN,
        BlendEquation::Max => glow::MAX,
    }
}

fn texture_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::Texture2D => glow::TEXTURE_2D,
        TextureTarget::CubeMap => glow::TEXTURE_CUBE_MAP,
    }
}

/// `(internal format, data layout, component type)` triple.
fn texture_format(format: TextureFormat) -> (i32, u32, u32) {
    match format {
        TextureFormat::R8 => (glow::R8 as i32, glow::RED, glow::UNSIGNED_BYTE),
        TextureFormat::R16F => (glow::R16F as i32, glow::RED, glow::HALF_FLOAT),
        TextureFormat::Rg16F => (glow::RG16F as i32, glow::RG, glow::HALF_FLOAT),
        TextureFormat::Rgb16F => (glow::RGB16F as i32, glow::RGB, glow::HALF_FLOAT),
        TextureFormat::Rgb32F => (glow::RGB32F as i32, glow::RGB, glow::FLOAT),
        TextureFormat::Rgba8 => (glow::RGBA8 as i32, glow::RGBA, glow::UNSIGNED_BYTE),
        TextureFormat::Rgba16F => (glow::RGBA16F as i32, glow::RGBA, glow::HALF_FLOAT),
        TextureFormat::DepthComponent => (
            glow::DEPTH_COMPONENT as i32,
            glow::DEPTH_COMPONENT,
            glow::FLOAT,
        ),
        TextureFormat::Depth24Stencil8 => (
            glow::DEPTH24_STENCIL8 as i32,
            glow::DEPTH_STENCIL,
            glow::UNSIGNED_INT_24_8,
        ),
    }
}

fn wrap_mode(wrap: WrapMode) -> i32 {
    match wrap {
        WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE as i32,
        WrapMode::ClampToBorder => glow::CLAMP_TO_BORDER as i32,
        WrapMode::Repeat => glow::REPEAT as i32,
    }
}

fn filter_mode(filter: FilterMode) -> u32 {
    match filter {
        FilterMode::Nearest => glow::NEAREST,
        FilterMode::Linear => glow::LINEAR,
    }
}

fn draw_mode(mode: DrawMode) -> u32 {
    match mode {
        DrawMode::Points => glow::POINTS,
        DrawMode::Lines => glow::LINES,
        DrawMode::LineStrip => glow::LINE_STRIP,
        DrawMode::Triangles => glow::TRIANGLES,
        DrawMode::TriangleStrip => glow::TRIANGLE_STRIP,
    }
}

fn clear_mask(flags: ClearFlags) -> u32 {
    let mut mask = 0;
    if flags.contains(ClearFlags::COLOR) {
        mask |= glow::COLOR_BUFFER_BIT;
    }
    if flags.contains(ClearFlags::DEPTH) {
        mask |= glow::DEPTH_BUFFER_BIT;
    }
    if flags.contains(ClearFlags::STENCIL) {
        mask |= glow::STENCIL_BUFFER_BIT;
    }
    mask
}

fn toggle(gl: &glow::Context, capability: u32, enable: bool) {
    unsafe {
        if enable {
            gl.enable(capability);
        } else {
            gl.disable(capability);
        }
    }
}

impl GraphicsDevice for GlDevice {
    fn set_color_mask(&mut self, mask: bool) {
        unsafe {
            self.gl.color_mask(mask, mask, mask, mask);
        }
    }

    fn set_depth_test(&mut self, enable: bool) {
        toggle(&self.gl, glow::DEPTH_TEST, enable);
    }

    fn set_depth_func(&mut self, func: CompareFunc) {
        unsafe {
            self.gl.depth_func(compare_func(func));
        }
    }

    fn set_depth_mask(&mut self, mask: bool) {
        unsafe {
            self.gl.depth_mask(mask);
        }
    }

    fn set_stencil_test(&mut self, enable: bool) {
        toggle(&self.gl, glow::STENCIL_TEST, enable);
    }

    fn set_stencil_func(&mut self, func: CompareFunc, reference: i32, mask: u32) {
        unsafe {
            self.gl.stencil_func(compare_func(func), reference, mask);
        }
    }

    fn set_stencil_op(&mut self, fail: StencilOp, zfail: StencilOp, zpass: StencilOp) {
        unsafe {
            self.gl
                .stencil_op(stencil_op(fail), stencil_op(zfail), stencil_op(zpass));
        }
    }

    fn set_stencil_mask(&mut self, mask: u32) {
        unsafe {
            self.gl.stencil_mask(mask);
        }
    }

    fn set_blend(&mut self, enable: bool) {
        toggle(&self.gl, glow::BLEND, enable);
    }

    fn set_blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        unsafe {
            self.gl.blend_func(blend_factor(src), blend_factor(dst));
        }
    }

    fn set_blend_equation(&mut self, equation: BlendEquation) {
        unsafe {
            self.gl.blend_equation(blend_equation(equation));
        }
    }

    fn set_blend_color(&mut self, color: Vec4) {
        unsafe {
            self.gl.blend_color(color.x, color.y, color.z, color.w);
        }
    }

    fn set_face_cull(&mut self, enable: bool) {
        toggle(&self.gl, glow::CULL_FACE, enable);
    }

    fn set_face_side(&mut self, side: CullSide) {
        unsafe {
            self.gl.cull_face(match side {
                CullSide::Front => glow::FRONT,
                CullSide::Back => glow::BACK,
                CullSide::FrontAndBack => glow::FRONT_AND_BACK,
            });
        }
    }

    fn set_face_winding(&mut self, winding: Winding) {
        unsafe {
            self.gl.front_face(match winding {
                Winding::Clockwise => glow::CW,
                Winding::CounterClockwise => glow::CCW,
            });
        }
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe {
            self.gl.viewport(x, y, width, height);
        }
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferId> {
        let native = unsafe {
            self.gl
                .create_framebuffer()
                .map_err(HarrierError::ResourceCreation)?
        };
        let id = self.next_id();
        self.framebuffers.insert(id, native);
        Ok(FramebufferId(id))
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        let native = framebuffer.and_then(|f| self.framebuffers.get(&f.0).copied());
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, native);
        }
    }

    fn bind_read_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        let native = framebuffer.and_then(|f| self.framebuffers.get(&f.0).copied());
        unsafe {
            self.gl.bind_framebuffer(glow::READ_FRAMEBUFFER, native);
        }
    }

    fn bind_draw_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        let native = framebuffer.and_then(|f| self.framebuffers.get(&f.0).copied());
        unsafe {
            self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, native);
        }
    }

    fn attach_color_texture(&mut self, index: u32, texture: TextureId, target: TextureTarget) {
        let Some(native) = self.textures.get(&texture.0).copied() else {
            return;
        };
        unsafe {
            match target {
                TextureTarget::Texture2D => self.gl.framebuffer_texture_2d(
                    glow::FRAMEBUFFER,
                    glow::COLOR_ATTACHMENT0 + index,
                    glow::TEXTURE_2D,
                    Some(native),
                    0,
                ),
                TextureTarget::CubeMap => self.gl.framebuffer_texture(
                    glow::FRAMEBUFFER,
                    glow::COLOR_ATTACHMENT0 + index,
                    Some(native),
                    0,
                ),
            }
        }
    }

    fn attach_depth_stencil_texture(
        &mut self,
        texture: TextureId,
        target: TextureTarget,
        stencil: bool,
    ) {
        let Some(native) = self.textures.get(&texture.0).copied() else {
            return;
        };
        let attachment = if stencil {
            glow::DEPTH_STENCIL_ATTACHMENT
        } else {
            glow::DEPTH_ATTACHMENT
        };
        unsafe {
            match target {
                TextureTarget::Texture2D => self.gl.framebuffer_texture_2d(
                    glow::FRAMEBUFFER,
                    attachment,
                    glow::TEXTURE_2D,
                    Some(native),
                    0,
                ),
                TextureTarget::CubeMap => {
                    self.gl
                        .framebuffer_texture(glow::FRAMEBUFFER, attachment, Some(native), 0);
                }
            }
        }
    }

    fn set_draw_buffers(&mut self, count: u32) {
        let buffers: Vec<u32> = (0..count).map(|i| glow::COLOR_ATTACHMENT0 + i).collect();
        unsafe {
            self.gl.draw_buffers(&buffers);
        }
    }

    fn disable_color_buffers(&mut self) {
        unsafe {
            self.gl.read_buffer(glow::NONE);
            self.gl.draw_buffers(&[glow::NONE]);
        }
    }

    fn select_copy_attachment(&mut self, index: u32) {
        unsafe {
            self.gl.read_buffer(glow::COLOR_ATTACHMENT0 + index);
            self.gl.draw_buffers(&[glow::COLOR_ATTACHMENT0 + index]);
        }
    }

    fn framebuffer_complete(&mut self) -> bool {
        unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) == glow::FRAMEBUFFER_COMPLETE }
    }

    fn blit(
        &mut self,
        src_rect: [i32; 4],
        dst_rect: [i32; 4],
        flags: ClearFlags,
        filter: FilterMode,
    ) {
        unsafe {
            self.gl.blit_framebuffer(
                src_rect[0],
                src_rect[1],
                src_rect[2],
                src_rect[3],
                dst_rect[0],
                dst_rect[1],
                dst_rect[2],
                dst_rect[3],
                clear_mask(flags),
                filter_mode(filter),
            );
        }
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        if let Some(native) = self.framebuffers.remove(&framebuffer.0) {
            unsafe {
                self.gl.delete_framebuffer(native);
            }
        }
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureId> {
        let native = unsafe {
            self.gl
                .create_texture()
                .map_err(HarrierError::ResourceCreation)?
        };
        let target = texture_target(desc.target);
        let (internal, layout, component) = texture_format(desc.format);
        let filter = filter_mode(desc.filter) as i32;
        let wrap = wrap_mode(desc.wrap);
        unsafe {
            self.gl.bind_texture(target, Some(native));
            self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_S, wrap);
            self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_T, wrap);
            if desc.target == TextureTarget::CubeMap {
                self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_R, wrap);
            }
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, filter);
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, filter);
            if desc.wrap == WrapMode::ClampToBorder {
                self.gl.tex_parameter_f32_slice(
                    target,
                    glow::TEXTURE_BORDER_COLOR,
                    &desc.border_color.to_array(),
                );
            }
            match desc.target {
                TextureTarget::Texture2D => {
                    self.gl.tex_image_2d(
                        target,
                        0,
                        internal,
                        desc.width as i32,
                        desc.height as i32,
                        0,
                        layout,
                        component,
                        desc.data,
                    );
                }
                TextureTarget::CubeMap => {
                    for face in 0..6 {
                        self.gl.tex_image_2d(
                            glow::TEXTURE_CUBE_MAP_POSITIVE_X + face,
                            0,
                            internal,
                            desc.width as i32,
                            desc.height as i32,
                            0,
                            layout,
                            component,
                            desc.data,
                        );
                    }
                }
            }
            self.gl.bind_texture(target, None);
        }
        let id = self.next_id();
        self.textures.insert(id, native);
        Ok(TextureId(id))
    }

    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: Option<TextureId>) {
        let native = texture.and_then(|t| self.textures.get(&t.0).copied());
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(texture_target(target), native);
        }
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if let Some(native) = self.textures.remove(&texture.0) {
            unsafe {
                self.gl.delete_texture(native);
            }
        }
    }

    fn create_uniform_buffer(&mut self, size: usize, binding: u32) -> Result<BufferId> {
        let native = unsafe {
            self.gl
                .create_buffer()
                .map_err(HarrierError::ResourceCreation)?
        };
        unsafe {
            self.gl.bind_buffer(glow::UNIFORM_BUFFER, Some(native));
            self.gl
                .buffer_data_size(glow::UNIFORM_BUFFER, size as i32, glow::DYNAMIC_DRAW);
            self.gl.bind_buffer(glow::UNIFORM_BUFFER, None);
            self.gl
                .bind_buffer_base(glow::UNIFORM_BUFFER, binding, Some(native));
        }
        let id = self.next_id();
        self.buffers.insert(id, native);
        Ok(BufferId(id))
    }

    fn write_uniform_buffer(&mut self, buffer: BufferId, offset: usize, data: &[u8]) {
        let Some(native) = self.buffers.get(&buffer.0).copied() else {
            return;
        };
        unsafe {
            self.gl.bind_buffer(glow::UNIFORM_BUFFER, Some(native));
            self.gl
                .buffer_sub_data_u8_slice(glow::UNIFORM_BUFFER, offset as i32, data);
            self.gl.bind_buffer(glow::UNIFORM_BUFFER, None);
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(native) = self.buffers.remove(&buffer.0) {
            unsafe {
                self.gl.delete_buffer(native);
            }
        }
    }

    fn create_program(
        &mut self,
        name: &str,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramId> {
        let vertex = self.compile_stage(name, "vertex", glow::VERTEX_SHADER, vertex_src)?;
        let fragment =
            match self.compile_stage(name, "fragment", glow::FRAGMENT_SHADER, fragment_src) {
                Ok(fragment) => fragment,
                Err(err) => {
                    unsafe {
                        self.gl.delete_shader(vertex);
                    }
                    return Err(err);
                }
            };
        unsafe {
            let program = self
                .gl
                .create_program()
                .map_err(HarrierError::ResourceCreation)?;
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            self.gl.link_program(program);
            self.gl.detach_shader(program, vertex);
            self.gl.detach_shader(program, fragment);
            self.gl.delete_shader(vertex);
            self.gl.delete_shader(fragment);
            if !self.gl.get_program_link_status(program) {
                let diagnostic = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(HarrierError::ShaderLink {
                    name: name.to_owned(),
                    diagnostic,
                });
            }
            let id = self.next_id();
            self.programs.insert(id, program);
            Ok(ProgramId(id))
        }
    }

    fn program_uniforms(&mut self, program: ProgramId) -> Vec<(String, UniformInfo)> {
        let Some(native) = self.programs.get(&program.0).copied() else {
            return Vec::new();
        };
        let count = unsafe { self.gl.get_active_uniforms(native) };
        let mut uniforms = Vec::with_capacity(count as usize);
        for index in 0..count {
            let Some(active) = (unsafe { self.gl.get_active_uniform(native, index) }) else {
                continue;
            };
            // reflection reports arrays as "name[0]"
            let name = active
                .name
                .strip_suffix("[0]")
                .unwrap_or(&active.name)
                .to_owned();
            let location = unsafe { self.gl.get_uniform_location(native, &name) };
            let info = UniformInfo {
                size: active.size,
                type_tag: active.utype,
                // presence marker only; writes look the location up by name
                location: if location.is_some() { index as i32 } else { -1 },
            };
            self.uniform_locations
                .insert((program.0, name.clone()), location);
            uniforms.push((name, info));
        }
        uniforms
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        let native = program.and_then(|p| self.programs.get(&p.0).copied());
        self.current_program = program.map(|p| p.0);
        unsafe {
            self.gl.use_program(native);
        }
    }

    fn set_uniform(&mut self, program: ProgramId, name: &str, value: &UniformValue) {
        let Some(location) = self.location(program, name) else {
            return;
        };
        self.ensure_program(program);
        let gl = &self.gl;
        let loc = Some(&location);
        unsafe {
            match value {
                UniformValue::Bool(v) => gl.uniform_1_i32(loc, i32::from(*v)),
                UniformValue::Int(v) => gl.uniform_1_i32(loc, *v),
                UniformValue::UInt(v) => gl.uniform_1_u32(loc, *v),
                UniformValue::Float(v) => gl.uniform_1_f32(loc, *v),
                // core-profile GL has no f64 uniforms below 4.0
                UniformValue::Double(v) => gl.uniform_1_f32(loc, *v as f32),
                UniformValue::IntVec2(v) => gl.uniform_2_i32(loc, v[0], v[1]),
                UniformValue::IntVec3(v) => gl.uniform_3_i32(loc, v[0], v[1], v[2]),
                UniformValue::IntVec4(v) => gl.uniform_4_i32(loc, v[0], v[1], v[2], v[3]),
                UniformValue::Vec2(v) => gl.uniform_2_f32(loc, v[0], v[1]),
                UniformValue::Vec3(v) => gl.uniform_3_f32(loc, v[0], v[1], v[2]),
                UniformValue::Vec4(v) => gl.uniform_4_f32(loc, v[0], v[1], v[2], v[3]),
                UniformValue::Mat3 { value, transpose } => {
                    gl.uniform_matrix_3_f32_slice(loc, *transpose, value);
                }
                UniformValue::Mat4 { value, transpose } => {
                    gl.uniform_matrix_4_f32_slice(loc, *transpose, value);
                }
                UniformValue::IntArray(v) => gl.uniform_1_i32_slice(loc, v),
                UniformValue::FloatArray(v) => gl.uniform_1_f32_slice(loc, v),
                UniformValue::Vec3Array(v) => {
                    gl.uniform_3_f32_slice(loc, bytemuck::cast_slice(v));
                }
                UniformValue::Mat4Array { values, transpose } => {
                    gl.uniform_matrix_4_f32_slice(loc, *transpose, bytemuck::cast_slice(values));
                }
            }
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        if let Some(native) = self.programs.remove(&program.0) {
            unsafe {
                self.gl.delete_program(native);
            }
        }
        self.uniform_locations.retain(|(p, _), _| *p != program.0);
        if self.current_program == Some(program.0) {
            self.current_program = None;
        }
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        let native = vertex_array.and_then(|v| self.vertex_arrays.get(&v.0).copied());
        unsafe {
            self.gl.bind_vertex_array(native);
        }
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: i32, count: i32) {
        unsafe {
            self.gl.draw_arrays(draw_mode(mode), first, count);
        }
    }

    fn draw_elements(&mut self, mode: DrawMode, count: i32) {
        unsafe {
            self.gl
                .draw_elements(draw_mode(mode), count, glow::UNSIGNED_INT, 0);
        }
    }

    fn draw_arrays_instanced(&mut self, mode: DrawMode, first: i32, count: i32, instances: i32) {
        unsafe {
            self.gl
                .draw_arrays_instanced(draw_mode(mode), first, count, instances);
        }
    }

    fn draw_elements_instanced(&mut self, mode: DrawMode, count: i32, instances: i32) {
        unsafe {
            self.gl.draw_elements_instanced(
                draw_mode(mode),
                count,
                glow::UNSIGNED_INT,
                0,
                instances,
            );
        }
    }

    fn clear(&mut self, color: Vec4, flags: ClearFlags) {
        unsafe {
            if flags.contains(ClearFlags::COLOR) {
                self.gl.clear_color(color.x, color.y, color.z, color.w);
            }
            self.gl.clear(clear_mask(flags));
        }
    }
}
