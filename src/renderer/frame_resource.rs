//! Off-Screen Render Targets
//!
//! A [`FrameResource`] is a framebuffer with zero or more independently
//! formatted color attachments and an optional combined depth(+stencil)
//! attachment, 2D or cube-mapped. Cameras own four of them (default,
//! geometry buffer, screen, final) and shadow-casting lights own one;
//! ownership is exclusive and release happens before the owner goes away.
//!
//! `build` either returns a complete, usable target or cleans up everything
//! it allocated and reports why. There is no half-built state to release.

use glam::Vec4;
use smallvec::SmallVec;

use crate::device::{
    AttachmentFlags, ClearFlags, FilterMode, FramebufferId, GraphicsDevice, TextureDesc,
    TextureFormat, TextureId, TextureTarget, WrapMode,
};
use crate::errors::{HarrierError, Result};

/// Build request for a [`FrameResource`].
#[derive(Clone, Debug)]
pub struct FrameResourceDesc {
    pub width: u32,
    pub height: u32,
    pub target: TextureTarget,
    pub wrap: WrapMode,
    pub filter: FilterMode,
    pub border_color: Vec4,
    pub attachments: AttachmentFlags,
    /// One color attachment per entry, in attachment-index order.
    pub color_formats: Vec<TextureFormat>,
}

impl FrameResourceDesc {
    /// 2D target with the given attachments, clamp-to-edge, white border.
    #[must_use]
    pub fn texture_2d(
        width: u32,
        height: u32,
        filter: FilterMode,
        attachments: AttachmentFlags,
        color_formats: Vec<TextureFormat>,
    ) -> Self {
        Self {
            width,
            height,
            target: TextureTarget::Texture2D,
            wrap: WrapMode::ClampToEdge,
            filter,
            border_color: Vec4::ONE,
            attachments,
            color_formats,
        }
    }
}

/// An owned off-screen render target.
#[derive(Debug)]
pub struct FrameResource {
    width: u32,
    height: u32,
    target: TextureTarget,
    framebuffer: Option<FramebufferId>,
    colors: SmallVec<[TextureId; 5]>,
    depth_stencil: Option<TextureId>,
    has_stencil: bool,
}

impl FrameResource {
    /// Allocates the framebuffer and its attachments.
    ///
    /// A stencil request without depth is rejected before anything is
    /// allocated. An incomplete target is a recoverable failure: everything
    /// allocated so far is freed and the error names the requested size.
    pub fn build<D: GraphicsDevice>(device: &mut D, desc: &FrameResourceDesc) -> Result<Self> {
        let wants_depth = desc.attachments.contains(AttachmentFlags::DEPTH);
        let wants_stencil = desc.attachments.contains(AttachmentFlags::STENCIL);
        if wants_stencil && !wants_depth {
            return Err(HarrierError::StencilWithoutDepth);
        }

        let framebuffer = device.create_framebuffer()?;
        device.bind_framebuffer(Some(framebuffer));

        let mut resource = Self {
            width: desc.width,
            height: desc.height,
            target: desc.target,
            framebuffer: Some(framebuffer),
            colors: SmallVec::new(),
            depth_stencil: None,
            has_stencil: wants_stencil,
        };

        let has_color = desc.attachments.contains(AttachmentFlags::COLOR);
        if has_color {
            for (index, &format) in desc.color_formats.iter().enumerate() {
                let texture = match Self::allocate(device, desc, format) {
                    Ok(texture) => texture,
                    Err(err) => {
                        resource.release(device);
                        return Err(err);
                    }
                };
                device.attach_color_texture(index as u32, texture, desc.target);
                resource.colors.push(texture);
            }
        }

        if wants_depth {
            let format = if wants_stencil {
                TextureFormat::Depth24Stencil8
            } else {
                TextureFormat::DepthComponent
            };
            let texture = match Self::allocate(device, desc, format) {
                Ok(texture) => texture,
                Err(err) => {
                    resource.release(device);
                    return Err(err);
                }
            };
            device.attach_depth_stencil_texture(texture, desc.target, wants_stencil);
            resource.depth_stencil = Some(texture);
        }

        // depth-only targets must not read or write color
        if resource.colors.is_empty() {
            device.disable_color_buffers();
        } else {
            device.set_draw_buffers(resource.colors.len() as u32);
        }

        let complete = device.framebuffer_complete();
        device.bind_framebuffer(None);
        if !complete {
            resource.release(device);
            return Err(HarrierError::FramebufferIncomplete {
                width: desc.width,
                height: desc.height,
            });
        }
        Ok(resource)
    }

    fn allocate<D: GraphicsDevice>(
        device: &mut D,
        desc: &FrameResourceDesc,
        format: TextureFormat,
    ) -> Result<TextureId> {
        device.create_texture(&TextureDesc {
            target: desc.target,
            format,
            width: desc.width,
            height: desc.height,
            wrap: desc.wrap,
            filter: desc.filter,
            border_color: desc.border_color,
            data: None,
        })
    }

    /// Binds the target for drawing and sets the viewport to its size.
    pub fn bind<D: GraphicsDevice>(&self, device: &mut D) {
        device.bind_framebuffer(self.framebuffer);
        device.set_viewport(0, 0, self.width as i32, self.height as i32);
    }

    /// Exposes color attachment `index` as a sampling input on `unit`.
    pub fn bind_color_texture<D: GraphicsDevice>(&self, device: &mut D, index: usize, unit: u32) {
        if let Some(&texture) = self.colors.get(index) {
            device.bind_texture(unit, self.target, Some(texture));
        }
    }

    /// Exposes the depth(+stencil) attachment as a sampling input on `unit`.
    pub fn bind_depth_stencil_texture<D: GraphicsDevice>(&self, device: &mut D, unit: u32) {
        if let Some(texture) = self.depth_stencil {
            device.bind_texture(unit, self.target, Some(texture));
        }
    }

    /// Clears the requested bit-planes of the (bound) target.
    pub fn clear<D: GraphicsDevice>(&self, device: &mut D, color: Vec4, flags: ClearFlags) {
        device.clear(color, flags);
    }

    /// Copies a region from `src` to `dst`. With color bits set, one copy is
    /// issued per color attachment present on the source; otherwise a single
    /// depth/stencil copy.
    pub fn blit<D: GraphicsDevice>(
        device: &mut D,
        src: &Self,
        dst: &Self,
        src_rect: [i32; 4],
        dst_rect: [i32; 4],
        flags: ClearFlags,
        filter: FilterMode,
    ) {
        device.bind_read_framebuffer(src.framebuffer);
        device.bind_draw_framebuffer(dst.framebuffer);

        if flags.contains(ClearFlags::COLOR) {
            for index in 0..src.colors.len() {
                device.select_copy_attachment(index as u32);
                device.blit(src_rect, dst_rect, flags, filter);
            }
        } else if flags.intersects(ClearFlags::DEPTH | ClearFlags::STENCIL) {
            device.blit(src_rect, dst_rect, flags, filter);
        }

        device.bind_read_framebuffer(None);
        device.bind_draw_framebuffer(None);
    }

    /// Frees every attachment and the framebuffer. Safe to call twice.
    pub fn release<D: GraphicsDevice>(&mut self, device: &mut D) {
        for texture in self.colors.drain(..) {
            device.delete_texture(texture);
        }
        if let Some(texture) = self.depth_stencil.take() {
            device.delete_texture(texture);
        }
        if let Some(framebuffer) = self.framebuffer.take() {
            device.delete_framebuffer(framebuffer);
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of color attachments.
    #[must_use]
    pub fn color_count(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn has_stencil(&self) -> bool {
        self.has_stencil
    }

    /// Whether the target is still live (not yet released).
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.framebuffer.is_some()
    }
}
