//! Render Target Tests
//!
//! Tests for:
//! - FrameResource build: attachment layout, draw buffers, depth-only
//! - Build failures: stencil without depth, incomplete framebuffers
//! - Release idempotence
//! - Blit semantics: per-attachment color copies vs a single depth copy

use harrier::device::{AttachmentFlags, ClearFlags, Command, FilterMode, TextureFormat};
use harrier::{FrameResource, FrameResourceDesc, HarrierError, TraceDevice};

fn color_depth_desc(colors: Vec<TextureFormat>) -> FrameResourceDesc {
    FrameResourceDesc::texture_2d(
        256,
        128,
        FilterMode::Linear,
        AttachmentFlags::all(),
        colors,
    )
}

// ============================================================================
// Build
// ============================================================================

#[test]
fn build_attaches_each_color_format_in_order() {
    let mut device = TraceDevice::new();
    let desc = color_depth_desc(vec![TextureFormat::Rgba16F, TextureFormat::Rg16F]);
    let target = FrameResource::build(&mut device, &desc).unwrap();

    assert!(target.is_live());
    assert_eq!(target.color_count(), 2);
    assert_eq!((target.width(), target.height()), (256, 128));
    assert!(target.has_stencil());

    let attachments: Vec<u32> = device
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::AttachColorTexture(index, _) => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(attachments, vec![0, 1]);
    assert!(device.commands().contains(&Command::SetDrawBuffers(2)));
}

#[test]
fn depth_only_target_disables_color_buffers() {
    let mut device = TraceDevice::new();
    let desc = FrameResourceDesc::texture_2d(
        1024,
        1024,
        FilterMode::Nearest,
        AttachmentFlags::DEPTH,
        Vec::new(),
    );
    let target = FrameResource::build(&mut device, &desc).unwrap();

    assert_eq!(target.color_count(), 0);
    assert!(!target.has_stencil());
    assert!(device.commands().contains(&Command::DisableColorBuffers));
}

#[test]
fn stencil_without_depth_is_rejected_before_allocation() {
    let mut device = TraceDevice::new();
    let desc = FrameResourceDesc::texture_2d(
        64,
        64,
        FilterMode::Nearest,
        AttachmentFlags::COLOR | AttachmentFlags::STENCIL,
        vec![TextureFormat::Rgba8],
    );
    let err = FrameResource::build(&mut device, &desc).unwrap_err();

    assert!(matches!(err, HarrierError::StencilWithoutDepth));
    assert!(device.commands().is_empty(), "nothing should be allocated");
}

#[test]
fn incomplete_framebuffer_frees_everything_and_names_the_size() {
    let mut device = TraceDevice::new();
    device.fail_framebuffers(true);
    let desc = color_depth_desc(vec![TextureFormat::Rgba16F]);
    let err = FrameResource::build(&mut device, &desc).unwrap_err();

    assert!(matches!(
        err,
        HarrierError::FramebufferIncomplete {
            width: 256,
            height: 128
        }
    ));
    let created = device
        .commands()
        .iter()
        .filter(|c| matches!(c, Command::CreateTexture(..)))
        .count();
    let deleted = device
        .commands()
        .iter()
        .filter(|c| matches!(c, Command::DeleteTexture(_)))
        .count();
    assert_eq!(created, deleted, "every allocated texture is freed");
    assert!(
        device
            .commands()
            .iter()
            .any(|c| matches!(c, Command::DeleteFramebuffer(_)))
    );
}

// ============================================================================
// Release
// ============================================================================

#[test]
fn release_is_idempotent() {
    let mut device = TraceDevice::new();
    let desc = color_depth_desc(vec![TextureFormat::Rgba16F]);
    let mut target = FrameResource::build(&mut device, &desc).unwrap();

    device.clear_commands();
    target.release(&mut device);
    assert!(!target.is_live());
    let first_pass = device.commands().len();
    assert!(first_pass > 0);

    target.release(&mut device);
    assert_eq!(device.commands().len(), first_pass, "second release is a no-op");
}

// ============================================================================
// Blit
// ============================================================================

#[test]
fn color_blit_copies_every_source_attachment() {
    let mut device = TraceDevice::new();
    let desc = color_depth_desc(vec![TextureFormat::Rgba16F, TextureFormat::Rgba16F]);
    let src = FrameResource::build(&mut device, &desc).unwrap();
    let dst = FrameResource::build(&mut device, &desc).unwrap();

    device.clear_commands();
    let rect = [0, 0, 256, 128];
    FrameResource::blit(
        &mut device,
        &src,
        &dst,
        rect,
        rect,
        ClearFlags::COLOR,
        FilterMode::Linear,
    );

    assert_eq!(device.blit_count(), 2);
    let selected: Vec<u32> = device
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::SelectCopyAttachment(index) => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(selected, vec![0, 1]);
}

#[test]
fn depth_blit_is_a_single_copy() {
    let mut device = TraceDevice::new();
    let desc = color_depth_desc(vec![TextureFormat::Rgba16F, TextureFormat::Rgba16F]);
    let src = FrameResource::build(&mut device, &desc).unwrap();
    let dst = FrameResource::build(&mut device, &desc).unwrap();

    device.clear_commands();
    let rect = [0, 0, 256, 128];
    FrameResource::blit(
        &mut device,
        &src,
        &dst,
        rect,
        rect,
        ClearFlags::DEPTH,
        FilterMode::Nearest,
    );

    assert_eq!(device.blit_count(), 1);
}
