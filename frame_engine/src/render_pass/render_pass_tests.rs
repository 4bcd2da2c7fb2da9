//! Unit tests for RenderPass

use std::sync::atomic::Ordering;

use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::{SampleCount, TextureFormat};
use crate::render_pass::{
    AttachmentDescriptor, AttachmentKind, AttachmentRef, CompileOptions,
    RenderPass, SubpassDescriptor,
};

fn options() -> CompileOptions {
    CompileOptions { default_format: TextureFormat::B8G8R8A8_SRGB, depth_sampling: false }
}

#[test]
fn test_render_pass_hands_compiled_tables_to_device() {
    let device = MockGraphicsDevice::new();
    let attachments = [
        AttachmentDescriptor::presentable(TextureFormat::B8G8R8A8_SRGB),
        AttachmentDescriptor::depth(TextureFormat::D32_FLOAT),
    ];
    let subpasses = [SubpassDescriptor::new(SampleCount::S4)
        .with_color(AttachmentRef::color(0))
        .with_depth_stencil(AttachmentRef::depth(1))];

    let pass = RenderPass::new(&device, &attachments, &subpasses, options()).unwrap();

    let created = device.state.render_pass_descs.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(&created[0], pass.desc());
    assert_eq!(pass.handle().attachment_count(), 3);
    assert_eq!(pass.attachment_kind(2), AttachmentKind::Resolve { source: 0 });
    assert_eq!(pass.subpass_samples(0), SampleCount::S4);
    assert_eq!(pass.subpass_samples(7), SampleCount::S1);
}

#[test]
fn test_presentable_attachments() {
    let device = MockGraphicsDevice::new();
    let attachments = [
        AttachmentDescriptor::presentable(TextureFormat::B8G8R8A8_SRGB),
        AttachmentDescriptor::depth(TextureFormat::D32_FLOAT),
    ];
    let single = [SubpassDescriptor::new(SampleCount::S1)
        .with_color(AttachmentRef::color(0))
        .with_depth_stencil(AttachmentRef::depth(1))];
    let pass = RenderPass::new(&device, &attachments, &single, options()).unwrap();
    assert!(pass.is_presentable(0));
    assert!(!pass.is_presentable(1));

    let msaa = [SubpassDescriptor::new(SampleCount::S2)
        .with_color(AttachmentRef::color(0))
        .with_depth_stencil(AttachmentRef::depth(1))];
    let pass = RenderPass::new(&device, &attachments, &msaa, options()).unwrap();
    assert!(!pass.is_presentable(0));
    assert!(pass.is_presentable(2));
}

#[test]
fn test_default_pass_through_device() {
    let device = MockGraphicsDevice::new();
    let pass = RenderPass::new(&device, &[], &[], options()).unwrap();
    assert_eq!(pass.attachment_count(), 1);
    assert_eq!(pass.subpasses().len(), 1);
    assert!(pass.dependencies().is_empty());
    assert_eq!(device.state.count(&device.state.textures_alive), 0);
    assert_eq!(device.state.framebuffers_alive.load(Ordering::SeqCst), 0);
}
