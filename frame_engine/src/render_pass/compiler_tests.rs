//! Unit tests for the render pass compiler

use crate::graphics_device::{
    AccessFlags, ImageLayout, LoadOp, PipelineStages, SampleCount, StoreOp,
    TextureFormat, TextureUsage,
};
use crate::render_pass::{
    compile_render_pass, AttachmentDescriptor, AttachmentKind, AttachmentRef,
    CompileOptions, SubpassDescriptor,
};

fn options() -> CompileOptions {
    CompileOptions {
        default_format: TextureFormat::B8G8R8A8_SRGB,
        depth_sampling: false,
    }
}

fn color_depth_pass(samples: SampleCount) -> (Vec<AttachmentDescriptor>, Vec<SubpassDescriptor>) {
    let attachments = vec![
        AttachmentDescriptor::presentable(TextureFormat::B8G8R8A8_SRGB),
        AttachmentDescriptor::depth(TextureFormat::D32_FLOAT),
    ];
    let subpasses = vec![
        SubpassDescriptor::new(samples)
            .with_color(AttachmentRef::color(0))
            .with_depth_stencil(AttachmentRef::depth(1)),
    ];
    (attachments, subpasses)
}

// ============================================================================
// DEFAULT PASS
// ============================================================================

#[test]
fn test_empty_inputs_produce_default_output_pass() {
    let compiled = compile_render_pass(&[], &[], &options());
    let desc = &compiled.desc;

    assert_eq!(desc.attachments.len(), 1);
    let output = &desc.attachments[0];
    assert_eq!(output.format, TextureFormat::B8G8R8A8_SRGB);
    assert_eq!(output.load_op, LoadOp::Clear);
    assert_eq!(output.store_op, StoreOp::Store);
    assert_eq!(output.final_layout, ImageLayout::PresentSrc);
    assert_eq!(output.samples, SampleCount::S1);

    assert_eq!(desc.subpasses.len(), 1);
    assert_eq!(desc.subpasses[0].color_attachments.len(), 1);
    assert_eq!(desc.subpasses[0].color_attachments[0].attachment, 0);
    assert!(desc.subpasses[0].resolve_attachments.is_empty());
    assert!(desc.dependencies.is_empty());
}

#[test]
fn test_default_pass_uses_requested_format() {
    let opts = CompileOptions { default_format: TextureFormat::R8G8B8A8_UNORM, ..options() };
    let compiled = compile_render_pass(&[], &[], &opts);
    assert_eq!(compiled.desc.attachments[0].format, TextureFormat::R8G8B8A8_UNORM);
}

// ============================================================================
// MULTISAMPLE RESOLVE
// ============================================================================

#[test]
fn test_msaa_color_and_depth_single_subpass() {
    let (attachments, subpasses) = color_depth_pass(SampleCount::S4);
    let compiled = compile_render_pass(&attachments, &subpasses, &options());
    let desc = &compiled.desc;

    // color, depth, synthesized resolve
    assert_eq!(desc.attachments.len(), 3);
    let subpass = &desc.subpasses[0];
    assert_eq!(subpass.color_attachments.len(), 1);
    assert!(subpass.depth_stencil_attachment.is_some());
    assert_eq!(subpass.resolve_attachments.len(), 1);
    assert_eq!(subpass.resolve_attachments[0].attachment, 2);

    // Samples propagated from the subpass
    assert_eq!(desc.attachments[0].samples, SampleCount::S4);
    assert_eq!(desc.attachments[1].samples, SampleCount::S4);

    // The multisampled color is resolved, not presented
    assert_eq!(desc.attachments[0].final_layout, ImageLayout::ColorAttachment);

    let resolve = &desc.attachments[2];
    assert_eq!(resolve.samples, SampleCount::S1);
    assert_eq!(resolve.final_layout, ImageLayout::PresentSrc);
    assert_eq!(resolve.load_op, LoadOp::DontCare);
    assert_eq!(resolve.store_op, StoreOp::Store);
    assert_eq!(resolve.format, TextureFormat::B8G8R8A8_SRGB);

    assert_eq!(
        compiled.kinds,
        vec![AttachmentKind::Color, AttachmentKind::DepthStencil, AttachmentKind::Resolve { source: 0 }]
    );
}

#[test]
fn test_single_sample_pass_has_no_resolve() {
    let (attachments, subpasses) = color_depth_pass(SampleCount::S1);
    let compiled = compile_render_pass(&attachments, &subpasses, &options());

    assert_eq!(compiled.desc.attachments.len(), 2);
    assert!(compiled.desc.subpasses[0].resolve_attachments.is_empty());
    assert_eq!(compiled.desc.attachments[0].final_layout, ImageLayout::PresentSrc);
}

#[test]
fn test_resolve_count_matches_multisampled_subpasses() {
    for samples in [SampleCount::S2, SampleCount::S4, SampleCount::S8] {
        for subpass_count in 1..=4usize {
            // One color attachment per subpass, all multisampled
            let attachments: Vec<_> = (0..subpass_count)
                .map(|_| AttachmentDescriptor::color(TextureFormat::R16G16B16A16_SFLOAT))
                .collect();
            let subpasses: Vec<_> = (0..subpass_count)
                .map(|i| SubpassDescriptor::new(samples).with_color(AttachmentRef::color(i)))
                .collect();

            let compiled = compile_render_pass(&attachments, &subpasses, &options());
            assert_eq!(compiled.desc.attachments.len(), subpass_count * 2);
            for resolve in &compiled.desc.attachments[subpass_count..] {
                assert_eq!(resolve.samples, SampleCount::S1);
                assert_eq!(resolve.final_layout, ImageLayout::PresentSrc);
            }
        }
    }
}

#[test]
fn test_mixed_sample_counts_only_resolve_multisampled_subpasses() {
    let attachments = vec![
        AttachmentDescriptor::color(TextureFormat::R16G16B16A16_SFLOAT),
        AttachmentDescriptor::presentable(TextureFormat::B8G8R8A8_SRGB),
    ];
    let subpasses = vec![
        SubpassDescriptor::new(SampleCount::S4).with_color(AttachmentRef::color(0)),
        SubpassDescriptor::new(SampleCount::S1).with_color(AttachmentRef::color(1)),
    ];
    let compiled = compile_render_pass(&attachments, &subpasses, &options());

    assert_eq!(compiled.desc.attachments.len(), 3);
    assert_eq!(compiled.desc.subpasses[0].resolve_attachments.len(), 1);
    assert!(compiled.desc.subpasses[1].resolve_attachments.is_empty());
    assert_eq!(compiled.desc.attachments[1].final_layout, ImageLayout::PresentSrc);
}

#[test]
fn test_each_multisampled_color_gets_its_own_resolve() {
    let attachments = vec![
        AttachmentDescriptor::color(TextureFormat::R8G8B8A8_UNORM),
        AttachmentDescriptor::color(TextureFormat::R16G16B16A16_SFLOAT),
    ];
    let subpasses = vec![
        SubpassDescriptor::new(SampleCount::S2)
            .with_color(AttachmentRef::color(0))
            .with_color(AttachmentRef::color(1)),
    ];
    let compiled = compile_render_pass(&attachments, &subpasses, &options());
    let subpass = &compiled.desc.subpasses[0];

    assert_eq!(subpass.resolve_attachments.len(), subpass.color_attachments.len());
    assert_eq!(compiled.desc.attachments[2].format, TextureFormat::R8G8B8A8_UNORM);
    assert_eq!(compiled.desc.attachments[3].format, TextureFormat::R16G16B16A16_SFLOAT);
    assert_eq!(compiled.kinds[3], AttachmentKind::Resolve { source: 1 });
}

// ============================================================================
// DEPTH FINAL LAYOUT
// ============================================================================

#[test]
fn test_depth_stays_in_attachment_layout_without_sampling() {
    let (attachments, subpasses) = color_depth_pass(SampleCount::S1);
    let compiled = compile_render_pass(&attachments, &subpasses, &options());
    let depth = &compiled.desc.attachments[1];

    assert_eq!(depth.final_layout, ImageLayout::DepthStencilAttachment);
    assert!(depth.usage.contains(TextureUsage::DEPTH_STENCIL_ATTACHMENT));
    assert!(!depth.usage.contains(TextureUsage::SAMPLED));
}

#[test]
fn test_depth_sampling_switch_makes_depth_shader_readable() {
    let (attachments, subpasses) = color_depth_pass(SampleCount::S1);
    let opts = CompileOptions { depth_sampling: true, ..options() };
    let compiled = compile_render_pass(&attachments, &subpasses, &opts);
    let depth = &compiled.desc.attachments[1];

    assert_eq!(depth.final_layout, ImageLayout::ShaderReadOnly);
    assert!(depth.usage.contains(TextureUsage::SAMPLED));
}

// ============================================================================
// REFERENCES AND USAGE
// ============================================================================

#[test]
fn test_reference_layouts_follow_declaration() {
    let attachments = vec![
        AttachmentDescriptor::color(TextureFormat::R8G8B8A8_UNORM),
        AttachmentDescriptor::depth(TextureFormat::D32_FLOAT),
        AttachmentDescriptor::presentable(TextureFormat::B8G8R8A8_SRGB),
    ];
    let subpasses = vec![
        SubpassDescriptor::new(SampleCount::S1)
            .with_color(AttachmentRef::color(0))
            .with_depth_stencil(AttachmentRef::new(1, ImageLayout::DepthStencilAttachment)),
        SubpassDescriptor::new(SampleCount::S1)
            .with_input(AttachmentRef::input(0))
            .with_input(AttachmentRef::new(1, ImageLayout::DepthStencilReadOnly))
            .with_color(AttachmentRef::color(2)),
    ];
    let compiled = compile_render_pass(&attachments, &subpasses, &options());
    let second = &compiled.desc.subpasses[1];

    assert_eq!(second.input_attachments.len(), 2);
    assert_eq!(second.input_attachments[0].layout, ImageLayout::ShaderReadOnly);
    assert_eq!(second.input_attachments[1].layout, ImageLayout::DepthStencilReadOnly);
    assert_eq!(second.color_attachments[0].attachment, 2);

    let gbuffer = &compiled.desc.attachments[0];
    assert!(gbuffer.usage.contains(TextureUsage::COLOR_ATTACHMENT | TextureUsage::INPUT_ATTACHMENT));
    assert!(gbuffer.usage.contains(TextureUsage::SAMPLED));
}

#[test]
#[should_panic]
fn test_out_of_range_color_index_panics() {
    let attachments = vec![AttachmentDescriptor::presentable(TextureFormat::B8G8R8A8_SRGB)];
    let subpasses = vec![SubpassDescriptor::new(SampleCount::S1).with_color(AttachmentRef::color(1))];
    let _ = compile_render_pass(&attachments, &subpasses, &options());
}

#[test]
#[should_panic]
fn test_out_of_range_depth_index_panics() {
    let attachments = vec![AttachmentDescriptor::presentable(TextureFormat::B8G8R8A8_SRGB)];
    let subpasses = vec![
        SubpassDescriptor::new(SampleCount::S1)
            .with_color(AttachmentRef::color(0))
            .with_depth_stencil(AttachmentRef::depth(5)),
    ];
    let _ = compile_render_pass(&attachments, &subpasses, &options());
}

// ============================================================================
// DEPENDENCIES
// ============================================================================

#[test]
fn test_dependency_count_for_subpass_chains() {
    for m in 0..=6usize {
        let attachments: Vec<_> = (0..m.max(1))
            .map(|_| AttachmentDescriptor::color(TextureFormat::R8G8B8A8_UNORM))
            .collect();
        let subpasses: Vec<_> = (0..m)
            .map(|i| SubpassDescriptor::new(SampleCount::S1).with_color(AttachmentRef::color(i)))
            .collect();

        let compiled = compile_render_pass(&attachments, &subpasses, &options());
        let deps = &compiled.desc.dependencies;
        assert_eq!(deps.len(), m.saturating_sub(1));
        for (i, dep) in deps.iter().enumerate() {
            assert_eq!(dep.src_subpass, i as u32);
            assert_eq!(dep.dst_subpass, i as u32 + 1);
        }
    }
}

#[test]
fn test_dependency_orders_color_write_before_input_read() {
    let attachments = vec![
        AttachmentDescriptor::color(TextureFormat::R8G8B8A8_UNORM),
        AttachmentDescriptor::presentable(TextureFormat::B8G8R8A8_SRGB),
    ];
    let subpasses = vec![
        SubpassDescriptor::new(SampleCount::S1).with_color(AttachmentRef::color(0)),
        SubpassDescriptor::new(SampleCount::S1)
            .with_input(AttachmentRef::input(0))
            .with_color(AttachmentRef::color(1)),
    ];
    let compiled = compile_render_pass(&attachments, &subpasses, &options());
    let dep = compiled.desc.dependencies[0];

    assert_eq!(dep.src_stages, PipelineStages::COLOR_ATTACHMENT_OUTPUT);
    assert_eq!(dep.dst_stages, PipelineStages::FRAGMENT_SHADER);
    assert_eq!(dep.src_access, AccessFlags::COLOR_ATTACHMENT_WRITE);
    assert_eq!(dep.dst_access, AccessFlags::INPUT_ATTACHMENT_READ);
    assert!(dep.by_region);
}
