/// Render pass compiler
///
/// Turns attachment and subpass descriptors into the tables a backend
/// creates its render pass from:
/// - one attachment reference list per subpass (input, color, depth/stencil)
/// - a single-sample resolve attachment per multisampled color reference,
///   appended after the declared attachments
/// - one by-region dependency per adjacent subpass pair
///
/// Out-of-range attachment indices are programming errors and panic.

use crate::graphics_device::{
    AccessFlags, AttachmentDescription, AttachmentReference, ImageLayout,
    LoadOp, PipelineStages, RenderPassDesc, SampleCount, StoreOp,
    SubpassDependency, SubpassDescription, TextureUsage,
};
use crate::render_pass::{AttachmentDescriptor, AttachmentRef, CompileOptions, SubpassDescriptor};

/// What an attachment of a compiled pass is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Color,
    DepthStencil,
    /// Synthesized single-sample target of the multisampled attachment `source`
    Resolve { source: usize },
}

/// Output of `compile_render_pass()`
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRenderPass {
    pub desc: RenderPassDesc,
    /// One entry per compiled attachment
    pub kinds: Vec<AttachmentKind>,
    /// Sample count of each subpass
    pub subpass_samples: Vec<SampleCount>,
}

/// Compile attachment and subpass descriptors
///
/// If both lists are empty the pass defaults to a single presentable color
/// attachment in `options.default_format` and one subpass writing it.
///
/// # Panics
///
/// If any subpass references an attachment index outside `attachments`.
pub fn compile_render_pass(
    attachments: &[AttachmentDescriptor],
    subpasses: &[SubpassDescriptor],
    options: &CompileOptions,
) -> CompiledRenderPass {
    if attachments.is_empty() && subpasses.is_empty() {
        let default_attachments = [AttachmentDescriptor::presentable(options.default_format)];
        let default_subpasses = [SubpassDescriptor::new(SampleCount::S1).with_color(AttachmentRef::color(0))];
        return compile_render_pass(&default_attachments, &default_subpasses, options);
    }

    check_references(attachments.len(), subpasses);

    let mut compiled: Vec<AttachmentDescription> = attachments.iter().map(describe).collect();
    let mut kinds: Vec<AttachmentKind> = attachments.iter()
        .map(|a| if a.format.is_depth() { AttachmentKind::DepthStencil } else { AttachmentKind::Color })
        .collect();
    let mut compiled_subpasses = Vec::with_capacity(subpasses.len());

    for subpass in subpasses {
        let mut out = SubpassDescription::default();

        for input in &subpass.input_attachments {
            compiled[input.index].usage |= TextureUsage::INPUT_ATTACHMENT;
            out.input_attachments.push(reference(input.index, input.layout));
        }

        for color in &subpass.color_attachments {
            let attachment = &mut compiled[color.index];
            attachment.samples = subpass.samples;
            attachment.usage |= TextureUsage::COLOR_ATTACHMENT;
            out.color_attachments.push(reference(color.index, color.layout));

            if subpass.samples.is_multisampled() {
                // Resolved, never presented directly
                attachment.final_layout = ImageLayout::ColorAttachment;
                let resolve = resolve_attachment(attachment);
                out.resolve_attachments.push(reference(compiled.len(), ImageLayout::ColorAttachment));
                compiled.push(resolve);
                kinds.push(AttachmentKind::Resolve { source: color.index });
            }
        }

        if let Some(depth) = subpass.depth_stencil_attachment {
            let attachment = &mut compiled[depth.index];
            attachment.samples = subpass.samples;
            attachment.usage |= TextureUsage::DEPTH_STENCIL_ATTACHMENT;
            if options.depth_sampling {
                attachment.final_layout = ImageLayout::ShaderReadOnly;
                attachment.usage |= TextureUsage::SAMPLED;
            } else {
                attachment.final_layout = ImageLayout::DepthStencilAttachment;
            }
            out.depth_stencil_attachment = Some(reference(depth.index, depth.layout));
        }

        compiled_subpasses.push(out);
    }

    // Attachments left for sampling after the pass must be sampleable
    for attachment in compiled.iter_mut() {
        if attachment.final_layout == ImageLayout::ShaderReadOnly {
            attachment.usage |= TextureUsage::SAMPLED;
        }
    }

    CompiledRenderPass {
        desc: RenderPassDesc {
            attachments: compiled,
            subpasses: compiled_subpasses,
            dependencies: subpass_dependencies(subpasses.len()),
        },
        kinds,
        subpass_samples: subpasses.iter().map(|s| s.samples).collect(),
    }
}

/// One dependency per adjacent pair: color writes of `i` before input reads of `i + 1`
pub fn subpass_dependencies(subpass_count: usize) -> Vec<SubpassDependency> {
    (1..subpass_count)
        .map(|dst| SubpassDependency {
            src_subpass: (dst - 1) as u32,
            dst_subpass: dst as u32,
            src_stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            dst_stages: PipelineStages::FRAGMENT_SHADER,
            src_access: AccessFlags::COLOR_ATTACHMENT_WRITE,
            dst_access: AccessFlags::INPUT_ATTACHMENT_READ,
            by_region: true,
        })
        .collect()
}

fn check_references(attachment_count: usize, subpasses: &[SubpassDescriptor]) {
    for (i, subpass) in subpasses.iter().enumerate() {
        let references = subpass.input_attachments.iter()
            .chain(subpass.color_attachments.iter())
            .chain(subpass.depth_stencil_attachment.iter());
        for r in references {
            if r.index >= attachment_count {
                crate::engine_error!(
                    "frame_engine::render_pass",
                    "Subpass {} references attachment {} but the pass has {} attachments",
                    i, r.index, attachment_count
                );
                panic!(
                    "subpass {} references attachment {} out of {}",
                    i, r.index, attachment_count
                );
            }
        }
    }
}

fn describe(attachment: &AttachmentDescriptor) -> AttachmentDescription {
    AttachmentDescription {
        format: attachment.format,
        samples: attachment.samples,
        load_op: attachment.load_op,
        store_op: attachment.store_op,
        stencil_load_op: attachment.stencil_load_op,
        stencil_store_op: attachment.stencil_store_op,
        initial_layout: attachment.initial_layout,
        final_layout: attachment.final_layout,
        usage: attachment.usage,
    }
}

fn resolve_attachment(source: &AttachmentDescription) -> AttachmentDescription {
    AttachmentDescription {
        format: source.format,
        samples: SampleCount::S1,
        load_op: LoadOp::DontCare,
        store_op: StoreOp::Store,
        stencil_load_op: LoadOp::DontCare,
        stencil_store_op: StoreOp::DontCare,
        initial_layout: ImageLayout::Undefined,
        final_layout: ImageLayout::PresentSrc,
        usage: TextureUsage::COLOR_ATTACHMENT,
    }
}

fn reference(index: usize, layout: ImageLayout) -> AttachmentReference {
    AttachmentReference { attachment: index as u32, layout }
}

#[cfg(test)]
#[path = "compiler_tests.rs"]
mod tests;
