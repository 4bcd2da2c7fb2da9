/// Declarative attachment and subpass descriptors
///
/// These are the inputs of `compile_render_pass()`. Indices in
/// `AttachmentRef` point into the attachment list passed alongside.

use crate::graphics_device::{
    ImageLayout, LoadOp, SampleCount, StoreOp, TextureFormat, TextureUsage,
};

/// One attachment of a render pass, before compilation
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentDescriptor {
    pub format: TextureFormat,
    /// Overwritten by the sample count of the subpass that references it
    pub samples: SampleCount,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
    /// Extra usage beyond what the pass itself implies
    pub usage: TextureUsage,
}

impl AttachmentDescriptor {
    /// Color attachment that is presented after the pass
    pub fn presentable(format: TextureFormat) -> Self {
        Self {
            format,
            samples: SampleCount::S1,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            stencil_load_op: LoadOp::DontCare,
            stencil_store_op: StoreOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::PresentSrc,
            usage: TextureUsage::empty(),
        }
    }

    /// Color attachment sampled by a later pass (render-to-texture)
    pub fn color(format: TextureFormat) -> Self {
        Self {
            final_layout: ImageLayout::ShaderReadOnly,
            ..Self::presentable(format)
        }
    }

    /// Depth (and stencil, if the format has one) attachment
    pub fn depth(format: TextureFormat) -> Self {
        let stencil_load_op = if format.has_stencil() { LoadOp::Clear } else { LoadOp::DontCare };
        Self {
            format,
            samples: SampleCount::S1,
            load_op: LoadOp::Clear,
            store_op: StoreOp::DontCare,
            stencil_load_op,
            stencil_store_op: StoreOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::DepthStencilAttachment,
            usage: TextureUsage::empty(),
        }
    }

    pub fn with_load_op(mut self, load_op: LoadOp) -> Self {
        self.load_op = load_op;
        self
    }

    pub fn with_store_op(mut self, store_op: StoreOp) -> Self {
        self.store_op = store_op;
        self
    }

    pub fn with_final_layout(mut self, layout: ImageLayout) -> Self {
        self.final_layout = layout;
        self
    }

    pub fn with_usage(mut self, usage: TextureUsage) -> Self {
        self.usage |= usage;
        self
    }
}

/// Reference from a subpass to an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentRef {
    /// Index into the attachment list
    pub index: usize,
    /// Layout required during the subpass
    pub layout: ImageLayout,
}

impl AttachmentRef {
    pub fn new(index: usize, layout: ImageLayout) -> Self {
        Self { index, layout }
    }

    /// Color output reference
    pub fn color(index: usize) -> Self {
        Self::new(index, ImageLayout::ColorAttachment)
    }

    /// Depth/stencil reference
    pub fn depth(index: usize) -> Self {
        Self::new(index, ImageLayout::DepthStencilAttachment)
    }

    /// Input attachment reference (read in the fragment shader)
    pub fn input(index: usize) -> Self {
        Self::new(index, ImageLayout::ShaderReadOnly)
    }
}

/// One rendering phase of a pass
///
/// A subpass has at most one depth/stencil attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct SubpassDescriptor {
    pub input_attachments: Vec<AttachmentRef>,
    pub color_attachments: Vec<AttachmentRef>,
    pub depth_stencil_attachment: Option<AttachmentRef>,
    pub samples: SampleCount,
}

impl SubpassDescriptor {
    pub fn new(samples: SampleCount) -> Self {
        Self {
            input_attachments: Vec::new(),
            color_attachments: Vec::new(),
            depth_stencil_attachment: None,
            samples,
        }
    }

    pub fn with_input(mut self, reference: AttachmentRef) -> Self {
        self.input_attachments.push(reference);
        self
    }

    pub fn with_color(mut self, reference: AttachmentRef) -> Self {
        self.color_attachments.push(reference);
        self
    }

    pub fn with_depth_stencil(mut self, reference: AttachmentRef) -> Self {
        self.depth_stencil_attachment = Some(reference);
        self
    }
}

/// Pass-wide compilation switches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompileOptions {
    /// Format of the implicit output attachment when no attachments are given
    pub default_format: TextureFormat,
    /// Depth attachments end in `ShaderReadOnly` so a later pass can sample them
    pub depth_sampling: bool,
}
