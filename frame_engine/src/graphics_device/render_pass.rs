/// RenderPass trait and the compiled attachment/subpass tables
///
/// These tables are what a backend needs to create a render pass object.
/// They are produced by `crate::render_pass::compile_render_pass()` from the
/// declarative descriptors; backends never build them by hand.

use bitflags::bitflags;
use crate::graphics_device::{SampleCount, TextureFormat, TextureUsage};

/// Render pass trait (backend handle)
pub trait RenderPass: Send + Sync {
    /// Number of attachments the pass was created with
    fn attachment_count(&self) -> usize;
}

/// Load operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    /// Load existing content
    Load,
    /// Clear the content
    Clear,
    /// Don't care about existing content
    DontCare,
}

/// Store operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    /// Store the rendered content
    Store,
    /// Don't care about storing the content
    DontCare,
}

/// Image layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    /// Undefined layout (initial state)
    Undefined,
    /// General layout
    General,
    /// Layout for color attachment
    ColorAttachment,
    /// Layout for depth/stencil attachment
    DepthStencilAttachment,
    /// Layout for read-only depth/stencil
    DepthStencilReadOnly,
    /// Layout for shader read-only access
    ShaderReadOnly,
    /// Layout for transfer source
    TransferSrc,
    /// Layout for transfer destination
    TransferDst,
    /// Layout for presenting to the surface
    PresentSrc,
}

bitflags! {
    /// Pipeline stages used in subpass dependencies
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PipelineStages: u32 {
        const TOP_OF_PIPE             = 1 << 0;
        const FRAGMENT_SHADER         = 1 << 1;
        const EARLY_FRAGMENT_TESTS    = 1 << 2;
        const LATE_FRAGMENT_TESTS     = 1 << 3;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 4;
        const BOTTOM_OF_PIPE          = 1 << 5;
    }
}

bitflags! {
    /// Memory access types used in subpass dependencies
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AccessFlags: u32 {
        const INPUT_ATTACHMENT_READ          = 1 << 0;
        const SHADER_READ                    = 1 << 1;
        const COLOR_ATTACHMENT_READ          = 1 << 2;
        const COLOR_ATTACHMENT_WRITE         = 1 << 3;
        const DEPTH_STENCIL_ATTACHMENT_READ  = 1 << 4;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 1 << 5;
    }
}

/// Subpass index meaning "outside the render pass"
pub const SUBPASS_EXTERNAL: u32 = u32::MAX;

/// One entry of the compiled attachment list
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentDescription {
    pub format: TextureFormat,
    pub samples: SampleCount,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
    /// Union of every usage the pass makes of this attachment
    pub usage: TextureUsage,
}

/// Reference from a subpass to an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentReference {
    /// Index into the compiled attachment list
    pub attachment: u32,
    /// Layout during the subpass
    pub layout: ImageLayout,
}

/// One compiled subpass
///
/// `resolve_attachments` is either empty or exactly as long as
/// `color_attachments`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubpassDescription {
    pub input_attachments: Vec<AttachmentReference>,
    pub color_attachments: Vec<AttachmentReference>,
    pub resolve_attachments: Vec<AttachmentReference>,
    pub depth_stencil_attachment: Option<AttachmentReference>,
}

/// Execution/memory dependency between two subpasses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubpassDependency {
    pub src_subpass: u32,
    pub dst_subpass: u32,
    pub src_stages: PipelineStages,
    pub dst_stages: PipelineStages,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
    /// Dependency only holds per framebuffer region
    pub by_region: bool,
}

/// Compiled render pass tables handed to `GraphicsDevice::create_render_pass()`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderPassDesc {
    pub attachments: Vec<AttachmentDescription>,
    pub subpasses: Vec<SubpassDescription>,
    pub dependencies: Vec<SubpassDependency>,
}
