/// Pipeline trait and pipeline descriptor

use std::sync::Arc;
use crate::graphics_device::{
    BufferFormat, BindingGroupLayoutDesc, SampleCount, Shader, ShaderStage,
};

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    TriangleList,
    TriangleStrip,
    LineList,
    PointList,
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 16-bit indices
    U16,
    /// 32-bit indices
    U32,
}

impl IndexType {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Vertex input rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexInputRate {
    /// Data is per-vertex
    Vertex,
    /// Data is per-instance
    Instance,
}

/// Vertex attribute description
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute {
    /// Attribute location in shader
    pub location: u32,
    /// Binding index
    pub binding: u32,
    /// Format of the attribute
    pub format: BufferFormat,
    /// Offset in bytes from the start of the vertex
    pub offset: u32,
}

/// Vertex binding description
#[derive(Debug, Clone, Copy)]
pub struct VertexBinding {
    /// Binding index
    pub binding: u32,
    /// Stride in bytes between consecutive elements
    pub stride: u32,
    /// Input rate (per-vertex or per-instance)
    pub input_rate: VertexInputRate,
}

/// Vertex input layout
#[derive(Debug, Clone, Default)]
pub struct VertexLayout {
    pub bindings: Vec<VertexBinding>,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Stride of the given binding, if declared
    pub fn stride(&self, binding: u32) -> Option<u32> {
        self.bindings.iter().find(|b| b.binding == binding).map(|b| b.stride)
    }
}

/// Push constant range descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushConstantRange {
    /// Shader stages that can access these push constants
    pub stages: Vec<ShaderStage>,
    /// Offset in bytes
    pub offset: u32,
    /// Size in bytes
    pub size: u32,
}

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Front face winding order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

/// Comparison operator for depth tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Rasterization fixed-function state
#[derive(Debug, Clone, Copy)]
pub struct RasterizationState {
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
}

impl Default for RasterizationState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
        }
    }
}

/// Depth testing state
#[derive(Debug, Clone, Copy)]
pub struct DepthState {
    pub test_enable: bool,
    pub write_enable: bool,
    pub compare_op: CompareOp,
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            test_enable: true,
            write_enable: true,
            compare_op: CompareOp::Less,
        }
    }
}

/// Descriptor for creating a graphics pipeline
///
/// `samples` and `subpass` must match the render pass the pipeline is
/// created against; `SceneRenderer::setup_pipeline` fills both in.
#[derive(Clone)]
pub struct PipelineDesc {
    /// Vertex shader
    pub vertex_shader: Arc<dyn Shader>,
    /// Fragment shader
    pub fragment_shader: Arc<dyn Shader>,
    /// Vertex input layout
    pub vertex_layout: VertexLayout,
    /// Primitive topology
    pub topology: PrimitiveTopology,
    /// Push constant ranges
    pub push_constant_ranges: Vec<PushConstantRange>,
    /// One layout per binding group set index
    pub binding_group_layouts: Vec<BindingGroupLayoutDesc>,
    /// Rasterization state
    pub rasterization: RasterizationState,
    /// Depth testing state
    pub depth: DepthState,
    /// Enable standard alpha blending on every color attachment
    pub alpha_blend: bool,
    /// Rasterization samples
    pub samples: SampleCount,
    /// Subpass index within the render pass
    pub subpass: u32,
}

/// Pipeline resource trait
///
/// The pipeline is automatically destroyed when dropped.
pub trait Pipeline: Send + Sync {
    /// Number of binding group layouts (descriptor set layouts)
    fn binding_group_layout_count(&self) -> u32;
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
