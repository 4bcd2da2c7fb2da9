/// BindingGroup trait and binding group layout description
///
/// A BindingGroup is an immutable set of GPU resource bindings (textures,
/// buffers). It is the engine's view of a descriptor set; the layout is taken
/// from the pipeline it is created for.

use bitflags::bitflags;
use crate::graphics_device::{Buffer, Texture, ShaderStage};

/// Type of resource bound at a given slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingType {
    /// Uniform buffer
    UniformBuffer,
    /// Combined image sampler
    CombinedImageSampler,
    /// Storage buffer
    StorageBuffer,
    /// Input attachment (read of a previous subpass output)
    InputAttachment,
}

bitflags! {
    /// Shader stage visibility flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX   = 1 << 0;
        const FRAGMENT = 1 << 1;
    }
}

impl ShaderStageFlags {
    /// Create from a slice of ShaderStage
    pub fn from_stages(stages: &[ShaderStage]) -> Self {
        stages.iter().fold(Self::empty(), |flags, stage| {
            flags | match stage {
                ShaderStage::Vertex => Self::VERTEX,
                ShaderStage::Fragment => Self::FRAGMENT,
            }
        })
    }
}

/// Description of a single binding slot
#[derive(Debug, Clone)]
pub struct BindingSlotDesc {
    /// Binding number (`layout(binding = N)` in GLSL)
    pub binding: u32,
    /// Type of resource at this binding
    pub binding_type: BindingType,
    /// Number of descriptors at this binding (>1 for arrays)
    pub count: u32,
    /// Shader stages that access this binding
    pub stage_flags: ShaderStageFlags,
}

/// Layout of one binding group (descriptor set layout)
#[derive(Debug, Clone, Default)]
pub struct BindingGroupLayoutDesc {
    pub entries: Vec<BindingSlotDesc>,
}

/// A concrete resource to bind into a BindingGroup
pub enum BindingResource<'a> {
    /// Uniform buffer binding
    UniformBuffer(&'a dyn Buffer),
    /// Sampled texture (the backend uses its default linear sampler)
    SampledTexture(&'a dyn Texture),
    /// Storage buffer binding
    StorageBuffer(&'a dyn Buffer),
    /// Input attachment written by an earlier subpass
    InputAttachment(&'a dyn Texture),
}

/// An immutable set of GPU resource bindings
pub trait BindingGroup: Send + Sync {
    /// Returns the set index this BindingGroup was created for
    fn set_index(&self) -> u32;
}
