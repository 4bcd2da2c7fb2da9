/// Shader trait and shader descriptor

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment/Pixel shader
    Fragment,
}

/// Descriptor for creating a shader
///
/// Bytecode loading is the asset layer's job; the device only wraps it.
#[derive(Debug, Clone)]
pub struct ShaderDesc<'a> {
    /// Compiled SPIR-V bytecode
    pub code: &'a [u8],
    /// Shader stage
    pub stage: ShaderStage,
    /// Entry point function name
    pub entry_point: String,
}

/// Shader resource trait
///
/// The shader is automatically destroyed when dropped.
pub trait Shader: Send + Sync {
    /// Stage this module was compiled for
    fn stage(&self) -> ShaderStage;
}
