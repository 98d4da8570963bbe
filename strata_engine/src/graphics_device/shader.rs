/// Shader trait and shader descriptor

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Descriptor for creating a shader module
#[derive(Debug, Clone)]
pub struct ShaderDesc<'a> {
    /// SPIR-V bytecode
    pub code: &'a [u8],
    /// Pipeline stage
    pub stage: ShaderStage,
    /// Entry point name
    pub entry_point: String,
}

/// Shader module trait (destroyed when dropped)
pub trait Shader: Send + Sync {
    fn stage(&self) -> ShaderStage;
}
