/// Pipeline module - shader loading and the engine's pipeline set

pub mod shader_loader;
pub mod pipeline_set;

pub use shader_loader::{validate_spirv, FileShaderLoader, ShaderLoader, SPIRV_MAGIC};
pub use pipeline_set::{
    OutputRegion, PassStart, PipelineEntry, PipelineSet, PipelineSpec, RenderPassVariants,
    TargetAttachments,
};
