/// Shader - Vulkan implementation of the Shader trait

use strata_engine::strata::render::{Shader as RenderShader, ShaderStage};
use ash::vk;

/// Vulkan shader implementation
pub struct Shader {
    /// Vulkan shader module
    pub(crate) module: vk::ShaderModule,
    pub(crate) stage: ShaderStage,
    /// Entry point name
    pub(crate) entry_point: String,
    /// Size of the push-constant block the module declares, from SPIR-V reflection
    pub(crate) push_constant_size: Option<u32>,
    /// Vulkan device (for cleanup)
    pub(crate) device: ash::Device,
}

impl RenderShader for Shader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

/// Largest push-constant block declared by any entry point of `code`
///
/// Returns `Ok(None)` when the module declares no push constants.
pub(crate) fn reflect_push_constant_size(code: &[u32]) -> std::result::Result<Option<u32>, String> {
    let entry_points = spirq::ReflectConfig::new()
        .spv(code)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| format!("SPIR-V reflection failed: {:?}", e))?;

    let mut largest: Option<u32> = None;
    for entry_point in &entry_points {
        for var in entry_point.vars.iter() {
            if let spirq::var::Variable::PushConstant { ty, .. } = var {
                let size = ty.nbyte().map(|s| s as u32).unwrap_or(0);
                largest = Some(largest.map_or(size, |l| l.max(size)));
            }
        }
    }
    Ok(largest)
}
