/// Shader bytecode loading (asset collaborator)

use std::path::{Path, PathBuf};
use crate::error::{Error, Result};

/// First word of every SPIR-V module
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Supplies shader bytecode by name
pub trait ShaderLoader {
    /// Load the bytecode for `name`
    ///
    /// Fails with `Error::ShaderLoadFailed`.
    fn load(&self, name: &str) -> Result<Vec<u8>>;
}

/// Check that `code` looks like a SPIR-V module
pub fn validate_spirv(name: &str, code: &[u8]) -> Result<()> {
    if code.len() < 4 || code.len() % 4 != 0 {
        return Err(Error::ShaderLoadFailed(format!(
            "{}: {} bytes is not a whole number of SPIR-V words",
            name,
            code.len()
        )));
    }
    let magic = u32::from_le_bytes([code[0], code[1], code[2], code[3]]);
    if magic != SPIRV_MAGIC {
        return Err(Error::ShaderLoadFailed(format!("{}: bad SPIR-V magic {:#010x}", name, magic)));
    }
    Ok(())
}

/// Loads compiled `.spv` files relative to a root directory
#[derive(Debug, Clone)]
pub struct FileShaderLoader {
    root: PathBuf,
}

impl FileShaderLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ShaderLoader for FileShaderLoader {
    fn load(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.root.join(name);
        let code = std::fs::read(&path)
            .map_err(|e| Error::ShaderLoadFailed(format!("{}: {}", path.display(), e)))?;
        validate_spirv(name, &code)?;
        Ok(code)
    }
}

#[cfg(test)]
#[path = "shader_loader_tests.rs"]
mod tests;
