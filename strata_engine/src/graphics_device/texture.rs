/// Texture trait and texture descriptor

/// Pixel formats understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
    D32_FLOAT,
    D24_UNORM_S8_UINT,
}

impl TextureFormat {
    /// Returns size in bytes of one pixel
    pub fn bytes_per_pixel(&self) -> u32 {
        4
    }

    /// True for depth (and depth/stencil) formats
    pub fn is_depth(&self) -> bool {
        matches!(self, TextureFormat::D32_FLOAT | TextureFormat::D24_UNORM_S8_UINT)
    }

    /// True when the format carries a stencil aspect
    pub fn has_stencil(&self) -> bool {
        matches!(self, TextureFormat::D24_UNORM_S8_UINT)
    }
}

/// How a texture is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureUsage {
    /// Sampled from shaders
    Sampled,
    /// Color attachment
    RenderTarget,
    /// Depth/stencil attachment
    DepthStencil,
}

/// Sampler configurations resolved by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerType {
    LinearRepeat,
    LinearClamp,
    NearestClamp,
}

/// Descriptor for creating a texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    /// Tightly packed pixel data, uploaded at creation when present
    pub data: Option<Vec<u8>>,
    /// Debug label
    pub label: String,
}

impl TextureDesc {
    /// Expected byte length of `data`
    pub fn expected_data_len(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.format.bytes_per_pixel() as u64
    }
}

/// Read-only texture properties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

/// Texture resource trait
///
/// The texture (image, view, memory) is destroyed when dropped.
pub trait Texture: Send + Sync {
    fn info(&self) -> &TextureInfo;
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
