/// Texture trait, texture descriptor, and texture info
///
/// Textures here are render attachments and sampled images. Presentable
/// images handed out by a `PresentationChain` also implement `Texture`, but
/// their memory belongs to the presentation engine (`TextureInfo::presentation_owned`).

use bitflags::bitflags;

/// Pixel format of a texture or attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
    A2B10G10R10_UNORM,
    R16G16B16A16_SFLOAT,
    R32G32B32A32_SFLOAT,
    D16_UNORM,
    D32_FLOAT,
    D24_UNORM_S8_UINT,
    D32_FLOAT_S8_UINT,
}

impl TextureFormat {
    /// True for depth and depth/stencil formats
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::D16_UNORM
                | TextureFormat::D32_FLOAT
                | TextureFormat::D24_UNORM_S8_UINT
                | TextureFormat::D32_FLOAT_S8_UINT
        )
    }

    /// True for formats with a stencil aspect
    pub fn has_stencil(&self) -> bool {
        matches!(self, TextureFormat::D24_UNORM_S8_UINT | TextureFormat::D32_FLOAT_S8_UINT)
    }
}

/// Multisample count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SampleCount {
    /// 1 sample (no multisampling)
    S1,
    /// 2 samples
    S2,
    /// 4 samples
    S4,
    /// 8 samples
    S8,
}

impl SampleCount {
    /// Number of samples per pixel
    pub fn count(&self) -> u32 {
        match self {
            SampleCount::S1 => 1,
            SampleCount::S2 => 2,
            SampleCount::S4 => 4,
            SampleCount::S8 => 8,
        }
    }

    /// Parse a numeric sample count (1, 2, 4 or 8)
    pub fn from_count(count: u32) -> Option<Self> {
        match count {
            1 => Some(SampleCount::S1),
            2 => Some(SampleCount::S2),
            4 => Some(SampleCount::S4),
            8 => Some(SampleCount::S8),
            _ => None,
        }
    }

    /// True when more than one sample per pixel
    pub fn is_multisampled(&self) -> bool {
        *self != SampleCount::S1
    }
}

bitflags! {
    /// How a texture will be used by the GPU
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        const SAMPLED                  = 1 << 0;
        const COLOR_ATTACHMENT         = 1 << 1;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 2;
        const INPUT_ATTACHMENT         = 1 << 3;
        /// Contents never leave tile memory (MSAA attachments awaiting resolve)
        const TRANSIENT_ATTACHMENT     = 1 << 4;
        const TRANSFER_SRC             = 1 << 5;
        const TRANSFER_DST             = 1 << 6;
    }
}

// ===== TEXTURE DESC =====

/// Descriptor for creating a texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Samples per pixel
    pub samples: SampleCount,
    /// Usage flags
    pub usage: TextureUsage,
}

// ===== TEXTURE INFO =====

/// Read-only properties of a created texture
#[derive(Debug, Clone, PartialEq)]
pub struct TextureInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Samples per pixel
    pub samples: SampleCount,
    /// Usage flags
    pub usage: TextureUsage,
    /// True for presentable images: only the view is owned, never the memory
    pub presentation_owned: bool,
}

// ===== TEXTURE TRAIT =====

/// Texture resource trait
///
/// Implemented by backend-specific texture types (e.g., VulkanTexture).
/// Owned textures destroy their image when dropped; presentation-owned ones
/// only destroy their view.
pub trait Texture: Send + Sync {
    /// Get the read-only properties of this texture
    fn info(&self) -> &TextureInfo;
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
