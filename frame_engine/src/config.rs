/// Config - plain configuration values consumed at setup and recreation time
///
/// Loading configuration from disk belongs to the application; the engine
/// only receives a filled `Config`.

use crate::error::{Error, Result};
use crate::graphics_device::{
    ColorSpace, DeviceSettings, PresentMode, SampleCount, SurfaceFormat, TextureFormat,
};

/// Which validation messages are forwarded to the engine logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    /// Only errors
    ErrorsOnly,
    /// Errors and warnings
    ErrorsAndWarnings,
    /// Everything, including info and verbose messages
    All,
}

/// Validation message counters reported by the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name reported to the driver
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Enable validation layers (needs the `vulkan-validation` feature)
    pub enable_validation: bool,
    /// Validation message filter
    pub debug_severity: DebugSeverity,
    /// Panic on the first validation error
    pub panic_on_validation_error: bool,

    /// Preferred surface format and color space
    pub surface_format: SurfaceFormat,
    /// Depth attachment format
    pub depth_format: TextureFormat,
    /// Preferred present mode
    pub present_mode: PresentMode,
    /// Desired presentable image count (clamped to surface limits)
    pub image_count: u32,
    /// Frames the CPU may record ahead of the GPU
    pub frames_in_flight: usize,
    /// MSAA sample count of the scene pass
    pub sample_count: SampleCount,

    /// Clear color of color attachments
    pub clear_color: [f32; 4],
    /// Clear depth of depth attachments
    pub clear_depth: f32,
    /// Clear stencil of depth/stencil attachments
    pub clear_stencil: u32,
    /// Depth attachments end in a shader-readable layout
    pub depth_sampling: bool,

    /// Image acquisition timeout in nanoseconds
    pub acquire_timeout_ns: u64,
    /// Frame fence timeout in nanoseconds
    pub fence_timeout_ns: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Frame Engine Application".to_string(),
            app_version: (1, 0, 0),
            enable_validation: cfg!(debug_assertions),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            panic_on_validation_error: false,
            surface_format: SurfaceFormat {
                format: TextureFormat::B8G8R8A8_SRGB,
                color_space: ColorSpace::SrgbNonLinear,
            },
            depth_format: TextureFormat::D32_FLOAT,
            present_mode: PresentMode::Mailbox,
            image_count: 3,
            frames_in_flight: 2,
            sample_count: SampleCount::S1,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            clear_depth: 1.0,
            clear_stencil: 0,
            depth_sampling: false,
            acquire_timeout_ns: 5_000_000_000,
            fence_timeout_ns: 5_000_000_000,
        }
    }
}

impl Config {
    /// Device-wide part of the configuration
    pub fn device_settings(&self) -> DeviceSettings {
        DeviceSettings {
            surface_format: self.surface_format,
            depth_format: self.depth_format,
            present_mode: self.present_mode,
            image_count: self.image_count,
        }
    }

    /// Reject values no component can work with
    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 {
            return Err(Error::InvalidResource("frames_in_flight must be at least 1".to_string()));
        }
        if self.image_count == 0 {
            return Err(Error::InvalidResource("image_count must be at least 1".to_string()));
        }
        if !self.depth_format.is_depth() {
            return Err(Error::InvalidResource(format!(
                "depth_format {:?} is not a depth format",
                self.depth_format
            )));
        }
        if self.surface_format.format.is_depth() {
            return Err(Error::InvalidResource(format!(
                "surface format {:?} is a depth format",
                self.surface_format.format
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
