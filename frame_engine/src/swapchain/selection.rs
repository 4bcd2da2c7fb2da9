/// Surface negotiation helpers
///
/// Pure functions over what the surface reports; the swapchain calls them
/// on every (re)creation.

use crate::graphics_device::{Extent2D, PresentMode, SurfaceCapabilities, SurfaceFormat};

/// Exact format + color space match, else the first available format
///
/// Returns `None` only when the surface reports no formats at all.
pub fn choose_surface_format(available: &[SurfaceFormat], preferred: SurfaceFormat) -> Option<SurfaceFormat> {
    available.iter()
        .find(|f| **f == preferred)
        .or_else(|| available.first())
        .copied()
}

/// Preferred present mode if supported, else the first available one
pub fn choose_present_mode(available: &[PresentMode], preferred: PresentMode) -> Option<PresentMode> {
    if available.contains(&preferred) {
        Some(preferred)
    } else {
        available.first().copied()
    }
}

/// Clamp the desired image count into the surface limits
///
/// `max_image_count == 0` means the surface has no upper bound.
pub fn choose_image_count(capabilities: &SurfaceCapabilities, desired: u32) -> u32 {
    let count = desired.max(capabilities.min_image_count);
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

/// The surface's current extent when it defines one, else `requested` clamped to the limits
pub fn choose_extent(capabilities: &SurfaceCapabilities, requested: Extent2D) -> Extent2D {
    match capabilities.current_extent {
        Some(extent) => extent,
        None => Extent2D {
            width: requested.width.clamp(capabilities.min_extent.width, capabilities.max_extent.width),
            height: requested.height.clamp(capabilities.min_extent.height, capabilities.max_extent.height),
        },
    }
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;
