//! Unit tests for surface negotiation helpers

use crate::graphics_device::{
    ColorSpace, Extent2D, PresentMode, SurfaceCapabilities, SurfaceFormat, TextureFormat,
};
use crate::swapchain::{choose_extent, choose_image_count, choose_present_mode, choose_surface_format};

fn caps(min: u32, max: u32) -> SurfaceCapabilities {
    SurfaceCapabilities {
        min_image_count: min,
        max_image_count: max,
        current_extent: None,
        min_extent: Extent2D::new(16, 16),
        max_extent: Extent2D::new(2048, 1024),
    }
}

fn srgb(format: TextureFormat) -> SurfaceFormat {
    SurfaceFormat { format, color_space: ColorSpace::SrgbNonLinear }
}

// ============================================================================
// FORMAT
// ============================================================================

#[test]
fn test_preferred_format_is_chosen_when_available() {
    let available = [srgb(TextureFormat::B8G8R8A8_UNORM), srgb(TextureFormat::B8G8R8A8_SRGB)];
    let chosen = choose_surface_format(&available, srgb(TextureFormat::B8G8R8A8_SRGB));
    assert_eq!(chosen, Some(srgb(TextureFormat::B8G8R8A8_SRGB)));
}

#[test]
fn test_format_requires_matching_color_space() {
    let hdr = SurfaceFormat { format: TextureFormat::B8G8R8A8_SRGB, color_space: ColorSpace::Hdr10St2084 };
    let available = [srgb(TextureFormat::R8G8B8A8_UNORM), hdr];
    let chosen = choose_surface_format(&available, srgb(TextureFormat::B8G8R8A8_SRGB));
    // No exact match: first entry wins
    assert_eq!(chosen, Some(srgb(TextureFormat::R8G8B8A8_UNORM)));
}

#[test]
fn test_no_formats_yields_none() {
    assert_eq!(choose_surface_format(&[], srgb(TextureFormat::B8G8R8A8_SRGB)), None);
}

// ============================================================================
// PRESENT MODE
// ============================================================================

#[test]
fn test_present_mode_preference_and_fallback() {
    let available = [PresentMode::Fifo, PresentMode::Immediate];
    assert_eq!(choose_present_mode(&available, PresentMode::Immediate), Some(PresentMode::Immediate));
    assert_eq!(choose_present_mode(&available, PresentMode::Mailbox), Some(PresentMode::Fifo));
    assert_eq!(choose_present_mode(&[], PresentMode::Mailbox), None);
}

// ============================================================================
// IMAGE COUNT
// ============================================================================

#[test]
fn test_image_count_always_within_limits() {
    for min in 1..=6u32 {
        for max in min..=10u32 {
            for desired in 0..=12u32 {
                let chosen = choose_image_count(&caps(min, max), desired);
                assert!(chosen >= min && chosen <= max, "min {} max {} desired {} -> {}", min, max, desired, chosen);
            }
        }
    }
}

#[test]
fn test_image_count_unbounded_when_max_is_zero() {
    for min in 1..=6u32 {
        for desired in 0..=12u32 {
            let chosen = choose_image_count(&caps(min, 0), desired);
            assert!(chosen >= min);
            assert_eq!(chosen, desired.max(min));
        }
    }
}

#[test]
fn test_image_count_keeps_desired_inside_range() {
    assert_eq!(choose_image_count(&caps(2, 8), 3), 3);
    assert_eq!(choose_image_count(&caps(2, 8), 1), 2);
    assert_eq!(choose_image_count(&caps(2, 3), 5), 3);
}

// ============================================================================
// EXTENT
// ============================================================================

#[test]
fn test_current_extent_wins_when_defined() {
    let mut capabilities = caps(2, 3);
    capabilities.current_extent = Some(Extent2D::new(1280, 720));
    assert_eq!(choose_extent(&capabilities, Extent2D::new(640, 480)), Extent2D::new(1280, 720));
}

#[test]
fn test_requested_extent_is_clamped_when_undefined() {
    let capabilities = caps(2, 3);
    assert_eq!(choose_extent(&capabilities, Extent2D::new(800, 600)), Extent2D::new(800, 600));
    assert_eq!(choose_extent(&capabilities, Extent2D::new(4000, 4)), Extent2D::new(2048, 16));
}
