//! Unit tests for the Swapchain lifecycle

use std::sync::Arc;

use crate::error::Error;
use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, MockSemaphore};
use crate::graphics_device::{Extent2D, GraphicsDevice, PresentMode, PresentStatus, TextureFormat};
use crate::swapchain::{Swapchain, SwapchainOutcome, SwapchainState};

const TIMEOUT: u64 = 1_000_000;

fn setup(mock: MockGraphicsDevice) -> (Arc<MockGraphicsDevice>, Swapchain) {
    let mock = Arc::new(mock);
    let device: Arc<dyn GraphicsDevice> = mock.clone();
    let swapchain = Swapchain::new(device, 1024, 768, TIMEOUT).unwrap();
    (mock, swapchain)
}

// ============================================================================
// CREATION / RECREATION
// ============================================================================

#[test]
fn test_new_creates_valid_chain() {
    let (mock, swapchain) = setup(MockGraphicsDevice::new());

    assert_eq!(swapchain.state(), SwapchainState::Valid);
    assert_eq!(swapchain.generation(), 1);
    assert_eq!(swapchain.image_count(), 3);
    // Surface reports a current extent, the requested one is ignored
    assert_eq!(swapchain.extent(), Extent2D::new(800, 600));
    assert_eq!(swapchain.format(), TextureFormat::B8G8R8A8_SRGB);
    assert_eq!(swapchain.surface_info().unwrap().present_mode, PresentMode::Mailbox);
    assert_eq!(mock.state.count(&mock.state.chains_created), 1);
    assert_eq!(*mock.state.chain_handoffs.lock().unwrap(), vec![None]);
}

#[test]
fn test_images_are_presentation_owned() {
    let (_mock, swapchain) = setup(MockGraphicsDevice::new());
    assert!(swapchain.images().iter().all(|image| image.info().presentation_owned));
}

#[test]
fn test_recreate_twice_destroys_one_chain_per_call() {
    let (mock, mut swapchain) = setup(MockGraphicsDevice::new());

    swapchain.recreate().unwrap();
    assert_eq!(mock.state.count(&mock.state.chains_dropped), 1);
    swapchain.recreate().unwrap();
    assert_eq!(mock.state.count(&mock.state.chains_dropped), 2);

    assert_eq!(mock.state.count(&mock.state.chains_created), 3);
    assert_eq!(swapchain.generation(), 3);
    assert_eq!(swapchain.state(), SwapchainState::Valid);

    let handoffs = mock.state.chain_handoffs.lock().unwrap().clone();
    assert_eq!(handoffs.len(), 3);
    assert_eq!(handoffs[0], None);
    // Each recreation hands over the chain created just before it
    assert!(handoffs[1].is_some());
    assert!(handoffs[2].is_some());
    assert_ne!(handoffs[1], handoffs[2]);
}

#[test]
fn test_drop_releases_current_chain() {
    let (mock, swapchain) = setup(MockGraphicsDevice::new());
    drop(swapchain);
    assert_eq!(mock.state.count(&mock.state.chains_dropped), 1);
}

#[test]
fn test_image_count_is_clamped_to_surface() {
    let (mock, swapchain) = setup(MockGraphicsDevice::new().with_image_count(12));
    assert_eq!(swapchain.image_count(), 8);
    assert_eq!(mock.state.chain_descs.lock().unwrap()[0].image_count, 8);

    let (_, swapchain) = setup(MockGraphicsDevice::new().with_image_count(1));
    assert_eq!(swapchain.image_count(), 2);
}

#[test]
fn test_format_falls_back_to_first_available() {
    let mock = MockGraphicsDevice::new();
    mock.formats.lock().unwrap().remove(1);
    let (_, swapchain) = setup(mock);
    assert_eq!(swapchain.format(), TextureFormat::B8G8R8A8_UNORM);
}

#[test]
fn test_present_mode_falls_back_to_first_available() {
    let mock = MockGraphicsDevice::new();
    *mock.present_modes.lock().unwrap() = vec![PresentMode::Fifo];
    let (_, swapchain) = setup(mock);
    assert_eq!(swapchain.surface_info().unwrap().present_mode, PresentMode::Fifo);
}

#[test]
fn test_empty_format_list_fails() {
    let mock = Arc::new(MockGraphicsDevice::new());
    mock.formats.lock().unwrap().clear();
    let device: Arc<dyn GraphicsDevice> = mock.clone();
    let result = Swapchain::new(device, 800, 600, TIMEOUT);
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
    assert_eq!(mock.state.count(&mock.state.chains_created), 0);
}

#[test]
fn test_undefined_surface_extent_uses_requested_size() {
    let mock = MockGraphicsDevice::new();
    mock.capabilities.lock().unwrap().current_extent = None;
    let (mock, mut swapchain) = setup(mock);
    assert_eq!(swapchain.extent(), Extent2D::new(1024, 768));

    swapchain.set_requested_extent(9000, 300);
    swapchain.recreate().unwrap();
    assert_eq!(swapchain.extent(), Extent2D::new(4096, 300));
    assert_eq!(mock.state.chain_descs.lock().unwrap()[1].extent, Extent2D::new(4096, 300));
}

// ============================================================================
// MINIMIZED SURFACE
// ============================================================================

#[test]
fn test_zero_extent_defers_recreation() {
    let (mock, mut swapchain) = setup(MockGraphicsDevice::new());

    mock.set_surface_extent(0, 0);
    swapchain.recreate().unwrap();

    assert_eq!(swapchain.state(), SwapchainState::Stale);
    assert_eq!(swapchain.generation(), 1);
    assert_eq!(mock.state.count(&mock.state.chains_created), 1);
    assert_eq!(mock.state.count(&mock.state.chains_dropped), 0);
    // Old chain is kept until the surface has an area again
    assert_eq!(swapchain.image_count(), 3);

    let semaphore = MockSemaphore;
    assert!(swapchain.acquire_next_image(&semaphore).should_recreate());

    mock.set_surface_extent(640, 480);
    swapchain.recreate().unwrap();
    assert_eq!(swapchain.state(), SwapchainState::Valid);
    assert_eq!(swapchain.extent(), Extent2D::new(640, 480));
    assert_eq!(swapchain.generation(), 2);
}

#[test]
fn test_minimized_at_startup_has_no_images() {
    let mock = Arc::new(MockGraphicsDevice::new());
    mock.set_surface_extent(0, 0);
    let device: Arc<dyn GraphicsDevice> = mock.clone();
    let swapchain = Swapchain::new(device, 0, 0, TIMEOUT).unwrap();

    assert!(swapchain.is_stale());
    assert!(swapchain.images().is_empty());
    assert_eq!(swapchain.generation(), 0);
}

// ============================================================================
// ACQUIRE / PRESENT
// ============================================================================

#[test]
fn test_acquire_success_and_suboptimal_are_usable() {
    let (mock, mut swapchain) = setup(MockGraphicsDevice::new());
    let semaphore = MockSemaphore;

    match swapchain.acquire_next_image(&semaphore) {
        SwapchainOutcome::Ok(image) => {
            assert_eq!(image.index, 0);
            assert!(!image.suboptimal);
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    mock.script_acquire(Ok(PresentStatus::Suboptimal));
    match swapchain.acquire_next_image(&semaphore) {
        SwapchainOutcome::Ok(image) => {
            assert_eq!(image.index, 1);
            assert!(image.suboptimal);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(swapchain.current_image_index(), 1);
    assert!(swapchain.is_stale());

    // Presenting the suboptimal image still goes through
    assert!(swapchain.present(1, &[&semaphore]).is_ok());
    swapchain.recreate().unwrap();
    assert_eq!(swapchain.state(), SwapchainState::Valid);
}

#[test]
fn test_acquire_out_of_date_requests_recreation() {
    let (mock, mut swapchain) = setup(MockGraphicsDevice::new());
    let semaphore = MockSemaphore;

    mock.script_acquire(Ok(PresentStatus::OutOfDate));
    assert!(swapchain.acquire_next_image(&semaphore).should_recreate());
    assert!(swapchain.is_stale());

    // Stays stale until recreated, without touching the driver again
    assert!(swapchain.acquire_next_image(&semaphore).should_recreate());

    swapchain.recreate().unwrap();
    assert!(swapchain.acquire_next_image(&semaphore).is_ok());
}

#[test]
fn test_acquire_error_is_fatal() {
    let (mock, mut swapchain) = setup(MockGraphicsDevice::new());
    mock.script_acquire(Err(Error::Timeout("acquire".to_string())));

    let outcome = swapchain.acquire_next_image(&MockSemaphore);
    match outcome.into_result() {
        Err(e) => assert!(e.is_fatal()),
        Ok(value) => panic!("expected fatal outcome, got {:?}", value),
    }
}

#[test]
fn test_present_reports_each_status() {
    let (mock, mut swapchain) = setup(MockGraphicsDevice::new());
    let semaphore = MockSemaphore;

    assert!(swapchain.present(0, &[&semaphore]).is_ok());
    assert_eq!(*mock.state.presents.lock().unwrap(), vec![(0, 1)]);

    mock.script_present(Ok(PresentStatus::Suboptimal));
    assert!(swapchain.present(1, &[&semaphore]).should_recreate());
    assert!(swapchain.is_stale());

    swapchain.recreate().unwrap();
    mock.script_present(Ok(PresentStatus::OutOfDate));
    assert!(swapchain.present(2, &[&semaphore]).should_recreate());

    swapchain.recreate().unwrap();
    mock.script_present(Err(Error::SurfaceLost("gone".to_string())));
    let outcome = swapchain.present(0, &[&semaphore]);
    assert!(matches!(outcome, SwapchainOutcome::Fatal(Error::SurfaceLost(_))));
}

#[test]
fn test_set_requested_extent_marks_stale() {
    let (_mock, mut swapchain) = setup(MockGraphicsDevice::new());
    swapchain.set_requested_extent(320, 200);
    assert!(swapchain.is_stale());
    swapchain.recreate().unwrap();
    assert_eq!(swapchain.state(), SwapchainState::Valid);
}
