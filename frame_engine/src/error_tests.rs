//! Unit tests for error.rs
//!
//! Tests all Error variants and their implementations (Display, Debug, Clone, std::error::Error).

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("vkQueueSubmit failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("vkQueueSubmit failed"));
}

#[test]
fn test_out_of_memory_display() {
    let err = Error::OutOfMemory;
    assert_eq!(format!("{}", err), "Out of GPU memory");
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("attachment 3 is a depth attachment".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid resource"));
    assert!(display.contains("attachment 3"));
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("no graphics queue family".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Initialization failed"));
    assert!(display.contains("no graphics queue family"));
}

#[test]
fn test_timeout_display() {
    let err = Error::Timeout("fence wait".to_string());
    assert_eq!(format!("{}", err), "Timeout: fence wait");
}

#[test]
fn test_surface_lost_display() {
    let err = Error::SurfaceLost("second acquire failed".to_string());
    assert_eq!(format!("{}", err), "Surface lost: second acquire failed");
}

#[test]
fn test_invalid_state_display() {
    let err = Error::InvalidState("end_frame while Idle".to_string());
    assert_eq!(format!("{}", err), "Invalid state: end_frame while Idle");
}

// ============================================================================
// FATALITY CLASSIFICATION
// ============================================================================

#[test]
fn test_driver_failures_are_fatal() {
    assert!(Error::BackendError("x".to_string()).is_fatal());
    assert!(Error::OutOfMemory.is_fatal());
    assert!(Error::InitializationFailed("x".to_string()).is_fatal());
    assert!(Error::Timeout("x".to_string()).is_fatal());
    assert!(Error::SurfaceLost("x".to_string()).is_fatal());
}

#[test]
fn test_caller_misuse_is_not_fatal() {
    assert!(!Error::InvalidResource("x".to_string()).is_fatal());
    assert!(!Error::InvalidState("x".to_string()).is_fatal());
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug() {
    let debug = format!("{:?}", Error::Timeout("acquire".to_string()));
    assert!(debug.contains("Timeout"));
    assert!(debug.contains("acquire"));
}

#[test]
fn test_error_clone_and_eq() {
    let err = Error::SurfaceLost("gone".to_string());
    let cloned = err.clone();
    assert_eq!(err, cloned);
    assert_ne!(err, Error::OutOfMemory);
}

// ============================================================================
// RESULT TYPE
// ============================================================================

fn fails() -> Result<u32> {
    Err(Error::InvalidState("not recording".to_string()))
}

fn propagates() -> Result<u32> {
    let value = fails()?;
    Ok(value + 1)
}

#[test]
fn test_result_propagation() {
    match propagates() {
        Err(Error::InvalidState(msg)) => assert_eq!(msg, "not recording"),
        other => panic!("unexpected result: {:?}", other),
    }
}
