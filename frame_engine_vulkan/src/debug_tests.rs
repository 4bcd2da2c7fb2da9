//! Unit tests for the validation message callback
//!
//! The callback is driven directly with hand-built callback data, no GPU
//! required. Counters and the logger are process-wide, hence `#[serial]`.

use super::*;
use frame_engine::log::{LogEntry, Logger};
use serial_test::serial;
use std::sync::Arc;

struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.clone());
        }
    }
}

fn capture_logs() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

fn emit(severity: vk::DebugUtilsMessageSeverityFlagsEXT, message: &CStr) -> vk::Bool32 {
    let data = vk::DebugUtilsMessengerCallbackDataEXT::default()
        .message_id_name(c"VUID-test")
        .message(message);
    unsafe {
        vulkan_debug_callback(
            severity,
            vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
            &data,
            std::ptr::null_mut(),
        )
    }
}

// ============================================================================
// PURE MAPPINGS
// ============================================================================

#[test]
fn test_severity_flags_per_filter() {
    assert_eq!(severity_flags(DebugSeverity::ErrorsOnly), vk::DebugUtilsMessageSeverityFlagsEXT::ERROR);
    assert!(severity_flags(DebugSeverity::ErrorsAndWarnings)
        .contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING));
    assert!(!severity_flags(DebugSeverity::ErrorsAndWarnings)
        .contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO));
    assert!(severity_flags(DebugSeverity::All).contains(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE));
}

#[test]
fn test_log_severity_mapping() {
    assert_eq!(log_severity(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR), LogSeverity::Error);
    assert_eq!(log_severity(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING), LogSeverity::Warn);
    assert_eq!(log_severity(vk::DebugUtilsMessageSeverityFlagsEXT::INFO), LogSeverity::Info);
    assert_eq!(log_severity(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE), LogSeverity::Debug);
}

// ============================================================================
// CALLBACK
// ============================================================================

#[test]
#[serial]
fn test_callback_forwards_to_engine_logger_and_counts() {
    init_debug_config(DebugConfig { severity: DebugSeverity::ErrorsAndWarnings, panic_on_error: false });
    let logs = capture_logs();

    assert_eq!(emit(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR, c"bad layout"), vk::FALSE);
    emit(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING, c"slow path");

    let stats = validation_stats();
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.warnings, 1);
    assert_eq!(stats.total(), 2);

    let entries = logs.lock().unwrap().clone();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert_eq!(entries[0].source, "frame_engine::vulkan");
    assert!(entries[0].message.contains("VUID-test"));
    assert!(entries[0].message.contains("bad layout"));
    assert_eq!(entries[1].severity, LogSeverity::Warn);

    cleanup_debug_config();
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_callback_filters_below_configured_severity() {
    init_debug_config(DebugConfig { severity: DebugSeverity::ErrorsOnly, panic_on_error: false });
    let logs = capture_logs();

    emit(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING, c"ignored");
    emit(vk::DebugUtilsMessageSeverityFlagsEXT::INFO, c"ignored too");

    assert_eq!(validation_stats().total(), 0);
    assert!(logs.lock().unwrap().is_empty());

    cleanup_debug_config();
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_callback_marks_repeated_messages() {
    init_debug_config(DebugConfig { severity: DebugSeverity::All, panic_on_error: false });
    let logs = capture_logs();

    emit(vk::DebugUtilsMessageSeverityFlagsEXT::INFO, c"same text");
    emit(vk::DebugUtilsMessageSeverityFlagsEXT::INFO, c"same text");

    let entries = logs.lock().unwrap().clone();
    assert!(!entries[0].message.contains("[x"));
    assert!(entries[1].message.contains("[x2]"));
    assert_eq!(validation_stats().info, 2);

    cleanup_debug_config();
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_callback_without_config_is_silent() {
    cleanup_debug_config();
    let logs = capture_logs();

    emit(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR, c"after teardown");
    assert!(logs.lock().unwrap().is_empty());

    Engine::reset_logger();
}
