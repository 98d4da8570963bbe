//! Unit tests for fence error mapping
//!
//! No GPU required.

use super::*;

#[test]
fn test_fence_device_lost_maps_to_device_lost() {
    let ctx = EngineContext::with_default_logger();

    for action in ["wait for", "reset", "query"] {
        assert!(matches!(fence_error(&ctx, action, vk::Result::ERROR_DEVICE_LOST), Error::DeviceLost));
    }
}

#[test]
fn test_other_fence_failures_stay_backend_errors() {
    let ctx = EngineContext::with_default_logger();

    match fence_error(&ctx, "wait for", vk::Result::TIMEOUT) {
        Error::BackendError(message) => assert_eq!(message, "Failed to wait for fence: TIMEOUT"),
        other => panic!("unexpected error {:?}", other),
    }
    assert!(matches!(
        fence_error(&ctx, "reset", vk::Result::ERROR_OUT_OF_DEVICE_MEMORY),
        Error::BackendError(_)
    ));
}
