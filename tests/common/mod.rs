//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use std::time::Duration;

/// Upper bound for anything that should happen "promptly"
pub fn test_timeout() -> Duration {
    Duration::from_secs(2)
}

/// Assert a duration lies within `tolerance` of `expected`
pub fn assert_duration_near(actual: Duration, expected: Duration, tolerance: Duration) {
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    assert!(
        diff <= tolerance,
        "Expected {:?} to be within {:?} of {:?}",
        actual,
        tolerance,
        expected
    );
}
