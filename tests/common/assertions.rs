//! Assertion utilities for testing.
//!
//! This module provides helper functions for making assertions in tests,
//! particularly for floating-point comparisons.

/// Default epsilon for floating-point comparisons
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Assert that two floating-point values are approximately equal.
///
/// # Panics
///
/// Panics if the absolute difference between `actual` and `expected` is greater than `epsilon`.
pub fn assert_approx_eq(actual: f64, expected: f64, epsilon: Option<f64>) {
    let epsilon = epsilon.unwrap_or(DEFAULT_EPSILON);
    let diff = (actual - expected).abs();

    assert!(
        diff <= epsilon,
        "Values not approximately equal: actual = {}, expected = {}, diff = {}, epsilon = {}",
        actual,
        expected,
        diff,
        epsilon
    );
}

/// Assert that `value` lies strictly between `low` and `high`
pub fn assert_strictly_between(value: f64, low: f64, high: f64) {
    assert!(
        value > low && value < high,
        "Value {} not strictly between {} and {}",
        value,
        low,
        high
    );
}

/// Assert that a JSON number field is approximately `expected`
pub fn assert_json_approx(json: &serde_json::Value, field: &str, expected: f64, epsilon: f64) {
    let actual = json[field]
        .as_f64()
        .unwrap_or_else(|| panic!("Field '{}' is not a number in {}", field, json));
    assert_approx_eq(actual, expected, Some(epsilon));
}
