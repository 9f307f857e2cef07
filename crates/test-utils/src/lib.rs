//! Shared test utilities for the choropleth layer workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Test data path helpers
//! - Skip macros for optional test data
//! - Attribute data generators
//! - Common fixtures (endpoints, lot records, GeoJSON documents)
//! - Fake data providers that count and delay loads
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, fixtures};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;
pub mod providers;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use paths::*;
pub use providers::*;

/// Macro to skip a test if the required file is not found.
///
/// This is useful for tests that depend on external data files that may not
/// be present in all environments (e.g., a full county lot export).
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_test_file;
///
/// #[test]
/// fn test_full_county() {
///     let path = require_test_file!("clackamas_lots.geojson");
///     // Test code using path...
/// }
/// ```
///
/// If the file is not found, the test will print a skip message and return early.
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: Test file '{}' not found. Download test data or set TEST_DATA_DIR.",
                    $name
                );
                return;
            }
        }
    }};
}

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for per-channel approximate equality of two `Rgb` colors.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_rgb_approx_eq;
///
/// assert_rgb_approx_eq!(Rgb::new(254, 255, 217), Rgb::new(255, 255, 217), 1);
/// ```
#[macro_export]
macro_rules! assert_rgb_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let left = $left;
        let right = $right;
        let tolerance: i32 = $tolerance;
        let channels = [
            (left.r as i32 - right.r as i32).abs(),
            (left.g as i32 - right.g as i32).abs(),
            (left.b as i32 - right.b as i32).abs(),
        ];
        if channels.iter().any(|d| *d > tolerance) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  tolerance: `{}`",
                left, right, tolerance
            );
        }
    }};
}
