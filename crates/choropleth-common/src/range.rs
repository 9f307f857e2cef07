//! Value normalization bounds.

use serde::{Deserialize, Serialize};

/// `(min, max)` bounds used to map a raw attribute value onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainRange {
    pub min: f64,
    pub max: f64,
}

impl DomainRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Width of the range (may be zero or negative).
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// True when the range cannot be used as a divisor.
    pub fn is_degenerate(&self) -> bool {
        let span = self.span();
        span == 0.0 || !span.is_finite()
    }
}
