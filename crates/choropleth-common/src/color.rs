//! Color value types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ChoroplethError;

/// 8-bit sRGB display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` (or `rrggbb`) hex string.
    pub fn from_hex(hex: &str) -> Result<Self, ChoroplethError> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ChoroplethError::InvalidColor(hex.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| ChoroplethError::InvalidColor(hex.to_string()))
        };

        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Lowercase `#rrggbb` representation.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A color in the OKLCH cylindrical space.
///
/// `l` is lightness in [0, 1], `c` is chroma (>= 0), `h` is hue in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oklch {
    pub l: f64,
    pub c: f64,
    pub h: f64,
}

impl Oklch {
    pub const fn new(l: f64, c: f64, h: f64) -> Self {
        Self { l, c, h }
    }

    /// Check the components are finite and within their valid ranges.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.l.is_finite() && self.c.is_finite() && self.h.is_finite()) {
            return Err(format!("non-finite OKLCH component in {:?}", self));
        }
        if !(0.0..=1.0).contains(&self.l) {
            return Err(format!("lightness {} outside [0, 1]", self.l));
        }
        if self.c < 0.0 {
            return Err(format!("negative chroma {}", self.c));
        }
        Ok(())
    }
}
