//! Two-stop OKLCH color gradient.
//!
//! A raw attribute value is mapped to a display color in four steps:
//!
//! 1. normalize against a [`DomainRange`] and clamp to [0, 1]
//! 2. ease the position with a fixed rational curve ([`smooth`])
//! 3. interpolate lightness, chroma and hue in OKLCH, taking the shorter arc
//!    around the hue circle
//! 4. convert OKLCH → OKLab → linear sRGB → gamma-encoded 8-bit sRGB,
//!    clipping out-of-gamut channels
//!
//! The conversion uses the published OKLab matrices (Björn Ottosson, 2020) and
//! the sRGB transfer function; no color library is involved.

use choropleth_common::{ColorStop, DomainRange, Oklch, Rgb};

/// Light yellow gradient start used by the land-value layers.
pub const LIGHT_YELLOW: Oklch = Oklch::new(0.9904, 0.0491, 107.26);

/// Deep blue gradient end used by the land-value layers.
pub const DEEP_BLUE: Oklch = Oklch::new(0.2604, 0.1097, 264.57);

/// Map `value` onto [0, 1] within `range`.
///
/// Values outside the range clamp to the nearest end. A degenerate range
/// (`min == max`, or non-finite bounds) and NaN values map to 0, i.e. the
/// gradient start color.
pub fn normalize(value: f64, range: &DomainRange) -> f64 {
    if range.is_degenerate() || value.is_nan() {
        return 0.0;
    }
    ((value - range.min) / range.span()).clamp(0.0, 1.0)
}

/// Easing curve `t² / (2(t² − t) + 1)`.
///
/// Symmetric around 0.5, flat near both ends. The denominator is never below
/// 0.5 for any real `t`.
pub fn smooth(t: f64) -> f64 {
    let square = t * t;
    square / (2.0 * (square - t) + 1.0)
}

/// Signed hue difference from `from` to `to` along the shorter arc.
///
/// The magnitude never exceeds 180 degrees.
pub fn hue_delta(from: f64, to: f64) -> f64 {
    let delta = to.rem_euclid(360.0) - from.rem_euclid(360.0);
    if delta.abs() > 180.0 {
        delta - 360.0 * delta.signum()
    } else {
        delta
    }
}

/// Interpolate between two OKLCH colors at position `t` (not eased here).
pub fn interpolate_oklch(start: &Oklch, end: &Oklch, t: f64) -> Oklch {
    let hue = start.h.rem_euclid(360.0);
    let delta = hue_delta(start.h, end.h);

    Oklch {
        l: start.l + t * (end.l - start.l),
        c: start.c + t * (end.c - start.c),
        h: (hue + t * delta + 360.0).rem_euclid(360.0),
    }
}

/// Convert an OKLCH color to 8-bit sRGB, clipping out-of-gamut channels.
pub fn oklch_to_rgb(color: &Oklch) -> Rgb {
    let [r, g, b] = oklch_to_linear_srgb(color);
    Rgb::new(encode_channel(r), encode_channel(g), encode_channel(b))
}

/// Convert an 8-bit sRGB color to OKLCH.
///
/// Hue is reported in [0, 360). For achromatic colors the hue is whatever
/// `atan2` yields for a near-zero vector and carries no meaning.
pub fn rgb_to_oklch(color: &Rgb) -> Oklch {
    let r = srgb_to_linear(color.r as f64 / 255.0);
    let g = srgb_to_linear(color.g as f64 / 255.0);
    let b = srgb_to_linear(color.b as f64 / 255.0);

    let l = (0.4122214708 * r + 0.5363325363 * g + 0.0514459929 * b).cbrt();
    let m = (0.2119034982 * r + 0.6806995451 * g + 0.1073969566 * b).cbrt();
    let s = (0.0883024619 * r + 0.2817188376 * g + 0.6299787005 * b).cbrt();

    let lightness = 0.2104542553 * l + 0.7936177850 * m - 0.0040720468 * s;
    let a = 1.9779984951 * l - 2.4285922050 * m + 0.4505937099 * s;
    let b = 0.0259040371 * l + 0.7827717662 * m - 0.8086757660 * s;

    Oklch {
        l: lightness,
        c: a.hypot(b),
        h: b.atan2(a).to_degrees().rem_euclid(360.0),
    }
}

/// OKLCH → linear-light sRGB, unclamped.
pub fn oklch_to_linear_srgb(color: &Oklch) -> [f64; 3] {
    let (sin, cos) = color.h.to_radians().sin_cos();
    let a = color.c * cos;
    let b = color.c * sin;

    let l = color.l + 0.3963377774 * a + 0.2158037573 * b;
    let m = color.l - 0.1055613458 * a - 0.0638541728 * b;
    let s = color.l - 0.0894841775 * a - 1.2914855480 * b;

    let (l, m, s) = (l * l * l, m * m * m, s * s * s);

    [
        4.0767416621 * l - 3.3077115913 * m + 0.2309699292 * s,
        -1.2684380046 * l + 2.6097574011 * m - 0.3413193965 * s,
        -0.0041960863 * l - 0.7034186147 * m + 1.7076147010 * s,
    ]
}

fn linear_to_srgb(x: f64) -> f64 {
    if x <= 0.0031308 {
        12.92 * x
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

fn srgb_to_linear(x: f64) -> f64 {
    if x <= 0.04045 {
        x / 12.92
    } else {
        ((x + 0.055) / 1.055).powf(2.4)
    }
}

// NaN saturates to 0 through the `as` cast.
fn encode_channel(linear: f64) -> u8 {
    (linear_to_srgb(linear) * 255.0).round().clamp(0.0, 255.0) as u8
}

/// A continuous gradient between two OKLCH endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OklchGradient {
    pub start: Oklch,
    pub end: Oklch,
}

impl Default for OklchGradient {
    fn default() -> Self {
        Self::new(LIGHT_YELLOW, DEEP_BLUE)
    }
}

impl OklchGradient {
    pub fn new(start: Oklch, end: Oklch) -> Self {
        Self { start, end }
    }

    /// Color at normalized position `t` ∈ [0, 1] (eased, then interpolated).
    pub fn color_at(&self, t: f64) -> Rgb {
        let eased = smooth(t.clamp(0.0, 1.0));
        oklch_to_rgb(&interpolate_oklch(&self.start, &self.end, eased))
    }

    /// Color for a raw attribute value within `range`.
    pub fn interpolate(&self, value: f64, range: &DomainRange) -> Rgb {
        self.color_at(normalize(value, range))
    }

    /// `steps` evenly spaced stops from `range.min` to `range.max` inclusive.
    ///
    /// Used for legend previews; a single step yields the start color.
    pub fn sample(&self, range: &DomainRange, steps: usize) -> Vec<ColorStop> {
        match steps {
            0 => Vec::new(),
            1 => vec![ColorStop {
                value: range.min,
                color: self.color_at(0.0),
            }],
            _ => {
                let last = (steps - 1) as f64;
                (0..steps)
                    .map(|i| {
                        let t = i as f64 / last;
                        ColorStop {
                            value: range.min + t * range.span(),
                            color: self.color_at(t),
                        }
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_fixed_points() {
        assert_eq!(smooth(0.0), 0.0);
        assert_eq!(smooth(0.5), 0.5);
        assert_eq!(smooth(1.0), 1.0);
        assert!((smooth(0.25) - 0.1).abs() < 1e-12);
        assert!((smooth(0.75) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_hue_delta_takes_short_arc() {
        assert_eq!(hue_delta(10.0, 350.0), -20.0);
        assert_eq!(hue_delta(350.0, 10.0), 20.0);
        assert!((hue_delta(107.26, 264.57) - 157.31).abs() < 1e-9);
        assert_eq!(hue_delta(0.0, 180.0), 180.0);
        assert_eq!(hue_delta(-90.0, 90.0), -180.0);
        assert_eq!(hue_delta(720.0, 30.0), 30.0);
    }

    #[test]
    fn test_white_and_black() {
        assert_eq!(oklch_to_rgb(&Oklch::new(1.0, 0.0, 0.0)), Rgb::new(255, 255, 255));
        assert_eq!(oklch_to_rgb(&Oklch::new(0.0, 0.0, 0.0)), Rgb::new(0, 0, 0));
    }

    #[test]
    fn test_pure_red() {
        assert_eq!(
            oklch_to_rgb(&Oklch::new(0.627955, 0.257683, 29.2339)),
            Rgb::new(255, 0, 0)
        );
    }

    #[test]
    fn test_rgb_to_oklch_inverts() {
        for rgb in [Rgb::new(255, 255, 217), Rgb::new(8, 29, 88), Rgb::new(72, 151, 143)] {
            assert_eq!(oklch_to_rgb(&rgb_to_oklch(&rgb)), rgb);
        }
    }

    #[test]
    fn test_sample_endpoints() {
        let gradient = OklchGradient::default();
        let range = DomainRange::new(0.0, 100.0);
        let stops = gradient.sample(&range, 5);
        assert_eq!(stops.len(), 5);
        assert_eq!(stops[0].value, 0.0);
        assert_eq!(stops[4].value, 100.0);
        assert_eq!(stops[0].color, Rgb::new(255, 255, 217));
        assert_eq!(stops[4].color, Rgb::new(8, 29, 88));
        assert!(gradient.sample(&range, 0).is_empty());
        assert_eq!(gradient.sample(&range, 1).len(), 1);
    }
}
