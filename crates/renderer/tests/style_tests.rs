//! Tests for gradient style configuration.

use choropleth_common::Oklch;
use renderer::style::Endpoint;
use renderer::{GradientStyle, OklchGradient, StyleConfig};
use test_utils::{assert_rgb_approx_eq, endpoints, temp_test_dir, write_test_file};

const STYLES: &str = r##"{
    "version": "1.1",
    "styles": {
        "land_value": {
            "description": "Light yellow to deep blue",
            "start": {"l": 0.9904, "c": 0.0491, "h": 107.26},
            "end": {"l": 0.2604, "c": 0.1097, "h": 264.57}
        },
        "greens": {
            "start": "#f7fcf5",
            "end": "#00441b"
        },
        "defaults": {}
    }
}"##;

#[test]
fn test_parse_style_config() {
    let config = StyleConfig::from_json(STYLES).unwrap();
    assert_eq!(config.version, "1.1");
    assert_eq!(config.styles.len(), 3);
    config.validate().unwrap();

    let land_value = config.get_style("land_value").unwrap();
    assert_eq!(land_value.to_gradient().unwrap(), OklchGradient::default());
    assert!(config.get_style("missing").is_none());
}

#[test]
fn test_version_defaults() {
    let config = StyleConfig::from_json(r#"{"styles": {}}"#).unwrap();
    assert_eq!(config.version, "1.0");
}

#[test]
fn test_omitted_endpoints_use_land_value_colors() {
    let config = StyleConfig::from_json(STYLES).unwrap();
    let gradient = config.get_style("defaults").unwrap().to_gradient().unwrap();
    assert_eq!(gradient, OklchGradient::default());
}

#[test]
fn test_hex_endpoints_round_trip_through_gradient() {
    let config = StyleConfig::from_json(STYLES).unwrap();
    let gradient = config.get_style("greens").unwrap().to_gradient().unwrap();
    assert_rgb_approx_eq!(gradient.color_at(0.0), choropleth_common::Rgb::new(0xf7, 0xfc, 0xf5), 1);
    assert_rgb_approx_eq!(gradient.color_at(1.0), choropleth_common::Rgb::new(0x00, 0x44, 0x1b), 1);
}

#[test]
fn test_invalid_style_fails_validation() {
    let config = StyleConfig::from_json(
        r##"{"styles": {"broken": {"start": "#12345", "end": "#000000"}}}"##,
    )
    .unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("broken"), "{}", err);
}

#[test]
fn test_malformed_json_is_config_error() {
    let err = StyleConfig::from_json("{not json").unwrap_err();
    assert!(err.to_string().contains("style JSON"), "{}", err);
}

#[test]
fn test_load_from_file() {
    let dir = temp_test_dir();
    let path = write_test_file(dir.path(), "styles.json", STYLES);
    let config = StyleConfig::from_file(&path).unwrap();
    assert!(config.get_style("greens").is_some());

    assert!(StyleConfig::from_file(dir.path().join("missing.json")).is_err());
}

#[test]
fn test_default_style_matches_fixture_endpoints() {
    let style = GradientStyle::default();
    assert_eq!(style.start, Endpoint::Oklch(endpoints::START));
    assert_eq!(style.end, Endpoint::Oklch(endpoints::END));
    let gradient = style.to_gradient().unwrap();
    assert_rgb_approx_eq!(gradient.color_at(0.0), endpoints::START_RGB, 1);
}

#[test]
fn test_out_of_range_oklch_rejected() {
    let endpoint = Endpoint::Oklch(Oklch::new(0.5, -0.1, 10.0));
    assert!(endpoint.resolve().is_err());
}
