//! Tests for attribute number parsing.

use renderer::NumberFormat;

fn european() -> NumberFormat {
    NumberFormat {
        decimal_separator: ',',
        group_separator: '.',
        currency_symbol: "€".to_string(),
    }
}

// ============================================================================
// parse
// ============================================================================

#[test]
fn test_parse_plain_numbers() {
    let format = NumberFormat::default();
    assert_eq!(format.parse("17.5"), Some(17.5));
    assert_eq!(format.parse("0"), Some(0.0));
    assert_eq!(format.parse(".5"), Some(0.5));
    assert_eq!(format.parse("12."), Some(12.0));
    assert_eq!(format.parse("+3"), Some(3.0));
}

#[test]
fn test_parse_negative_forms() {
    let format = NumberFormat::default();
    assert_eq!(format.parse("-$5.00"), Some(-5.0));
    assert_eq!(format.parse("$-5.00"), Some(-5.0));
    assert_eq!(format.parse("(2,000.00)"), Some(-2000.0));
    assert_eq!(format.parse("($2,000.00)"), Some(-2000.0));
    assert_eq!(format.parse("5-"), Some(-5.0));
}

#[test]
fn test_group_separator_only_in_integer_part() {
    let format = NumberFormat::default();
    assert_eq!(format.parse("1,234,567.89"), Some(1_234_567.89));
    assert_eq!(format.parse("1,234.5,0"), None);
}

#[test]
fn test_parse_is_locale_explicit() {
    let format = european();
    assert_eq!(format.parse("1.234,50 €"), Some(1234.5));
    assert_eq!(format.parse("€1.234,50"), Some(1234.5));
    // The US reading of the same text is rejected rather than misread
    assert_eq!(format.parse("$1,234.50"), None);
    assert_eq!(NumberFormat::default().parse("1.234,50"), None);
}

#[test]
fn test_parse_or_zero() {
    let format = NumberFormat::default();
    assert_eq!(format.parse_or_zero(Some("$1,234.50")), 1234.5);
    assert_eq!(format.parse_or_zero(Some("N/A")), 0.0);
    assert_eq!(format.parse_or_zero(Some("")), 0.0);
    assert_eq!(format.parse_or_zero(None), 0.0);
}

#[test]
fn test_parse_rejects_non_finite_and_exponents() {
    let format = NumberFormat::default();
    assert_eq!(format.parse("NaN"), None);
    assert_eq!(format.parse("-inf"), None);
    assert_eq!(format.parse("1E3"), None);
    assert_eq!(format.parse("1 000"), None);
}

// ============================================================================
// format_currency
// ============================================================================

#[test]
fn test_format_currency_parses_back() {
    let format = NumberFormat::default();
    for value in [0.0, 0.5, 12.34, 1_000.0, 1_234_567.89, 20_000_000.0, -42.1] {
        let text = format.format_currency(value);
        let parsed = format.parse(&text).unwrap();
        assert!((parsed - value).abs() < 0.005, "{} -> {} -> {}", value, text, parsed);
    }
}

#[test]
fn test_format_currency_custom_separators() {
    assert_eq!(european().format_currency(1234.5), "€1.234,50");
}

#[test]
fn test_number_format_from_json() {
    let format: NumberFormat = serde_json::from_str(r#"{"currency_symbol": "£"}"#).unwrap();
    assert_eq!(format.currency_symbol, "£");
    assert_eq!(format.decimal_separator, '.');
    assert_eq!(format.group_separator, ',');
}
