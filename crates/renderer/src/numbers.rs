//! Parsing of currency-formatted attribute values.
//!
//! Attribute tables store numbers as display text ("$1,234.50",
//! "(2,000.00)", "17.5"). [`NumberFormat`] parses them with explicitly
//! configured separators so results never depend on the host locale.

use choropleth_common::ChoroplethError;
use serde::{Deserialize, Serialize};

/// Separators and currency symbol used when parsing attribute text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberFormat {
    pub decimal_separator: char,
    pub group_separator: char,
    pub currency_symbol: String,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            group_separator: ',',
            currency_symbol: "$".to_string(),
        }
    }
}

impl NumberFormat {
    /// Reject separator choices that make parsing ambiguous.
    pub fn validate(&self) -> Result<(), ChoroplethError> {
        let reserved = |ch: char| ch.is_ascii_digit() || "+-()".contains(ch);
        if self.decimal_separator == self.group_separator {
            return Err(ChoroplethError::InvalidConfig(format!(
                "decimal and group separator are both '{}'",
                self.decimal_separator
            )));
        }
        for (name, ch) in [
            ("decimal", self.decimal_separator),
            ("group", self.group_separator),
        ] {
            if reserved(ch) {
                return Err(ChoroplethError::InvalidConfig(format!(
                    "{} separator '{}' is a digit, sign or parenthesis",
                    name, ch
                )));
            }
        }
        Ok(())
    }

    /// Parse `text` as a plain or currency-formatted decimal number.
    ///
    /// Accepted: surrounding whitespace, a currency symbol before or after the
    /// number, a leading or trailing sign, accounting parentheses for
    /// negatives, group separators in the integer part, and one decimal
    /// separator. Exponents and non-finite values are rejected.
    pub fn parse(&self, text: &str) -> Option<f64> {
        let mut body = text.trim();
        let mut negative = false;

        if let Some(inner) = body.strip_prefix('(').and_then(|b| b.strip_suffix(')')) {
            negative = true;
            body = inner.trim();
        }

        body = self.strip_currency(body);

        if let Some(rest) = body.strip_prefix('-') {
            negative = !negative;
            body = rest;
        } else if let Some(rest) = body.strip_suffix('-') {
            negative = !negative;
            body = rest;
        } else if let Some(rest) = body.strip_prefix('+').or_else(|| body.strip_suffix('+')) {
            body = rest;
        }

        // "-$5" and "$-5" are both valid currency text
        body = self.strip_currency(body.trim());

        let magnitude = self.parse_unsigned(body)?;
        Some(if negative { -magnitude } else { magnitude })
    }

    /// Parse `text`, degrading missing or malformed input to `0.0`.
    pub fn parse_or_zero(&self, text: Option<&str>) -> f64 {
        text.and_then(|t| self.parse(t)).unwrap_or(0.0)
    }

    /// Format `value` as currency with two decimals, e.g. `$1,234.50`.
    ///
    /// For finite values the output always parses back with [`Self::parse`].
    /// Non-finite values are returned unformatted.
    pub fn format_currency(&self, value: f64) -> String {
        if !value.is_finite() {
            return value.to_string();
        }
        let cents = (value.abs() * 100.0).round();
        let fraction = (cents % 100.0) as u64;

        // f64 Display keeps every digit, so values past u64::MAX still group
        let digits = (cents / 100.0).trunc().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(self.group_separator);
            }
            grouped.push(ch);
        }

        let sign = if value < 0.0 && cents > 0.0 { "-" } else { "" };
        format!(
            "{}{}{}{}{:02}",
            sign, self.currency_symbol, grouped, self.decimal_separator, fraction
        )
    }

    fn strip_currency<'a>(&self, text: &'a str) -> &'a str {
        if self.currency_symbol.is_empty() {
            return text;
        }
        text.strip_prefix(self.currency_symbol.as_str())
            .or_else(|| text.strip_suffix(self.currency_symbol.as_str()))
            .map(str::trim)
            .unwrap_or(text)
    }

    fn parse_unsigned(&self, text: &str) -> Option<f64> {
        let (integer, fraction) = match text.split_once(self.decimal_separator) {
            Some((integer, fraction)) => (integer, Some(fraction)),
            None => (text, None),
        };

        let mut normalized = String::with_capacity(text.len());
        for ch in integer.chars() {
            if ch.is_ascii_digit() {
                normalized.push(ch);
            } else if ch != self.group_separator {
                return None;
            }
        }

        if let Some(fraction) = fraction {
            if !fraction.chars().all(|ch| ch.is_ascii_digit()) {
                return None;
            }
            normalized.push('.');
            normalized.push_str(fraction);
        }

        if !normalized.chars().any(|ch| ch.is_ascii_digit()) {
            return None;
        }

        normalized.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}
