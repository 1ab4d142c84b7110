use thiserror::Error;

/// Spending used when a free-text override cannot be read.
pub const DEFAULT_CUSTOM_SPENDING: f64 = 100_000.0;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MoneyParseError {
    #[error("amount is empty")]
    Empty,
    #[error("amount {0:?} is not a number")]
    Invalid(String),
    #[error("amount {0:?} is not finite")]
    NotFinite(String),
}

/// Parses a dollar amount typed by a user, e.g. `"100,000"` or `" 2500.5 "`.
pub fn parse_money(raw: &str) -> Result<f64, MoneyParseError> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return Err(MoneyParseError::Empty);
    }
    let value = cleaned
        .parse::<f64>()
        .map_err(|_| MoneyParseError::Invalid(raw.to_string()))?;
    if !value.is_finite() {
        return Err(MoneyParseError::NotFinite(raw.to_string()));
    }
    Ok(value)
}

pub fn parse_money_or_default(raw: &str) -> f64 {
    match parse_money(raw) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("{e}; using {DEFAULT_CUSTOM_SPENDING}");
            DEFAULT_CUSTOM_SPENDING
        }
    }
}

/// Whole-dollar amount with thousands separators: `4000000.4` -> `"$4,000,000"`.
pub fn format_currency(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 && grouped.chars().any(|c| c != '0' && c != ',') {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

pub fn format_percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}
