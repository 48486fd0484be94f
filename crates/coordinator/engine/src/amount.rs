//! Conversions between decimal token amounts and their on-chain integer form.

use crate::error::BuildError;

/// Parses a decimal amount such as `"1.5"` into base units of a token with `decimals`.
///
/// # Errors
///
/// [`BuildError::Validation`] unless the amount is a positive number with at most `decimals`
/// fractional digits that fits in a `u128`.
pub fn parse_amount(amount: &str, decimals: u32) -> Result<u128, BuildError> {
    let invalid = || BuildError::validation(format!("invalid amount {amount:?}"));

    let amount = amount.trim();
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > decimals as usize {
        return Err(BuildError::validation(format!(
            "amount {amount} has more than {decimals} decimal places"
        )));
    }

    let scale = 10u128.checked_pow(decimals).ok_or_else(invalid)?;
    let whole = if whole.is_empty() { 0 } else { whole.parse::<u128>().map_err(|_| invalid())? };
    let fraction = if fraction.is_empty() {
        0
    } else {
        let padding = 10u128.pow(decimals - fraction.len() as u32);
        fraction.parse::<u128>().map_err(|_| invalid())? * padding
    };

    let value = whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(|| BuildError::validation(format!("amount {amount} is too large")))?;

    if value == 0 {
        return Err(BuildError::validation("amount must be positive"));
    }

    Ok(value)
}

/// Formats base units of a token with `decimals` as a decimal string without trailing zeros.
pub fn format_amount(value: u128, decimals: u32) -> String {
    let Some(scale) = 10u128.checked_pow(decimals) else {
        return value.to_string();
    };

    let whole = value / scale;
    let fraction = value % scale;
    if fraction == 0 {
        return whole.to_string();
    }

    let fraction = format!("{fraction:0width$}", width = decimals as usize);
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}
