//! Conversion between human-entered decimal amounts and 18-decimal base units.
//!
//! Conversion is exact. Digits past the 18th fractional place are truncated,
//! never rounded.

use alloy_primitives::{Address, U256};
use thiserror::Error;

pub const TOKEN_DECIMALS: usize = 18;

/// One whole token in base units (10^18).
pub const ONE_TOKEN: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

const BPS_PER_PERCENT: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is required")]
    Empty,
    #[error("'{0}' is not a decimal number")]
    NotANumber(String),
    #[error("amount must be greater than zero")]
    NotPositive,
    #[error("amount does not fit in 256 bits")]
    TooLarge,
}

/// Parses a decimal string such as `"12.5"` into base units.
///
/// Rejects empty input, signs, exponents, `inf`/`NaN` and anything that is
/// zero once truncated to 18 decimals.
pub fn parse_amount(input: &str) -> Result<U256, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    if let Some(rest) = trimmed.strip_prefix('-') {
        return match split_decimal(rest) {
            Some(_) => Err(AmountError::NotPositive),
            None => Err(AmountError::NotANumber(trimmed.to_owned())),
        };
    }

    let (whole, fraction) =
        split_decimal(trimmed).ok_or_else(|| AmountError::NotANumber(trimmed.to_owned()))?;

    let mut fraction = fraction.chars().take(TOKEN_DECIMALS).collect::<String>();
    while fraction.len() < TOKEN_DECIMALS {
        fraction.push('0');
    }

    let digits = format!("{whole}{fraction}");
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Err(AmountError::NotPositive);
    }

    let value = U256::from_str_radix(digits, 10).map_err(|_| AmountError::TooLarge)?;
    if value.is_zero() {
        return Err(AmountError::NotPositive);
    }
    Ok(value)
}

fn split_decimal(input: &str) -> Option<(&str, &str)> {
    let (whole, fraction) = match input.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (input, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return None;
    }
    Some((whole, fraction))
}

/// Renders base units as a decimal token amount with trailing zeros trimmed.
pub fn format_amount(value: U256) -> String {
    let whole = value / ONE_TOKEN;
    let fraction = value % ONE_TOKEN;
    if fraction.is_zero() {
        return whole.to_string();
    }

    let fraction = format!("{:0>width$}", fraction.to_string(), width = TOKEN_DECIMALS);
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}

/// Renders a basis-point share (`1234` → `"12.34"`).
pub fn format_share_bps(bps: U256) -> String {
    let divisor = U256::from(BPS_PER_PERCENT);
    let whole = bps / divisor;
    let rem = (bps % divisor).to::<u64>();
    format!("{whole}.{rem:02}")
}

/// `0x1234...abcd` form used in the dashboard header.
pub fn abbreviate_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
