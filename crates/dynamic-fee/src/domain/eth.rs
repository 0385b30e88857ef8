pub use alloy::primitives::{Address, B256, Bytes, TxHash, U256};
use {
    alloy::primitives::utils::{ParseUnits, format_units, parse_units},
    thiserror::Error,
};

/// Maximum number of characters of a failure reason that get surfaced.
pub const MAX_REASON_CHARS: usize = 150;

/// Token amounts are expressed in 18 decimals unless configured otherwise.
pub const DEFAULT_DECIMALS: u8 = 18;

/// A transaction target, value and calldata triple.
pub type EncodedInteraction = (Address, U256, Bytes);

#[derive(Debug, Error, Eq, PartialEq)]
#[error("invalid token amount {input:?}: {reason}")]
pub struct InvalidAmount {
    pub input: String,
    pub reason: String,
}

/// Parses a user supplied decimal amount into base units of a token with
/// `decimals` decimals.
///
/// This is the lenient variant used for previews: anything that is not a
/// non-negative decimal number is zero.
pub fn parse_amount(input: &str, decimals: u8) -> U256 {
    parse_amount_strict(input, decimals).unwrap_or(U256::ZERO)
}

/// Parses a user supplied decimal amount into base units, reporting what is
/// wrong with it.
pub fn parse_amount_strict(input: &str, decimals: u8) -> Result<U256, InvalidAmount> {
    let trimmed = input.trim();
    let invalid = |reason: &str| InvalidAmount {
        input: input.to_owned(),
        reason: reason.to_owned(),
    };
    if trimmed.is_empty() {
        return Err(invalid("empty"));
    }
    if trimmed.starts_with('-') {
        return Err(invalid("negative"));
    }
    match parse_units(trimmed, decimals) {
        Ok(ParseUnits::U256(value)) => Ok(value),
        Ok(ParseUnits::I256(_)) => Err(invalid("negative")),
        Err(err) => Err(invalid(&err.to_string())),
    }
}

/// Formats base units as a decimal token amount.
pub fn format_amount(value: U256, decimals: u8) -> String {
    format_units(value, decimals).unwrap_or_else(|_| value.to_string())
}

/// Formats a fee in hundredths of a basis point as a percentage, i.e. `3000`
/// becomes `0.30%`.
pub fn format_fee(fee: u32) -> String {
    format!("{:.2}%", f64::from(fee) / 10_000.)
}

/// Cuts a failure reason down to [`MAX_REASON_CHARS`] characters.
pub fn truncate_reason(reason: &str) -> String {
    reason.chars().take(MAX_REASON_CHARS).collect()
}
