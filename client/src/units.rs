//! Base-unit integers and their fixed-decimal display form.
//!
//! Everything that talks to a contract carries `U256` base units. Strings only
//! appear at the edges: user input on the way in, display values on the way out.

use crate::error::{ClientError, Result};
use regex::Regex;
use std::sync::OnceLock;

// Expanded apart from the crate's `Result` alias, which the macro output
// would otherwise pick up.
mod u256 {
    uint::construct_uint! {
        pub struct U256(4);
    }
}

pub use u256::U256;

/// Decimals of both the staking token and the native currency.
pub const DECIMALS: usize = 18;

fn amount_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([0-9]*)(?:\.([0-9]*))?$").expect("static regex"))
}

/// Parse a non-negative decimal string into base units.
pub fn parse_units(value: &str, decimals: usize) -> Result<U256> {
    let value = value.trim();
    let caps = amount_pattern()
        .captures(value)
        .ok_or(ClientError::InvalidAmount)?;
    let whole = caps.get(1).map_or("", |m| m.as_str());
    let fraction = caps.get(2).map_or("", |m| m.as_str());
    if whole.is_empty() && fraction.is_empty() {
        return Err(ClientError::InvalidAmount);
    }
    if fraction.len() > decimals {
        return Err(ClientError::InvalidAmount);
    }

    let scale = U256::exp10(decimals);
    let whole = if whole.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(whole).map_err(|_| ClientError::InvalidAmount)?
    };
    let fraction = if fraction.is_empty() {
        U256::zero()
    } else {
        let padded = format!("{:0<width$}", fraction, width = decimals);
        U256::from_dec_str(&padded).map_err(|_| ClientError::InvalidAmount)?
    };

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction))
        .ok_or(ClientError::InvalidAmount)
}

/// Parse an amount the user typed; zero is rejected along with malformed input.
pub fn parse_positive_amount(value: &str) -> Result<U256> {
    let amount = parse_units(value, DECIMALS)?;
    if amount.is_zero() {
        return Err(ClientError::InvalidAmount);
    }
    Ok(amount)
}

/// Shortest exact decimal rendering of `value` base units.
pub fn format_units(value: U256, decimals: usize) -> String {
    let (whole, fraction) = value.div_mod(U256::exp10(decimals));
    if fraction.is_zero() {
        return whole.to_string();
    }
    let fraction = format!("{:0>width$}", fraction.to_string(), width = decimals);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

pub fn format_ether(value: U256) -> String {
    format_units(value, DECIMALS)
}

/// Parse a JSON-RPC hex quantity (`0x1a`).
pub fn parse_quantity(value: &str) -> Result<U256> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| ClientError::Abi(format!("quantity without 0x prefix: {}", value)))?;
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16)
        .map_err(|_| ClientError::Abi(format!("bad hex quantity: {}", value)))
}

pub fn to_quantity(value: U256) -> String {
    format!("0x{:x}", value)
}
