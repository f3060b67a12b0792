use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Fixed number of decimals of the bridged native token
pub const NATIVE_DECIMALS: usize = 18;

/// Native token amount held in minimal units (wei-style, 18 decimals)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct NativeAmount {
    /// Raw amount in smallest unit
    raw: U256,
}

impl NativeAmount {
    /// Creates an amount from minimal units
    pub fn from_raw(raw: U256) -> Self {
        Self { raw }
    }

    /// Raw amount in smallest unit
    pub fn raw(&self) -> U256 {
        self.raw
    }

    /// Parses a decimal string such as `"1.5"` into minimal units.
    ///
    /// Conversion is exact: more than 18 fractional digits is an error
    /// rather than a rounding.
    pub fn parse(input: &str) -> Result<Self> {
        let text = input.trim();
        if text.is_empty() {
            return Err(Error::InvalidAmount("amount is empty".to_string()));
        }

        let (whole, fraction) = match text.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (text, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(Error::InvalidAmount(format!("'{}' has no digits", input)));
        }

        let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !is_digits(whole) || !is_digits(fraction) {
            return Err(Error::InvalidAmount(format!("'{}' is not a decimal number", input)));
        }

        if fraction.len() > NATIVE_DECIMALS {
            return Err(Error::InvalidAmount(format!(
                "'{}' has more than {} decimal places",
                input, NATIVE_DECIMALS
            )));
        }

        let overflow = || Error::InvalidAmount(format!("'{}' is too large", input));

        let whole = if whole.is_empty() {
            U256::zero()
        } else {
            U256::from_dec_str(whole).map_err(|_| overflow())?
        };

        let fraction = if fraction.is_empty() {
            U256::zero()
        } else {
            let padded = format!("{:0<width$}", fraction, width = NATIVE_DECIMALS);
            U256::from_dec_str(&padded).map_err(|_| overflow())?
        };

        let raw = whole
            .checked_mul(unit())
            .and_then(|scaled| scaled.checked_add(fraction))
            .ok_or_else(overflow)?;

        if raw.is_zero() {
            return Err(Error::InvalidAmount("amount must be greater than zero".to_string()));
        }

        Ok(Self { raw })
    }
}

fn unit() -> U256 {
    U256::exp10(NATIVE_DECIMALS)
}

impl fmt::Display for NativeAmount {
    /// Canonical decimal form: no trailing fractional zeros, no trailing dot
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.raw / unit();
        let fraction = self.raw % unit();

        if fraction.is_zero() {
            return write!(f, "{}", whole);
        }

        let digits = format!("{:0>width$}", fraction.to_string(), width = NATIVE_DECIMALS);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}
