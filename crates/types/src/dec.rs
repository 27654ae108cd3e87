//! Fixed-point decimals with the chain's 18-digit precision.
//!
//! Rewards, commission and delegator shares arrive as decimal strings such as
//! `"1234.567890123456789000"`. They are kept exact (scaled big integers) so
//! that sums can be taken before the single truncation to base units.

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use crate::coin::Coin;

/// Number of fractional digits carried by on-chain decimals.
pub const DEC_PRECISION: usize = 18;

const DEC_SCALE: u64 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecError {
    #[error("empty decimal string")]
    Empty,
    #[error("invalid decimal string: {0}")]
    Invalid(String),
    #[error("decimal {0} has more than 18 fractional digits")]
    TooPrecise(String),
}

/// Exact decimal, stored as an integer scaled by 10^18.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dec(BigInt);

fn scale() -> BigInt {
    BigInt::from(DEC_SCALE)
}

impl Dec {
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    pub fn from_int(value: u128) -> Self {
        Self(BigInt::from(value) * scale())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Drop the fractional part. Negative values truncate to zero, values
    /// beyond `u128` saturate.
    pub fn truncate(&self) -> u128 {
        if self.0.is_negative() {
            return 0;
        }
        (&self.0 / scale()).to_u128().unwrap_or(u128::MAX)
    }

    /// `self * other`, truncated to 18 fractional digits.
    pub fn mul(&self, other: &Dec) -> Dec {
        Dec(&self.0 * &other.0 / scale())
    }

    /// `self / other`, truncated to 18 fractional digits. `None` on a zero divisor.
    pub fn checked_div(&self, other: &Dec) -> Option<Dec> {
        if other.is_zero() {
            return None;
        }
        Some(Dec(&self.0 * scale() / &other.0))
    }
}

impl FromStr for Dec {
    type Err = DecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DecError::Empty);
        }

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (unsigned, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !all_digits(int_part)
            || !all_digits(frac_part)
            || (unsigned.ends_with('.') && frac_part.is_empty())
        {
            return Err(DecError::Invalid(s.to_string()));
        }
        if frac_part.len() > DEC_PRECISION {
            return Err(DecError::TooPrecise(s.to_string()));
        }

        let mut digits = String::with_capacity(int_part.len() + DEC_PRECISION);
        digits.push_str(if int_part.is_empty() { "0" } else { int_part });
        digits.push_str(frac_part);
        for _ in frac_part.len()..DEC_PRECISION {
            digits.push('0');
        }

        let magnitude = BigInt::parse_bytes(digits.as_bytes(), 10)
            .ok_or_else(|| DecError::Invalid(s.to_string()))?;
        Ok(Dec(if negative { -magnitude } else { magnitude }))
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.abs();
        let int_part = &magnitude / scale();
        let frac_part = &magnitude % scale();
        if self.0.is_negative() {
            f.write_str("-")?;
        }
        write!(
            f,
            "{}.{:0>width$}",
            int_part,
            frac_part.to_string(),
            width = DEC_PRECISION
        )
    }
}

impl Add for Dec {
    type Output = Dec;

    fn add(self, other: Dec) -> Dec {
        Dec(self.0 + other.0)
    }
}

impl<'a> Add<&'a Dec> for Dec {
    type Output = Dec;

    fn add(self, other: &'a Dec) -> Dec {
        Dec(self.0 + &other.0)
    }
}

impl AddAssign<&Dec> for Dec {
    fn add_assign(&mut self, other: &Dec) {
        self.0 += &other.0;
    }
}

impl Serialize for Dec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A decimal amount of a single denomination (rewards, commission).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecCoin {
    pub denom: String,
    pub amount: Dec,
}

impl DecCoin {
    pub fn new<S: Into<String>>(denom: S, amount: Dec) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

/// Sum decimal coins per denom, then truncate each sum once.
///
/// Output is sorted by denom; zero sums are kept so callers can tell
/// "reported as zero" apart from "not reported".
pub fn sum_and_truncate<'a, I>(coins: I) -> Vec<Coin>
where
    I: IntoIterator<Item = &'a DecCoin>,
{
    let mut sums: BTreeMap<&'a str, Dec> = BTreeMap::new();
    for coin in coins {
        *sums.entry(coin.denom.as_str()).or_default() += &coin.amount;
    }
    sums.into_iter()
        .map(|(denom, total)| Coin::new(denom, total.truncate()))
        .collect()
}
