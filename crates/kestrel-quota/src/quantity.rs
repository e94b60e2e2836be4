//! Resource quantities such as `4`, `500m`, `1.5Gi` or `10k`.
//!
//! A quantity is a decimal number with an optional suffix. Decimal suffixes
//! (`m`, `k`, `M`, `G`, `T`, `P`, `E`) scale by powers of 1000 and binary
//! suffixes (`Ki` .. `Ei`) by powers of 1024. Values are held in
//! thousandths; anything finer is rounded up.

use std::fmt;
use std::str::FromStr;

use crate::error::QuantityError;

/// A parsed amount of some resource, in thousandths of a unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity {
    millis: i128,
}

/// Scale of each suffix, in thousandths of a unit.
const SUFFIXES: &[(&str, i128)] = &[
    ("m", 1),
    ("", 1_000),
    ("k", 1_000 * 1_000),
    ("M", 1_000 * 1_000_000),
    ("G", 1_000 * 1_000_000_000),
    ("T", 1_000 * 1_000_000_000_000),
    ("P", 1_000 * 1_000_000_000_000_000),
    ("E", 1_000 * 1_000_000_000_000_000_000),
    ("Ki", 1_000 << 10),
    ("Mi", 1_000 << 20),
    ("Gi", 1_000 << 30),
    ("Ti", 1_000 << 40),
    ("Pi", 1_000 << 50),
    ("Ei", 1_000 << 60),
];

/// Longest digit run accepted on either side of the decimal point.
const MAX_DIGITS: usize = 18;

impl Quantity {
    pub const ZERO: Self = Self { millis: 0 };

    pub const fn from_units(units: i64) -> Self {
        Self {
            millis: units as i128 * 1_000,
        }
    }

    pub const fn from_millis(millis: i64) -> Self {
        Self {
            millis: millis as i128,
        }
    }

    pub fn parse(input: &str) -> Result<Self, QuantityError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(QuantityError::Empty);
        }

        let (negative, unsigned) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };

        let number_len = unsigned
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(unsigned.len());
        let (number, suffix) = unsigned.split_at(number_len);

        let (whole, fraction) = match number.split_once('.') {
            Some((w, f)) => (w, f),
            None => (number, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(QuantityError::malformed(input, "missing digits"));
        }
        if fraction.contains('.') {
            return Err(QuantityError::malformed(input, "more than one decimal point"));
        }
        if whole.len() > MAX_DIGITS || fraction.len() > MAX_DIGITS {
            return Err(QuantityError::Overflow(input.to_string()));
        }

        let scale = SUFFIXES
            .iter()
            .find(|(name, _)| *name == suffix)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| QuantityError::UnknownSuffix {
                input: input.to_string(),
                suffix: suffix.to_string(),
            })?;

        let whole_value = parse_digits(whole);
        let fraction_value = parse_digits(fraction);
        let denominator = 10_i128.pow(fraction.len() as u32);

        let overflow = || QuantityError::Overflow(input.to_string());
        let whole_millis = whole_value.checked_mul(scale).ok_or_else(overflow)?;
        let fraction_scaled = fraction_value.checked_mul(scale).ok_or_else(overflow)?;
        let fraction_millis = (fraction_scaled + denominator - 1) / denominator;
        let magnitude = whole_millis
            .checked_add(fraction_millis)
            .ok_or_else(overflow)?;

        Ok(Self {
            millis: if negative { -magnitude } else { magnitude },
        })
    }

    pub fn millis(&self) -> i128 {
        self.millis
    }

    /// Whole units, rounded up.
    pub fn units_ceil(&self) -> i128 {
        self.millis.div_euclid(1_000) + i128::from(self.millis.rem_euclid(1_000) != 0)
    }

    pub fn is_negative(&self) -> bool {
        self.millis < 0
    }

    pub fn is_zero(&self) -> bool {
        self.millis == 0
    }
}

fn parse_digits(digits: &str) -> i128 {
    digits
        .bytes()
        .fold(0_i128, |acc, d| acc * 10 + i128::from(d - b'0'))
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Canonical form: whole units when exact, thousandths otherwise.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.millis % 1_000 == 0 {
            write!(f, "{}", self.millis / 1_000)
        } else {
            write!(f, "{}m", self.millis)
        }
    }
}
