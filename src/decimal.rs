/// A fixed-scale decimal type for amounts produced by `decimal:<scale>` casts.
///
/// Wraps [`rust_decimal::Decimal`] with the invariant that the value always
/// carries exactly `scale` fractional digits, rounding half away from zero.
/// Serializes as a string in JSON so no precision is lost on the wire.
use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cast::CastError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedDecimal(Decimal);

impl FixedDecimal {
    /// Round `value` to `scale` digits and pad it so it always prints that many.
    pub fn new(value: Decimal, scale: u32) -> Self {
        let mut rounded =
            value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(scale);
        Self(rounded)
    }

    /// The zero value at the given scale.
    pub fn zero(scale: u32) -> Self {
        Self::new(Decimal::ZERO, scale)
    }

    /// Parse a textual amount and pin it to `scale`.
    pub fn parse(s: &str, scale: u32) -> Result<Self, CastError> {
        let trimmed = s.trim();
        let d = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|e| CastError::InvalidNumber(format!("'{s}': {e}")))?;
        Ok(Self::new(d, scale))
    }

    /// Number of fractional digits.
    pub fn scale(&self) -> u32 {
        self.0.scale()
    }

    /// Access the inner `Decimal`.
    pub fn inner(&self) -> &Decimal {
        &self.0
    }

    /// Consume and return the inner `Decimal`.
    pub fn into_inner(self) -> Decimal {
        self.0
    }
}

impl fmt::Display for FixedDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FixedDecimal {
    type Err = CastError;

    /// Keeps the scale written in the input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let d = Decimal::from_str(s.trim())
            .map_err(|e| CastError::InvalidNumber(format!("'{s}': {e}")))?;
        Ok(Self(d))
    }
}

impl From<Decimal> for FixedDecimal {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl Serialize for FixedDecimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for FixedDecimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
