//! Decimal price in major currency units, with conversion to the payment
//! gateway's minor unit.

use core::fmt;
use core::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors produced when building or converting a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The value is not a number (or a numeric string).
    #[error("amount must be a number")]
    NotANumber,
    /// The value is zero or negative, before or after conversion.
    #[error("amount must be greater than zero")]
    NotPositive,
    /// The value does not fit in the gateway's integer amount.
    #[error("amount is too large")]
    Overflow,
}

/// A price in the currency's standard unit (naira, dollars), never cents.
///
/// Serialized as a JSON number so existing storefront clients keep reading
/// plain numbers. Deserialization accepts numbers and numeric strings and
/// keeps the decimal digits exactly as written (`19.99` stays `19.99`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Create a new price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The decimal amount in major units.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the price is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Convert to the gateway's minor unit (kobo, cents).
    ///
    /// Multiplies by 100 and rounds half away from zero, so `10.5` becomes
    /// `1050` and `0.005` becomes `1`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotPositive`] when the converted amount is not
    /// above zero, and [`PriceError::Overflow`] when it does not fit in `i64`.
    pub fn to_minor_units(&self) -> Result<i64, PriceError> {
        let minor = self
            .0
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(PriceError::Overflow)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

        if minor <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }

        minor.to_i64().ok_or(PriceError::Overflow)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Self)
            .map_err(|_| PriceError::NotANumber)
    }
}

impl TryFrom<&serde_json::Value> for Price {
    type Error = PriceError;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Number(n) => n.to_string().parse(),
            serde_json::Value::String(s) => s.parse(),
            _ => Err(PriceError::NotANumber),
        }
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(whole) = self.0.fract().is_zero().then(|| self.0.to_i64()).flatten() {
            serializer.serialize_i64(whole)
        } else {
            serializer.serialize_f64(self.0.to_f64().unwrap_or_default())
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

struct PriceVisitor;

impl Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Price(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Price(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        // f64 Display is the shortest round-tripping form, so 19.99 parses as 19.99.
        v.to_string()
            .parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Float(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(s: &str) -> Price {
        s.parse().unwrap()
    }

    #[test]
    fn test_minor_units_of_fractional_amount() {
        assert_eq!(price("10.5").to_minor_units(), Ok(1050));
    }

    #[test]
    fn test_minor_units_round_half_away_from_zero() {
        assert_eq!(price("19.995").to_minor_units(), Ok(2000));
        assert_eq!(price("0.005").to_minor_units(), Ok(1));
        assert_eq!(price("0.004").to_minor_units(), Err(PriceError::NotPositive));
    }

    #[test]
    fn test_minor_units_reject_zero_and_negative() {
        assert_eq!(price("0").to_minor_units(), Err(PriceError::NotPositive));
        assert_eq!(price("-3").to_minor_units(), Err(PriceError::NotPositive));
    }

    #[test]
    fn test_from_json_value() {
        let from_number = Price::try_from(&serde_json::json!(10.5)).unwrap();
        let from_string = Price::try_from(&serde_json::json!("10.5")).unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(
            Price::try_from(&serde_json::json!("ten")),
            Err(PriceError::NotANumber)
        );
        assert_eq!(
            Price::try_from(&serde_json::json!(null)),
            Err(PriceError::NotANumber)
        );
    }

    #[test]
    fn test_deserialize_keeps_decimal_digits() {
        let p: Price = serde_json::from_str("19.99").unwrap();
        assert_eq!(p, price("19.99"));
        let p: Price = serde_json::from_str("\"25000\"").unwrap();
        assert_eq!(p, price("25000"));
    }

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&price("25000")).unwrap(), "25000");
        assert_eq!(serde_json::to_string(&price("10.5")).unwrap(), "10.5");
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(price("7.5").to_string(), "7.50");
    }
}
