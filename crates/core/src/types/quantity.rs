//! Positive item quantities.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Errors that can occur when parsing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// The value is not an integer (a float, a word, a boolean, null).
    #[error("quantity is not a whole number")]
    Unparsable,
    /// The value is zero, negative, or too large to fit.
    #[error("quantity must be greater than zero")]
    NotPositive,
}

/// A strictly positive number of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(i32);

impl Quantity {
    /// Create a quantity from an integer.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::NotPositive` for values `<= 0`. Values above
    /// `i32::MAX` are rejected the same way.
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value <= 0 {
            return Err(QuantityError::NotPositive);
        }
        i32::try_from(value)
            .map(Self)
            .map_err(|_| QuantityError::NotPositive)
    }

    /// Parse a quantity from loosely typed client JSON.
    ///
    /// Accepts integers and strings of digits with an optional sign, so
    /// `2` and `"2"` are the same quantity. Everything else is unparsable.
    ///
    /// # Errors
    ///
    /// `Unparsable` when the value is not an integer, `NotPositive` when it
    /// is an integer `<= 0`.
    pub fn parse_json(value: &Value) -> Result<Self, QuantityError> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::new(i)
                } else if n.as_u64().is_some() {
                    // Larger than i64::MAX, certainly too big.
                    Err(QuantityError::NotPositive)
                } else {
                    Err(QuantityError::Unparsable)
                }
            }
            Value::String(s) => Self::parse_str(s),
            _ => Err(QuantityError::Unparsable),
        }
    }

    fn parse_str(s: &str) -> Result<Self, QuantityError> {
        let s = s.trim();
        let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(QuantityError::Unparsable);
        }
        match s.parse::<i64>() {
            Ok(i) => Self::new(i),
            // All digits but out of range.
            Err(_) => Err(QuantityError::NotPositive),
        }
    }

    /// The number of units.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

impl From<Quantity> for i32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::parse_json(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Quantity {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Quantity {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::try_from(raw)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Quantity {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
