//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are never floating point inside the store. They are parsed from
//! JSON numbers or strings, stored as `NUMERIC`, and multiplied by integer
//! quantities exactly, so an order total is always the exact sum of its line
//! subtotals.
//!
//! Every amount fits a `NUMERIC(14, 2)` column: at most two decimal places
//! and at most [`Price::MAX`]. Anything outside that is rejected up front
//! rather than rounded or overflowed by the database.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::quantity::Quantity;

/// Errors that can occur when constructing or combining [`Price`] values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// More than two decimal places.
    #[error("price cannot have more than 2 decimal places (got {0})")]
    TooPrecise(Decimal),
    /// Above [`Price::MAX`].
    #[error("price cannot exceed 999999999999.99 (got {0})")]
    TooLarge(Decimal),
    /// The arithmetic result is above [`Price::MAX`].
    #[error("price arithmetic overflowed")]
    Overflow,
}

/// A non-negative monetary amount in the store currency.
///
/// ```
/// use ecommerce_store_core::{Price, Quantity};
/// use rust_decimal::Decimal;
///
/// let price = Price::new(Decimal::new(1099, 2)).unwrap();
/// let subtotal = price.line_total(Quantity::new(2).unwrap()).unwrap();
/// assert_eq!(subtotal.amount(), Decimal::new(2198, 2));
///
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest storable amount, 999 999 999 999.99.
    pub const MAX: Self = Self(Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, 2));

    /// Decimal places kept by storage.
    pub const SCALE: u32 = 2;

    /// Create a price.
    ///
    /// Trailing zeros do not count towards the scale, so `10.990` is accepted
    /// as `10.99`.
    ///
    /// # Errors
    ///
    /// - `PriceError::Negative` if `amount` is below zero.
    /// - `PriceError::TooPrecise` if it has more than two decimal places.
    /// - `PriceError::TooLarge` if it is above [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        let amount = amount.normalize();
        if amount.scale() > Self::SCALE {
            return Err(PriceError::TooPrecise(amount));
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge(amount));
        }
        Ok(Self(amount))
    }

    fn bounded(amount: Decimal) -> Result<Self, PriceError> {
        if amount > Self::MAX.0 {
            return Err(PriceError::Overflow);
        }
        Ok(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the result is above [`Price::MAX`].
    pub fn line_total(&self, quantity: Quantity) -> Result<Self, PriceError> {
        self.0
            .checked_mul(Decimal::from(quantity.get()))
            .ok_or(PriceError::Overflow)
            .and_then(Self::bounded)
    }

    /// Add two prices.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the sum is above [`Price::MAX`].
    pub fn checked_add(&self, other: Self) -> Result<Self, PriceError> {
        self.0
            .checked_add(other.0)
            .ok_or(PriceError::Overflow)
            .and_then(Self::bounded)
    }

    /// Sum an iterator of prices.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the running total overflows.
    pub fn try_sum<I>(prices: I) -> Result<Self, PriceError>
    where
        I: IntoIterator<Item = Self>,
    {
        prices
            .into_iter()
            .try_fold(Self::ZERO, |total, price| total.checked_add(price))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

// JSON clients read prices as numbers.
impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

// Accepts numbers and numeric strings.
impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
