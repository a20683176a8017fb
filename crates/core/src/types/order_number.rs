//! Externally visible order identifiers.

use core::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

const PREFIX: &str = "ORD-";

/// Customer-facing order identifier, `ORD-<epoch millis>`.
///
/// Assigned once when the order is created and never changed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Wrap an order number received from a client or the database.
    ///
    /// No format check: lookups of malformed numbers simply find nothing.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    fn from_millis(millis: i64) -> Self {
        Self(format!("{PREFIX}{millis}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hands out order numbers that never repeat within a process.
///
/// Two calls in the same millisecond get consecutive values, so the number
/// can run slightly ahead of the wall clock under load.
#[derive(Debug, Default)]
pub struct OrderNumberGenerator {
    last: AtomicI64,
}

impl OrderNumberGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    /// Next order number based on the current time.
    pub fn next(&self) -> OrderNumber {
        self.next_at(Utc::now().timestamp_millis())
    }

    fn next_at(&self, now_ms: i64) -> OrderNumber {
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_ms.max(last.saturating_add(1));
            match self.last.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return OrderNumber::from_millis(candidate),
                Err(current) => last = current,
            }
        }
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_format() {
        let generator = OrderNumberGenerator::new();
        assert_eq!(generator.next_at(1_700_000_000_000).as_str(), "ORD-1700000000000");
    }

    #[test]
    fn test_same_millisecond_increments() {
        let generator = OrderNumberGenerator::new();
        let a = generator.next_at(1000);
        let b = generator.next_at(1000);
        let c = generator.next_at(999);
        assert_eq!(a.as_str(), "ORD-1000");
        assert_eq!(b.as_str(), "ORD-1001");
        assert_eq!(c.as_str(), "ORD-1002");
    }

    #[test]
    fn test_unique_across_threads() {
        let generator = Arc::new(OrderNumberGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || (0..250).map(|_| generator.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for number in handle.join().unwrap_or_default() {
                assert!(seen.insert(number));
            }
        }
        assert_eq!(seen.len(), 2000);
    }
}
