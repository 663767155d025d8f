//! Lenient deserialisation for numeric fields in entity blobs.
//!
//! Documents round-trip through JSON blobs (local store, remote mirror, AI
//! drafts), and the numeric cells in those blobs are not guaranteed to be
//! well-formed: a field may arrive as a number, a quoted string (possibly
//! with comma thousands separators), `null`, or may be missing entirely.
//! Anything that cannot be read as a number is coerced to zero rather than
//! failing the whole document.

use std::fmt;

use rust_decimal::Decimal;
use serde::de::{Deserializer, Error, Visitor};

fn parse_lenient(s: &str) -> Option<Decimal> {
    let normalized = s.trim().replace(',', "");
    if normalized.is_empty() {
        return None;
    }
    match normalized.parse() {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::debug!(input = s, %error, "non-numeric cell coerced");
            None
        }
    }
}

struct LenientDecimal;

impl<'de> Visitor<'de> for LenientDecimal {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number, a numeric string, or null")
    }

    fn visit_i64<E: Error>(self, v: i64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_u64<E: Error>(self, v: u64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_f64<E: Error>(self, v: f64) -> Result<Decimal, E> {
        Ok(Decimal::try_from(v).unwrap_or(Decimal::ZERO))
    }

    fn visit_str<E: Error>(self, v: &str) -> Result<Decimal, E> {
        Ok(parse_lenient(v).unwrap_or(Decimal::ZERO))
    }

    fn visit_unit<E: Error>(self) -> Result<Decimal, E> {
        Ok(Decimal::ZERO)
    }

    fn visit_none<E: Error>(self) -> Result<Decimal, E> {
        Ok(Decimal::ZERO)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Decimal, D::Error> {
        d.deserialize_any(LenientDecimal)
    }
}

/// Deserialises a required numeric field, coercing bad input to zero.
pub fn lenient_decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
    d.deserialize_any(LenientDecimal)
}

struct LenientOptDecimal;

impl<'de> Visitor<'de> for LenientOptDecimal {
    type Value = Option<Decimal>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number, a numeric string, or null")
    }

    fn visit_i64<E: Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(Decimal::from(v)))
    }

    fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(Decimal::from(v)))
    }

    fn visit_f64<E: Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Decimal::try_from(v).ok())
    }

    fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(parse_lenient(v))
    }

    fn visit_unit<E: Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        d.deserialize_any(LenientOptDecimal)
    }
}

/// Deserialises an optional numeric field. `null`, missing, or unparseable
/// input becomes `None` (the calculator treats `None` as "not set").
pub fn lenient_opt_decimal<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<Decimal>, D::Error> {
    d.deserialize_option(LenientOptDecimal)
}
