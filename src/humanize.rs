//! Human-readable sizes and durations for configuration values
//!
//! Both types accept either a bare integer (bytes / milliseconds) or a string
//! with a unit suffix: `"5MB"`, `"512KiB"`, `"500ms"`, `"24h"`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    #[error("Value out of range: {0}")]
    Overflow(String),
}

/// Split `"500ms"` into `(500, "ms")`. The unit part is trimmed.
fn split_number_unit(s: &str) -> Result<(u64, &str), ParseError> {
    let s = s.trim();
    let pos = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());

    if pos == 0 {
        return Err(ParseError::InvalidFormat(s.to_string()));
    }

    let number = s[..pos].parse::<u64>()?;
    Ok((number, s[pos..].trim()))
}

/// Byte size wrapper with human-readable parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn as_usize(&self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl FromStr for ByteSize {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (number, unit) = split_number_unit(s)?;

        let multiplier: u64 = match unit.to_ascii_uppercase().as_str() {
            "" | "B" => 1,
            "K" | "KB" | "KIB" => 1024,
            "M" | "MB" | "MIB" => 1024 * 1024,
            "G" | "GB" | "GIB" => 1024 * 1024 * 1024,
            _ => return Err(ParseError::InvalidUnit(unit.to_string())),
        };

        number
            .checked_mul(multiplier)
            .map(ByteSize)
            .ok_or_else(|| ParseError::Overflow(s.trim().to_string()))
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: &[(&str, u64)] = &[
            ("GB", 1024 * 1024 * 1024),
            ("MB", 1024 * 1024),
            ("KB", 1024),
        ];

        for &(unit, divisor) in UNITS {
            if self.0 >= divisor && self.0 % divisor == 0 {
                return write!(f, "{}{}", self.0 / divisor, unit);
            }
        }

        write!(f, "{}B", self.0)
    }
}

/// Duration wrapper with human-readable parsing (`ms`, `s`, `m`, `h`, `d`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HumanDuration(pub Duration);

impl HumanDuration {
    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl FromStr for HumanDuration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (number, unit) = split_number_unit(s)?;

        let secs_per_unit: u64 = match unit.to_ascii_lowercase().as_str() {
            "" | "ms" => return Ok(HumanDuration::from_millis(number)),
            "s" => 1,
            "m" => 60,
            "h" => 3600,
            "d" => 86400,
            _ => return Err(ParseError::InvalidUnit(unit.to_string())),
        };

        number
            .checked_mul(secs_per_unit)
            .map(HumanDuration::from_secs)
            .ok_or_else(|| ParseError::Overflow(s.trim().to_string()))
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.0.as_millis();
        if ms == 0 || ms % 1000 != 0 {
            return write!(f, "{}ms", ms);
        }

        let secs = self.0.as_secs();
        if secs % 86400 == 0 {
            write!(f, "{}d", secs / 86400)
        } else if secs % 3600 == 0 {
            write!(f, "{}h", secs / 3600)
        } else if secs % 60 == 0 {
            write!(f, "{}m", secs / 60)
        } else {
            write!(f, "{}s", secs)
        }
    }
}

/// Shared visitor for "integer or string with unit" values
struct UnitVisitor<T> {
    expecting: &'static str,
    from_int: fn(u64) -> T,
}

impl<'de, T> serde::de::Visitor<'de> for UnitVisitor<T>
where
    T: FromStr<Err = ParseError>,
{
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(self.expecting)
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok((self.from_int)(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        let v = u64::try_from(v).map_err(|_| E::custom("value must not be negative"))?;
        Ok((self.from_int)(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        v.parse::<T>().map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(UnitVisitor {
            expecting: "a byte size as string (e.g., \"5MB\") or integer",
            from_int: ByteSize,
        })
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(UnitVisitor {
            expecting: "a duration as string (e.g., \"500ms\", \"24h\") or milliseconds",
            from_int: HumanDuration::from_millis,
        })
    }
}

impl Serialize for ByteSize {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for HumanDuration {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
