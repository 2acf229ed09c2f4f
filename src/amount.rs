//! Minor-unit amounts as they come off the ledger, and their display form.

use std::fmt;

use serde::{de, Deserializer};

/// Render a minor-unit amount with `decimals` fractional digits, trimming
/// trailing zeros (`1_500_000_000_000_000_000` at 18 decimals is `"1.5"`).
pub fn format_units(value: u128, decimals: u32) -> String {
    if decimals == 0 {
        return value.to_string();
    }

    let digits = value.to_string();
    let decimals = decimals as usize;
    let (whole, frac) = if digits.len() > decimals {
        let split = digits.len() - decimals;
        (digits[..split].to_string(), digits[split..].to_string())
    } else {
        ("0".to_string(), format!("{:0>width$}", digits, width = decimals))
    };

    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole
    } else {
        format!("{}.{}", whole, frac)
    }
}

struct AmountVisitor;

impl<'de> de::Visitor<'de> for AmountVisitor {
    type Value = u128;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a non-negative integer or an integer string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
        Ok(v as u128)
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
        u128::try_from(v).map_err(|_| E::custom(format!("negative amount {}", v)))
    }

    /// JSON integers beyond `u64::MAX` arrive as floats. Only whole,
    /// non-negative values that fit in `u128` are accepted; digits past
    /// f64 precision are lost, so exact large amounts should be sent as strings.
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<u128, E> {
        if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v < u128::MAX as f64 {
            Ok(v as u128)
        } else {
            Err(E::custom(format!("invalid amount {}", v)))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
        parse_amount(v).map_err(E::custom)
    }
}

/// Accepts an amount encoded either as a JSON integer or a decimal string
/// (JSON-RPC gateways commonly stringify 256-bit integers). `0x` hex strings
/// are accepted too.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(AmountVisitor)
}

/// Same as [`deserialize_amount`] for unix timestamps.
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = deserialize_amount(deserializer)?;
    i64::try_from(raw).map_err(|_| de::Error::custom(format!("timestamp {} out of range", raw)))
}

pub fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = deserialize_amount(deserializer)?;
    u64::try_from(raw).map_err(|_| de::Error::custom(format!("count {} out of range", raw)))
}

pub fn parse_amount(raw: &str) -> Result<u128, String> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u128::from_str_radix(hex, 16),
        None => raw.parse::<u128>(),
    };
    parsed.map_err(|e| format!("invalid amount '{}': {}", raw, e))
}
