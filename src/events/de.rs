//! Deserializers for the proto-JSON conventions used in event attributes.
//!
//! 64-bit integers may be quoted, ledger ids are decimal big-uints and
//! addresses are hex strings of varying case.

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Deserializer, de};
use std::{fmt, str::FromStr};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber<T> {
    Number(T),
    String(String),
}

/// An integer that may be encoded either as a JSON number or as a string.
pub fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: fmt::Display,
{
    match StringOrNumber::<T>::deserialize(deserializer)? {
        StringOrNumber::Number(n) => Ok(n),
        StringOrNumber::String(s) => s
            .trim()
            .parse()
            .map_err(|err| de::Error::custom(format!("invalid integer `{}`: {}", s, err))),
    }
}

/// An unsigned 64-bit quantity that must fit the store's signed columns.
pub fn stored_u64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: u64 = number(deserializer)?;
    i64::try_from(value)
        .map_err(|_| de::Error::custom(format!("value {} exceeds the storable range", value)))
}

/// A ledger id (`bucket_id`, `object_id`, ...) rendered as a 32-byte hash.
pub fn ledger_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match StringOrNumber::<u64>::deserialize(deserializer)? {
        StringOrNumber::Number(n) => {
            let mut id = [0u8; 32];
            id[24..].copy_from_slice(&n.to_be_bytes());
            id
        }
        StringOrNumber::String(s) => parse_ledger_id(&s).map_err(de::Error::custom)?,
    };
    Ok(id_to_hash(&id))
}

/// A hex account address, normalized to lowercase with a `0x` prefix.
pub fn address<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    normalize_address(&raw).map_err(de::Error::custom)
}

/// Base64 checksums. A missing or `null` list is treated as empty.
pub fn checksums<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<String>> = Option::deserialize(deserializer)?;
    let raw = raw.unwrap_or_default();
    for (idx, checksum) in raw.iter().enumerate() {
        general_purpose::STANDARD
            .decode(checksum)
            .map_err(|err| de::Error::custom(format!("checksum {} is not base64: {}", idx, err)))?;
    }
    Ok(raw)
}

/// Parse a decimal ledger id (a 256-bit unsigned integer) into big-endian bytes.
pub fn parse_ledger_id(raw: &str) -> Result<[u8; 32], String> {
    let digits = raw.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid ledger id `{}`", raw));
    }

    let mut id = [0u8; 32];
    for digit in digits.bytes().map(|b| u32::from(b - b'0')) {
        let mut carry = digit;
        for byte in id.iter_mut().rev() {
            let value = u32::from(*byte) * 10 + carry;
            *byte = (value & 0xff) as u8;
            carry = value >> 8;
        }
        if carry != 0 {
            return Err(format!("ledger id `{}` exceeds 256 bits", raw));
        }
    }
    Ok(id)
}

pub fn id_to_hash(id: &[u8; 32]) -> String {
    let mut hash = String::with_capacity(66);
    hash.push_str("0x");
    for byte in id {
        hash.push_str(&format!("{:02x}", byte));
    }
    hash
}

/// Decimal ledger id to its stored `0x` hash form.
pub fn ledger_hash(raw: &str) -> Result<String, String> {
    parse_ledger_id(raw).map(|id| id_to_hash(&id))
}

/// Left-pads short addresses and keeps the low 20 bytes of long ones.
pub fn normalize_address(raw: &str) -> Result<String, String> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("invalid hex address `{}`", raw));
    }
    let digits = digits.to_ascii_lowercase();
    let tail = if digits.len() > 40 {
        &digits[digits.len() - 40..]
    } else {
        digits.as_str()
    };
    Ok(format!("0x{:0>40}", tail))
}
