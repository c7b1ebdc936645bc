//! Tolerant field decoders for server payloads.
//!
//! The config server is loose about types: numbers may arrive as strings,
//! maps as `null`, and fields may be missing altogether. Every decoder here
//! falls back to the zero value instead of rejecting the payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::hash::Hash;

pub(crate) fn value_to_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

pub(crate) fn int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map_or(0, value_to_i64))
}

pub(crate) fn uint<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let signed = int(deserializer)?;
    Ok(u64::try_from(signed).unwrap_or(0))
}

/// Strings pass through, numbers are rendered in decimal, anything else is empty.
pub(crate) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

pub(crate) fn map<'de, D, K, V>(deserializer: D) -> Result<HashMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: DeserializeOwned + Eq + Hash,
    V: DeserializeOwned,
{
    Ok(Option::<HashMap<K, V>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Like [`map`], but a `null` entry is dropped instead of failing the whole map.
pub(crate) fn map_skip_null<'de, D, K, V>(deserializer: D) -> Result<HashMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: DeserializeOwned + Eq + Hash,
    V: DeserializeOwned,
{
    let entries = Option::<HashMap<K, Option<V>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries.into_iter().filter_map(|(key, value)| value.map(|v| (key, v))).collect())
}
