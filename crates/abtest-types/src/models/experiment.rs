//! Experiment wire model.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;

use super::lenient;

/// Per-strategy configuration: key → arbitrary JSON value.
pub type ConfigMap = HashMap<String, Value>;

/// Whether an experiment takes part in resolution.
///
/// The server sends `1` for enabled and `-1` for disabled. Only `-1` switches
/// an experiment off; any other code (including a missing field) is enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExperimentStatus {
    /// Resolution allowed
    #[default]
    Enabled,
    /// Callers must skip this experiment
    Disabled,
}

impl ExperimentStatus {
    /// Wire code for an enabled experiment.
    pub const ENABLED_CODE: i64 = 1;
    /// Wire code for a disabled experiment.
    pub const DISABLED_CODE: i64 = -1;

    pub const fn from_code(code: i64) -> Self {
        if code == Self::DISABLED_CODE {
            Self::Disabled
        } else {
            Self::Enabled
        }
    }

    pub const fn code(self) -> i64 {
        match self {
            Self::Enabled => Self::ENABLED_CODE,
            Self::Disabled => Self::DISABLED_CODE,
        }
    }

    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl Serialize for ExperimentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for ExperimentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient::int(deserializer).map(Self::from_code)
    }
}

/// Experiment category as reported by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExperimentType {
    /// Recommendation experiment (`1`)
    Rec,
    /// Global experiment (`2`)
    All,
    /// Any other code, kept verbatim
    Other(i64),
    /// Missing or zero
    #[default]
    Unspecified,
}

impl ExperimentType {
    pub const fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Unspecified,
            1 => Self::Rec,
            2 => Self::All,
            other => Self::Other(other),
        }
    }

    pub const fn code(self) -> i64 {
        match self {
            Self::Unspecified => 0,
            Self::Rec => 1,
            Self::All => 2,
            Self::Other(code) => code,
        }
    }
}

impl Serialize for ExperimentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for ExperimentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient::int(deserializer).map(Self::from_code)
    }
}

/// One experiment exactly as the config server sends it.
///
/// Decoding never fails on missing or `null` fields; numbers fall back to 0
/// and maps to empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExperimentWire {
    /// Experiment id, also the hash salt for bucketing
    #[serde(default, deserialize_with = "lenient::string")]
    pub exp_id: String,
    /// Experiment name, unique within a project
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default)]
    pub exp_type: ExperimentType,
    /// Server-side update time
    #[serde(default, deserialize_with = "lenient::int")]
    pub ut: i64,
    /// Size of the bucket space
    #[serde(default, deserialize_with = "lenient::uint")]
    pub partition_count: u64,
    #[serde(default)]
    pub status: ExperimentStatus,
    /// Advisory expiry timestamp
    #[serde(default, deserialize_with = "lenient::int")]
    pub expire: i64,
    /// Subject id → strategy name overrides
    #[serde(default, deserialize_with = "lenient::map_skip_null")]
    pub white_map: HashMap<String, String>,
    /// Strategy name → structured config
    #[serde(default, deserialize_with = "lenient::map_skip_null")]
    pub config_map: HashMap<String, ConfigMap>,
    /// Strategy name → raw config payload
    #[serde(default, deserialize_with = "lenient::map_skip_null")]
    pub config_raw_map: HashMap<String, String>,
    /// Strategy name → partition spec (e.g. `"0-49"`)
    #[serde(default, deserialize_with = "lenient::map_skip_null")]
    pub partitions_map: HashMap<String, String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_payload() {
        let wire: ExperimentWire = serde_json::from_value(json!({
            "exp_id": "exp-42",
            "name": "recommend_0703",
            "exp_type": 1,
            "ut": 1_700_000_000,
            "partition_count": 100,
            "status": 1,
            "expire": 1_800_000_000,
            "white_map": {"u1": "B"},
            "config_map": {"A": {"ratio": 0.5}, "B": {"ratio": 0.9}},
            "config_raw_map": {"A": "{\"ratio\":0.5}"},
            "partitions_map": {"A": "0-49", "B": "50-99"}
        }))
        .unwrap();

        assert_eq!(wire.exp_id, "exp-42");
        assert_eq!(wire.exp_type, ExperimentType::Rec);
        assert_eq!(wire.partition_count, 100);
        assert_eq!(wire.status, ExperimentStatus::Enabled);
        assert_eq!(wire.white_map["u1"], "B");
        assert_eq!(wire.config_map["B"]["ratio"], json!(0.9));
        assert_eq!(wire.partitions_map["A"], "0-49");
    }

    #[test]
    fn test_missing_and_null_fields_default_to_zero() {
        let wire: ExperimentWire = serde_json::from_value(json!({
            "name": "bare",
            "partition_count": null,
            "white_map": null,
            "config_map": null
        }))
        .unwrap();

        assert_eq!(wire.name, "bare");
        assert_eq!(wire.exp_id, "");
        assert_eq!(wire.partition_count, 0);
        assert_eq!(wire.ut, 0);
        assert_eq!(wire.status, ExperimentStatus::Enabled);
        assert!(wire.white_map.is_empty());
        assert!(wire.config_map.is_empty());
        assert!(wire.partitions_map.is_empty());
    }

    #[test]
    fn test_null_map_entries_are_dropped() {
        let wire: ExperimentWire = serde_json::from_value(json!({
            "name": "sparse",
            "white_map": {"u1": null, "u2": "B"},
            "config_map": {"A": null, "B": {"ratio": 0.9}},
            "config_raw_map": {"A": null},
            "partitions_map": {"A": null, "B": "0-9"}
        }))
        .unwrap();

        assert_eq!(wire.white_map.len(), 1);
        assert!(!wire.config_map.contains_key("A"));
        assert_eq!(wire.config_map["B"]["ratio"], json!(0.9));
        assert!(wire.config_raw_map.is_empty());
        assert_eq!(wire.partitions_map.len(), 1);
    }

    #[test]
    fn test_numbers_as_strings_and_floats() {
        let wire: ExperimentWire = serde_json::from_value(json!({
            "exp_id": 7,
            "partition_count": "16",
            "status": -1.0,
            "expire": "soon"
        }))
        .unwrap();

        assert_eq!(wire.exp_id, "7");
        assert_eq!(wire.partition_count, 16);
        assert_eq!(wire.status, ExperimentStatus::Disabled);
        assert_eq!(wire.expire, 0);
    }

    #[test]
    fn test_negative_partition_count_is_zero() {
        let wire: ExperimentWire =
            serde_json::from_value(json!({"partition_count": -5})).unwrap();
        assert_eq!(wire.partition_count, 0);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ExperimentStatus::from_code(-1), ExperimentStatus::Disabled);
        assert_eq!(ExperimentStatus::from_code(1), ExperimentStatus::Enabled);
        assert_eq!(ExperimentStatus::from_code(0), ExperimentStatus::Enabled);
        assert_eq!(serde_json::to_value(ExperimentStatus::Disabled).unwrap(), json!(-1));
        assert_eq!(ExperimentType::from_code(9), ExperimentType::Other(9));
    }
}
