//! Config-list request/response envelopes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::experiment::ExperimentWire;
use super::lenient;
use crate::error::FetchError;

/// Numeric project identifier.
pub type ProjectId = i64;

/// `ret` value of a successful response.
pub const RET_OK: i64 = 1;

/// Body of a config-list request: "send me everything newer than `time`".
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigListRequest {
    /// Watermark of the last applied response, 0 for a full sync
    pub time: i64,
}

/// Envelope returned by the config-list endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigListResponse {
    #[serde(default, deserialize_with = "lenient::int")]
    pub ret: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub errcode: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub msg: String,
    #[serde(default)]
    pub data: Option<ConfigListData>,
}

/// Payload of a successful config-list response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigListData {
    /// New watermark
    #[serde(default, deserialize_with = "lenient::int")]
    pub time: i64,
    /// Project → experiments changed since the request watermark
    #[serde(default, deserialize_with = "lenient::map")]
    pub config_list_map: HashMap<ProjectId, Vec<ExperimentWire>>,
}

impl ConfigListResponse {
    /// Unwrap the payload, rejecting `ret != 1` and a missing `data` field.
    pub fn into_data(self) -> Result<ConfigListData, FetchError> {
        match self.data {
            Some(data) if self.ret == RET_OK => Ok(data),
            _ => Err(FetchError::UnexpectedResponse { ret: self.ret, msg: self.msg }),
        }
    }
}
