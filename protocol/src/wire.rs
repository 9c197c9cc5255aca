//! Payloads of the positional query endpoints.
//!
//! Servers echo the request parameters back alongside the answer; only the
//! fields the navigator acts on are required.

use crate::ids::ObjectId;
use serde::Deserialize;
use serde::Serialize;
use serde_with::skip_serializing_none;

/// `GET /{otype}/count`
#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: usize,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

/// `GET /{otype}/index/{index}`
#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexResponse {
    pub oid: ObjectId,
    #[serde(default)]
    pub oindex: Option<usize>,
}

/// `GET /{otype}/id/{oid}`; `oindex` is null when the record is no longer
/// part of the filtered set.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdLookupResponse {
    #[serde(default)]
    pub oid: Option<ObjectId>,
    #[serde(default)]
    pub oindex: Option<usize>,
}

/// Body of the `export-observations` command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub search: String,
}
