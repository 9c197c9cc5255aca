use crate::ids::ObjectId;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_with::skip_serializing_none;
use std::fmt;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc2822;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

const DISPLAY_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Timestamp exactly as the server sent it.
///
/// Servers emit RFC 3339 or HTTP-date strings; parsing is deferred so an
/// unexpected format never prevents the record from loading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn raw(&self) -> &str {
        &self.0
    }

    pub fn to_datetime(&self) -> Option<OffsetDateTime> {
        let raw = self.0.trim();
        OffsetDateTime::parse(raw, &Rfc3339)
            .or_else(|_| OffsetDateTime::parse(raw, &Rfc2822))
            .ok()
    }

    /// Display form; falls back to the raw text when it does not parse.
    pub fn display(&self) -> String {
        self.to_datetime()
            .and_then(|dt| dt.format(DISPLAY_FORMAT).ok())
            .unwrap_or_else(|| self.0.clone())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// One piece of content attached to a record.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentItem {
    pub key: Option<String>,
    #[serde(rename = "content-type")]
    pub content_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentItem {
    pub fn is_image(&self) -> bool {
        self.content_type
            .split('/')
            .next()
            .is_some_and(|major| major.eq_ignore_ascii_case("image"))
    }
}

#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Observation {
    #[serde(alias = "_id")]
    pub id: Option<ObjectId>,
    pub created: Option<Timestamp>,
    pub modified: Option<Timestamp>,
    #[serde(rename = "modified-by")]
    pub modified_by: Option<String>,
    pub tags: Vec<String>,
    #[serde(deserialize_with = "deserialize_content")]
    pub content: Vec<ContentItem>,
    #[serde(rename = "attributes-pre")]
    pub attributes_pre: Option<String>,
}

impl Observation {
    /// Content items whose media type is `image/*`.
    pub fn images(&self) -> impl Iterator<Item = &ContentItem> {
        self.content.iter().filter(|item| item.is_image())
    }

    pub fn created_display(&self) -> String {
        self.created.as_ref().map(Timestamp::display).unwrap_or_default()
    }

    pub fn modified_display(&self) -> String {
        self.modified
            .as_ref()
            .map(Timestamp::display)
            .unwrap_or_default()
    }
}

/// `GET /observations/{oid}` answers either with the bare record or with the
/// record wrapped in an `observation` member.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ObservationResponse {
    Wrapped { observation: Observation },
    Bare(Observation),
}

impl ObservationResponse {
    pub fn into_observation(self) -> Observation {
        match self {
            ObservationResponse::Wrapped { observation } => observation,
            ObservationResponse::Bare(observation) => observation,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ContentRepr {
    List(Vec<ContentItem>),
    Keyed(Map<String, Value>),
}

// Content arrives either as a list or as an object keyed by content name.
fn deserialize_content<'de, D>(deserializer: D) -> Result<Vec<ContentItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<ContentRepr>::deserialize(deserializer)?;
    match repr {
        None => Ok(Vec::new()),
        Some(ContentRepr::List(items)) => Ok(items),
        Some(ContentRepr::Keyed(map)) => {
            let mut items = Vec::with_capacity(map.len());
            for (key, value) in map {
                let mut item: ContentItem =
                    serde_json::from_value(value).map_err(serde::de::Error::custom)?;
                if item.key.is_none() {
                    item.key = Some(key);
                }
                items.push(item);
            }
            Ok(items)
        }
    }
}
