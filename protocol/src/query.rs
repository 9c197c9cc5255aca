use serde::Deserialize;
use serde::Serialize;
use strum_macros::AsRefStr;
use strum_macros::Display;
use strum_macros::EnumIter;
use strum_macros::EnumString;

/// Ordering applied by the server before positional lookups.
///
/// The string form is the key the server expects in the `sort` parameter.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SortKey {
    #[default]
    #[serde(rename = "_id", alias = "id")]
    #[strum(to_string = "_id", serialize = "id")]
    Identifier,
    Created,
    Modified,
    ModifiedBy,
    Tags,
}

impl SortKey {
    /// Human readable label for selectors.
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Identifier => "ID",
            SortKey::Created => "Created",
            SortKey::Modified => "Modified",
            SortKey::ModifiedBy => "Modified by",
            SortKey::Tags => "Tags",
        }
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    #[default]
    #[serde(alias = "asc")]
    #[strum(to_string = "ascending", serialize = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    #[strum(to_string = "descending", serialize = "desc")]
    Descending,
}

/// Filter and ordering the user has selected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    pub search: String,
    pub sort: SortKey,
    pub direction: Direction,
}

impl Query {
    pub fn new(search: impl Into<String>, sort: SortKey, direction: Direction) -> Self {
        Self {
            search: search.into(),
            sort,
            direction,
        }
    }

    /// True when the ordering differs, ignoring the filter text.
    pub fn ordering_differs(&self, other: &Query) -> bool {
        self.sort != other.sort || self.direction != other.direction
    }
}
