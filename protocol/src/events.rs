use crate::ids::ObjectId;
use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;
use strum_macros::EnumIter;

/// Which collection-wide notification stream an event travelled on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ObjectEventKind {
    Created,
    Changed,
    Deleted,
}

impl ObjectEventKind {
    /// Name of the event on the real-time channel.
    pub fn event_name(self) -> &'static str {
        match self {
            ObjectEventKind::Created => "object-created",
            ObjectEventKind::Changed => "object-changed",
            ObjectEventKind::Deleted => "object-deleted",
        }
    }

    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "object-created" => Some(ObjectEventKind::Created),
            "object-changed" => Some(ObjectEventKind::Changed),
            "object-deleted" => Some(ObjectEventKind::Deleted),
            _ => None,
        }
    }
}

/// Payload of every notification: which record of which collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub otype: String,
    pub oid: ObjectId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectEvent {
    pub kind: ObjectEventKind,
    pub object: ObjectRef,
}

impl ObjectEvent {
    pub fn new(kind: ObjectEventKind, otype: impl Into<String>, oid: impl Into<ObjectId>) -> Self {
        Self {
            kind,
            object: ObjectRef {
                otype: otype.into(),
                oid: oid.into(),
            },
        }
    }

    pub fn matches(&self, otype: &str) -> bool {
        self.object.otype == otype
    }
}
