use std::sync::Arc;

use crate::error::Result;
use crate::scope::ScopedManager;
use crate::source::ObservationSource;
use obsnav_protocol::ObjectId;
use obsnav_protocol::Observation;
use tracing::debug;
use tracing::warn;

/// Result of fetching one record: the body and its attribute rendering are
/// requested together but can fail independently.
#[derive(Debug)]
pub struct LoadedRecord {
    pub observation: Result<Observation>,
    pub attributes_pre: Result<String>,
}

/// Fetches record bodies and points the per-record collaborators at them.
pub struct RecordLoader {
    source: Arc<dyn ObservationSource>,
    attributes: Arc<dyn ScopedManager>,
    tags: Arc<dyn ScopedManager>,
    otype: String,
}

impl RecordLoader {
    pub fn new(
        source: Arc<dyn ObservationSource>,
        attributes: Arc<dyn ScopedManager>,
        tags: Arc<dyn ScopedManager>,
        otype: impl Into<String>,
    ) -> Self {
        Self {
            source,
            attributes,
            tags,
            otype: otype.into(),
        }
    }

    pub fn otype(&self) -> &str {
        &self.otype
    }

    pub async fn load(&self, oid: &ObjectId) -> LoadedRecord {
        debug!(oid = %oid, "loading observation");
        let (observation, attributes_pre) = tokio::join!(
            self.source.observation(oid),
            self.source.attributes_pre(oid)
        );
        LoadedRecord {
            observation: observation.map(|mut observation| {
                // Bodies may omit the id.
                observation.id = Some(oid.clone());
                observation.attributes_pre = None;
                observation
            }),
            attributes_pre,
        }
    }

    pub fn acquire(&self, oid: &ObjectId) {
        self.attributes.manage(&self.otype, oid);
        self.tags.manage(&self.otype, oid);
    }

    pub fn release(&self, oid: &ObjectId) {
        self.attributes.release(&self.otype, oid);
        self.tags.release(&self.otype, oid);
    }
}

/// Merge a freshly loaded record into `current`.
///
/// A failed body fetch keeps the previous content; the attribute text is
/// merged whenever it arrived.
pub(crate) fn merge_loaded(current: &mut Observation, loaded: LoadedRecord) -> bool {
    let mut replaced = false;
    match loaded.observation {
        Ok(observation) => {
            *current = observation;
            replaced = true;
        }
        Err(err) => warn!("failed to load observation: {err}"),
    }
    match loaded.attributes_pre {
        Ok(text) => current.attributes_pre = Some(text),
        Err(err) => warn!("failed to load attributes: {err}"),
    }
    replaced
}
