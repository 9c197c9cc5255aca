use crate::error::Result;
use async_trait::async_trait;
use obsnav_protocol::ObjectId;
use obsnav_protocol::Observation;
use obsnav_protocol::Query;
use obsnav_protocol::SessionId;

/// Where a record sits under a given ordering; `index` is `None` when the
/// record has left the filtered set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexLookup {
    pub oid: Option<ObjectId>,
    pub index: Option<usize>,
}

/// Server-side collection the navigator browses.
///
/// Positional reads are scoped by a session so that consecutive lookups see
/// one consistent snapshot of the filtered, sorted set.
#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// Size of the result set for `search`; ordering does not affect it.
    async fn count(&self, session: SessionId, search: &str) -> Result<usize>;

    /// Identifier at a 0-based position. Fails with
    /// [`crate::NavigatorError::OutOfRange`] when the set is smaller.
    async fn identifier_at(
        &self,
        session: SessionId,
        query: &Query,
        index: usize,
    ) -> Result<ObjectId>;

    async fn index_of(
        &self,
        session: SessionId,
        query: &Query,
        oid: &ObjectId,
    ) -> Result<IndexLookup>;

    async fn observation(&self, oid: &ObjectId) -> Result<Observation>;

    /// Plain-text rendering of the record's attributes.
    async fn attributes_pre(&self, oid: &ObjectId) -> Result<String>;

    /// Ask the server to export every record matching `search`.
    async fn export_observations(&self, search: &str) -> Result<()>;
}
