use std::sync::Arc;

use crate::events::Invalidation;
use crate::position::Position;
use crate::query::SharedQuery;
use crate::record::RecordLoader;
use crate::record::merge_loaded;
use crate::scope::ScopedManager;
use crate::session::new_session;
use crate::source::ObservationSource;
use obsnav_protocol::ObjectId;
use obsnav_protocol::Observation;
use obsnav_protocol::Query;
use obsnav_protocol::SessionId;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// Local notice shown when an export has been requested.
pub const EXPORT_NOTICE: &str = "Exporting observations.";

/// Where the cursor goes after the sort key or direction changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResortPolicy {
    /// Stay at the same position and show whatever record now lives there.
    #[default]
    KeepIndex,
    /// Move to the position the current record occupies under the new
    /// ordering.
    FollowRecord,
}

/// Everything a renderer needs to draw the navigator.
#[derive(Clone, Debug, PartialEq)]
pub struct NavigatorSnapshot {
    pub session: SessionId,
    pub query: Query,
    pub position: Position,
    pub record: Observation,
    pub stale: bool,
    pub loading: bool,
    pub query_error: bool,
}

/// Per-record collaborators the navigator keeps pointed at the current
/// record.
pub struct Scopes {
    pub attributes: Arc<dyn ScopedManager>,
    pub tags: Arc<dyn ScopedManager>,
}

pub struct NavigatorOptions {
    pub otype: String,
    pub policy: ResortPolicy,
    /// Record to show before the first positional lookup.
    pub initial_oid: Option<ObjectId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lookup {
    Loaded,
    Empty,
    OutOfRange,
    Failed,
}

/// Browses a server-held, filtered and sorted collection one record at a
/// time.
///
/// All operations take `&mut self`, so at most one of them is in flight and
/// a later request can never be overwritten by an earlier response.
pub struct Navigator {
    source: Arc<dyn ObservationSource>,
    loader: RecordLoader,
    query: SharedQuery,
    policy: ResortPolicy,
    session: SessionId,
    position: Position,
    record: Observation,
    managed: Option<ObjectId>,
    /// Record to seek to on the first non-empty count, whatever the policy.
    pending_initial: Option<ObjectId>,
    stale: bool,
    loading: bool,
    query_error: bool,
    updates: watch::Sender<NavigatorSnapshot>,
}

impl Navigator {
    pub fn new(
        source: Arc<dyn ObservationSource>,
        scopes: Scopes,
        query: SharedQuery,
        options: NavigatorOptions,
    ) -> Self {
        let NavigatorOptions {
            otype,
            policy,
            initial_oid,
        } = options;
        let loader = RecordLoader::new(
            Arc::clone(&source),
            scopes.attributes,
            scopes.tags,
            otype,
        );
        let pending_initial = initial_oid.clone();
        let session = new_session();
        let record = Observation {
            id: initial_oid,
            ..Observation::default()
        };
        let (updates, _) = watch::channel(NavigatorSnapshot {
            session,
            query: query.snapshot(),
            position: Position::default(),
            record: record.clone(),
            stale: false,
            loading: false,
            query_error: false,
        });
        Self {
            source,
            loader,
            query,
            policy,
            session,
            position: Position::default(),
            record,
            managed: None,
            pending_initial,
            stale: false,
            loading: false,
            query_error: false,
            updates,
        }
    }

    pub fn otype(&self) -> &str {
        self.loader.otype()
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn query(&self) -> &SharedQuery {
        &self.query
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn record(&self) -> &Observation {
        &self.record
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_query_error(&self) -> bool {
        self.query_error
    }

    pub fn snapshot(&self) -> NavigatorSnapshot {
        NavigatorSnapshot {
            session: self.session,
            query: self.query.snapshot(),
            position: self.position,
            record: self.record.clone(),
            stale: self.stale,
            loading: self.loading,
            query_error: self.query_error,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<NavigatorSnapshot> {
        self.updates.subscribe()
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }

    /// Start a new session and re-read everything from the server.
    pub async fn reload(&mut self) {
        self.stale = false;
        self.session = new_session();
        debug!(session = %self.session, "reload");
        self.publish();
        self.load_count().await;
    }

    /// Re-count the result set for the current search, then re-resolve the
    /// current position.
    pub async fn load_count(&mut self) {
        if !self.fetch_count().await {
            return;
        }
        self.realign().await;
        self.lookup_id().await;
    }

    /// Re-resolve the current position after the ordering changed.
    pub async fn adjust_index(&mut self) {
        self.realign().await;
        self.lookup_id().await;
    }

    /// Resolve the identifier at the current position and load that record.
    ///
    /// A position beyond the end of the set triggers one recount; if the
    /// position is still out of range afterwards the query is flagged.
    pub async fn lookup_id(&mut self) {
        if self.lookup_once().await != Lookup::OutOfRange {
            return;
        }
        info!(
            index = self.position.index(),
            "position out of range; recounting"
        );
        if !self.fetch_count().await {
            return;
        }
        self.realign().await;
        if self.lookup_once().await == Lookup::OutOfRange {
            warn!(
                index = self.position.index(),
                "position still out of range after recount"
            );
            self.query_error = true;
            self.publish();
        }
    }

    /// Fetch the body and attribute text of the current record and point
    /// the per-record collaborators at it.
    pub async fn load_observation(&mut self) {
        self.fetch_record(true).await;
    }

    /// Re-fetch the current record in place after it changed on the server.
    pub async fn refresh_record(&mut self) {
        self.fetch_record(false).await;
    }

    pub async fn first(&mut self) {
        self.move_to(self.position.first()).await;
    }

    pub async fn last(&mut self) {
        self.move_to(self.position.last()).await;
    }

    pub async fn next(&mut self) {
        self.move_to(self.position.next()).await;
    }

    pub async fn previous(&mut self) {
        self.move_to(self.position.previous()).await;
    }

    pub async fn random(&mut self) {
        let target = {
            let mut rng = rand::rng();
            self.position.random(&mut rng)
        };
        self.move_to(target).await;
    }

    /// Apply a collection notification. Any matching notification marks the
    /// view stale; a change to the displayed record also re-fetches it.
    pub async fn apply_invalidation(&mut self, invalidation: Invalidation) {
        self.stale = true;
        self.publish();
        if let Invalidation::Changed(oid) = invalidation
            && self.record.id.as_ref() == Some(&oid)
        {
            debug!(oid = %oid, "displayed observation changed");
            self.refresh_record().await;
        }
    }

    /// Ask the server to export everything matching the current search.
    ///
    /// The request runs detached; the returned handle may be ignored.
    pub fn export_observations(&self) -> JoinHandle<()> {
        let source = Arc::clone(&self.source);
        let search = self.query.snapshot().search;
        info!("{EXPORT_NOTICE}");
        tokio::spawn(async move {
            if let Err(err) = source.export_observations(&search).await {
                warn!("export failed: {err}");
            }
        })
    }

    /// Re-attach the per-record collaborators, e.g. when the view becomes
    /// visible again.
    pub fn activate(&mut self) {
        if let Some(oid) = self.record.id.clone() {
            self.acquire(oid);
        }
    }

    /// Detach from every collaborator and drop the displayed record.
    pub fn dispose(&mut self) {
        if let Some(oid) = self.managed.take() {
            self.loader.release(&oid);
        }
        self.position = Position::default();
        self.record = Observation::default();
        self.loading = false;
        self.publish();
    }

    async fn move_to(&mut self, target: Option<Position>) {
        let Some(target) = target else {
            return;
        };
        self.position = target;
        self.publish();
        self.lookup_id().await;
    }

    fn acquire(&mut self, oid: ObjectId) {
        self.loader.acquire(&oid);
        self.managed = Some(oid);
    }

    /// Fetch the count and clamp the position to it. Returns `false` when
    /// the request failed and the query error flag was raised.
    async fn fetch_count(&mut self) -> bool {
        self.loading = true;
        self.publish();
        let search = self.query.snapshot().search;
        match self.source.count(self.session, &search).await {
            Ok(count) => {
                debug!(count, search = %search, "counted observations");
                self.position = self.position.with_count(count);
                self.query_error = false;
                self.publish();
                true
            }
            Err(err) => {
                warn!("count failed: {err}");
                self.query_error = true;
                self.loading = false;
                self.publish();
                false
            }
        }
    }

    /// Ask where the current record sits in the current ordering. The
    /// answer only moves the cursor under [`ResortPolicy::FollowRecord`] or
    /// while seeking the initial record.
    async fn realign(&mut self) {
        if self.position.is_empty() {
            return;
        }
        let seeking_initial = self.pending_initial.take();
        let follow = seeking_initial.is_some() || self.policy == ResortPolicy::FollowRecord;
        let Some(oid) = seeking_initial.or_else(|| self.record.id.clone()) else {
            return;
        };
        let query = self.query.snapshot();
        match self.source.index_of(self.session, &query, &oid).await {
            Ok(lookup) => {
                if follow
                    && let Some(index) = lookup.index
                    && index < self.position.count()
                {
                    self.position = self.position.with_index(index);
                }
            }
            Err(err) => debug!("index lookup for {oid} failed: {err}"),
        }
    }

    async fn lookup_once(&mut self) -> Lookup {
        if self.position.is_empty() {
            self.record = Observation::default();
            self.loading = false;
            self.publish();
            return Lookup::Empty;
        }
        self.loading = true;
        self.publish();
        let query = self.query.snapshot();
        let index = self.position.index();
        match self.source.identifier_at(self.session, &query, index).await {
            Ok(oid) => {
                debug!(index, oid = %oid, "resolved position");
                self.record.id = Some(oid);
                self.loading = false;
                self.publish();
                self.load_observation().await;
                Lookup::Loaded
            }
            Err(err) if err.is_out_of_range() => {
                self.loading = false;
                self.publish();
                Lookup::OutOfRange
            }
            Err(err) => {
                warn!(index, "identifier lookup failed: {err}");
                self.loading = false;
                self.publish();
                Lookup::Failed
            }
        }
    }

    async fn fetch_record(&mut self, acquire: bool) {
        let Some(oid) = self.record.id.clone() else {
            return;
        };
        let loaded = self.loader.load(&oid).await;
        let replaced = merge_loaded(&mut self.record, loaded);
        if replaced && acquire {
            self.acquire(oid);
        }
        self.publish();
    }
}
