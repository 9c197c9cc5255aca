use std::sync::Arc;

use async_trait::async_trait;
use obsnav_navigator::IndexLookup;
use obsnav_navigator::Navigator;
use obsnav_navigator::NavigatorError;
use obsnav_navigator::NavigatorOptions;
use obsnav_navigator::ObservationSource;
use obsnav_navigator::ResortPolicy;
use obsnav_navigator::Result;
use obsnav_navigator::Scopes;
use obsnav_navigator::ScopedManager;
use obsnav_navigator::SharedQuery;
use obsnav_protocol::Direction;
use obsnav_protocol::OBSERVATIONS_OTYPE;
use obsnav_protocol::ObjectId;
use obsnav_protocol::Observation;
use obsnav_protocol::Query;
use obsnav_protocol::SessionId;
use parking_lot::Mutex;
use reqwest::StatusCode;
use tokio::time::Instant;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Count { session: SessionId, search: String },
    IdentifierAt(usize),
    IndexOf(ObjectId),
    Observation(ObjectId),
    AttributesPre(ObjectId),
    Export(String),
}

#[derive(Default)]
struct FakeState {
    records: Vec<Observation>,
    /// Count to report instead of the real one.
    reported_count: Option<usize>,
    fail_count: bool,
    calls: Vec<Call>,
    count_times: Vec<Instant>,
}

/// In-memory collection. Records are ordered by id; `search` keeps records
/// whose id contains it.
#[derive(Default)]
pub struct FakeSource {
    state: Mutex<FakeState>,
}

impl FakeSource {
    pub fn with_records(count: usize) -> Arc<Self> {
        let source = Self::default();
        source.state.lock().records = (0..count).map(|i| record(&oid(i), "fresh")).collect();
        Arc::new(source)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn count_times(&self) -> Vec<Instant> {
        self.state.lock().count_times.clone()
    }

    pub fn truncate(&self, len: usize) {
        self.state.lock().records.truncate(len);
    }

    pub fn report_count(&self, count: Option<usize>) {
        self.state.lock().reported_count = count;
    }

    pub fn fail_count(&self, fail: bool) {
        self.state.lock().fail_count = fail;
    }

    pub fn retag(&self, id: &ObjectId, tag: &str) {
        let mut state = self.state.lock();
        if let Some(record) = state
            .records
            .iter_mut()
            .find(|record| record.id.as_ref() == Some(id))
        {
            record.tags = vec![tag.to_string()];
        }
    }

    fn ordered(state: &FakeState, query: &Query) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = state
            .records
            .iter()
            .filter_map(|record| record.id.clone())
            .filter(|id| id.as_str().contains(&query.search))
            .collect();
        ids.sort();
        if query.direction == Direction::Descending {
            ids.reverse();
        }
        ids
    }
}

#[async_trait]
impl ObservationSource for FakeSource {
    async fn count(&self, session: SessionId, search: &str) -> Result<usize> {
        let mut state = self.state.lock();
        state.calls.push(Call::Count {
            session,
            search: search.to_string(),
        });
        state.count_times.push(Instant::now());
        if state.fail_count {
            return Err(NavigatorError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "boom".to_string(),
            });
        }
        let query = Query {
            search: search.to_string(),
            ..Query::default()
        };
        let actual = Self::ordered(&state, &query).len();
        Ok(state.reported_count.unwrap_or(actual))
    }

    async fn identifier_at(
        &self,
        _session: SessionId,
        query: &Query,
        index: usize,
    ) -> Result<ObjectId> {
        let mut state = self.state.lock();
        state.calls.push(Call::IdentifierAt(index));
        Self::ordered(&state, query)
            .get(index)
            .cloned()
            .ok_or(NavigatorError::OutOfRange { index })
    }

    async fn index_of(
        &self,
        _session: SessionId,
        query: &Query,
        oid: &ObjectId,
    ) -> Result<IndexLookup> {
        let mut state = self.state.lock();
        state.calls.push(Call::IndexOf(oid.clone()));
        let index = Self::ordered(&state, query)
            .iter()
            .position(|candidate| candidate == oid);
        Ok(IndexLookup {
            oid: Some(oid.clone()),
            index,
        })
    }

    async fn observation(&self, oid: &ObjectId) -> Result<Observation> {
        let mut state = self.state.lock();
        state.calls.push(Call::Observation(oid.clone()));
        state
            .records
            .iter()
            .find(|record| record.id.as_ref() == Some(oid))
            .cloned()
            .ok_or_else(|| NavigatorError::NotFound(oid.clone()))
    }

    async fn attributes_pre(&self, oid: &ObjectId) -> Result<String> {
        self.state
            .lock()
            .calls
            .push(Call::AttributesPre(oid.clone()));
        Ok(format!("attributes of {oid}"))
    }

    async fn export_observations(&self, search: &str) -> Result<()> {
        self.state
            .lock()
            .calls
            .push(Call::Export(search.to_string()));
        Ok(())
    }
}

/// Records every manage/release it receives.
#[derive(Default)]
pub struct RecordingScope {
    log: Mutex<Vec<(&'static str, ObjectId)>>,
}

impl RecordingScope {
    pub fn log(&self) -> Vec<(&'static str, ObjectId)> {
        self.log.lock().clone()
    }

    pub fn managed(&self) -> Option<ObjectId> {
        let mut current = None;
        for (action, oid) in self.log.lock().iter() {
            match *action {
                "manage" => current = Some(oid.clone()),
                _ if current.as_ref() == Some(oid) => current = None,
                _ => {}
            }
        }
        current
    }
}

impl ScopedManager for RecordingScope {
    fn manage(&self, otype: &str, oid: &ObjectId) {
        assert_eq!(otype, OBSERVATIONS_OTYPE);
        self.log.lock().push(("manage", oid.clone()));
    }

    fn release(&self, otype: &str, oid: &ObjectId) {
        assert_eq!(otype, OBSERVATIONS_OTYPE);
        self.log.lock().push(("release", oid.clone()));
    }
}

pub struct Harness {
    pub source: Arc<FakeSource>,
    pub attributes: Arc<RecordingScope>,
    pub tags: Arc<RecordingScope>,
    pub query: SharedQuery,
}

impl Harness {
    pub fn new(source: Arc<FakeSource>) -> Self {
        Self {
            source,
            attributes: Arc::new(RecordingScope::default()),
            tags: Arc::new(RecordingScope::default()),
            query: SharedQuery::new(Query::default()),
        }
    }

    pub fn navigator(&self, policy: ResortPolicy, initial_oid: Option<ObjectId>) -> Navigator {
        Navigator::new(
            self.source.clone(),
            Scopes {
                attributes: self.attributes.clone(),
                tags: self.tags.clone(),
            },
            self.query.clone(),
            NavigatorOptions {
                otype: OBSERVATIONS_OTYPE.to_string(),
                policy,
                initial_oid,
            },
        )
    }
}

pub fn oid(index: usize) -> ObjectId {
    ObjectId::new(format!("obs-{index}"))
}

pub fn record(id: &ObjectId, tag: &str) -> Observation {
    Observation {
        id: Some(id.clone()),
        tags: vec![tag.to_string()],
        ..Observation::default()
    }
}
