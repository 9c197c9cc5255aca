use obsnav_protocol::ObjectEvent;
use obsnav_protocol::ObjectEventKind;
use obsnav_protocol::ObjectId;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

const DEFAULT_CAPACITY: usize = 256;

/// Collection-wide created/changed/deleted notifications, one stream per
/// kind. Producers publish; navigators subscribe to the streams they need.
#[derive(Clone, Debug)]
pub struct ObjectEventBus {
    created: broadcast::Sender<ObjectEvent>,
    changed: broadcast::Sender<ObjectEvent>,
    deleted: broadcast::Sender<ObjectEvent>,
}

impl Default for ObjectEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ObjectEventBus {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            created: broadcast::channel(capacity).0,
            changed: broadcast::channel(capacity).0,
            deleted: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, kind: ObjectEventKind) -> &broadcast::Sender<ObjectEvent> {
        match kind {
            ObjectEventKind::Created => &self.created,
            ObjectEventKind::Changed => &self.changed,
            ObjectEventKind::Deleted => &self.deleted,
        }
    }

    /// Deliver an event to every current subscriber of its stream and
    /// return how many there were.
    pub fn publish(&self, event: ObjectEvent) -> usize {
        self.sender(event.kind).send(event).unwrap_or(0)
    }

    pub fn subscribe(&self, kind: ObjectEventKind) -> broadcast::Receiver<ObjectEvent> {
        self.sender(kind).subscribe()
    }

    pub fn subscriber_count(&self, kind: ObjectEventKind) -> usize {
        self.sender(kind).receiver_count()
    }
}

/// What a matching notification means for a navigator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invalidation {
    /// Count or ordering may have drifted.
    Stale,
    /// A record changed; the list may have drifted and the record itself
    /// must be refreshed if it is on screen.
    Changed(ObjectId),
}

enum Step {
    Yield(Invalidation),
    Skip,
    Closed,
}

/// Subscription to the three notification streams, filtered to one
/// collection type. Dropping or disposing it unsubscribes.
#[derive(Debug)]
pub struct InvalidationListener {
    otype: String,
    created: Option<broadcast::Receiver<ObjectEvent>>,
    changed: Option<broadcast::Receiver<ObjectEvent>>,
    deleted: Option<broadcast::Receiver<ObjectEvent>>,
}

impl InvalidationListener {
    pub fn subscribe(bus: &ObjectEventBus, otype: impl Into<String>) -> Self {
        Self {
            otype: otype.into(),
            created: Some(bus.subscribe(ObjectEventKind::Created)),
            changed: Some(bus.subscribe(ObjectEventKind::Changed)),
            deleted: Some(bus.subscribe(ObjectEventKind::Deleted)),
        }
    }

    pub fn otype(&self) -> &str {
        &self.otype
    }

    /// Next invalidation for this collection type, or `None` once every
    /// stream has closed.
    pub async fn next(&mut self) -> Option<Invalidation> {
        loop {
            let (kind, result) = tokio::select! {
                result = recv(&mut self.created), if self.created.is_some() => {
                    (ObjectEventKind::Created, result)
                }
                result = recv(&mut self.changed), if self.changed.is_some() => {
                    (ObjectEventKind::Changed, result)
                }
                result = recv(&mut self.deleted), if self.deleted.is_some() => {
                    (ObjectEventKind::Deleted, result)
                }
                else => return None,
            };
            match self.classify(kind, result) {
                Step::Yield(invalidation) => return Some(invalidation),
                Step::Skip => {}
                Step::Closed => match kind {
                    ObjectEventKind::Created => self.created = None,
                    ObjectEventKind::Changed => self.changed = None,
                    ObjectEventKind::Deleted => self.deleted = None,
                },
            }
        }
    }

    fn classify(
        &self,
        kind: ObjectEventKind,
        result: Result<ObjectEvent, RecvError>,
    ) -> Step {
        match result {
            Ok(event) if !event.matches(&self.otype) => Step::Skip,
            Ok(event) => match kind {
                ObjectEventKind::Changed => Step::Yield(Invalidation::Changed(event.object.oid)),
                ObjectEventKind::Created | ObjectEventKind::Deleted => {
                    Step::Yield(Invalidation::Stale)
                }
            },
            Err(RecvError::Lagged(skipped)) => {
                warn!(stream = %kind, skipped, "notification stream lagged");
                Step::Yield(Invalidation::Stale)
            }
            Err(RecvError::Closed) => Step::Closed,
        }
    }

    pub fn dispose(self) {}
}

async fn recv(
    receiver: &mut Option<broadcast::Receiver<ObjectEvent>>,
) -> Result<ObjectEvent, RecvError> {
    match receiver {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}
