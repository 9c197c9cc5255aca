use obsnav_protocol::Direction;
use obsnav_protocol::Query;
use obsnav_protocol::SortKey;
use std::sync::Arc;
use tokio::sync::watch;

/// Query state shared between the navigator and the controls that edit it.
///
/// Every clone refers to the same query; any holder may mutate it and every
/// [`QueryWatcher`] observes the result.
#[derive(Clone, Debug)]
pub struct SharedQuery {
    inner: Arc<watch::Sender<Query>>,
}

/// What moved between two observed query values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryChange {
    pub filter: bool,
    pub ordering: bool,
    pub query: Query,
}

impl SharedQuery {
    pub fn new(query: Query) -> Self {
        let (tx, _rx) = watch::channel(query);
        Self {
            inner: Arc::new(tx),
        }
    }

    pub fn snapshot(&self) -> Query {
        self.inner.borrow().clone()
    }

    pub fn set_search(&self, search: impl Into<String>) {
        let search = search.into();
        self.inner.send_if_modified(|query| {
            if query.search == search {
                return false;
            }
            query.search = search;
            true
        });
    }

    pub fn set_sort(&self, sort: SortKey) {
        self.inner.send_if_modified(|query| {
            if query.sort == sort {
                return false;
            }
            query.sort = sort;
            true
        });
    }

    pub fn set_direction(&self, direction: Direction) {
        self.inner.send_if_modified(|query| {
            if query.direction == direction {
                return false;
            }
            query.direction = direction;
            true
        });
    }

    pub fn replace(&self, next: Query) {
        self.inner.send_if_modified(|query| {
            if *query == next {
                return false;
            }
            *query = next;
            true
        });
    }

    pub fn subscribe(&self) -> QueryWatcher {
        let rx = self.inner.subscribe();
        let last = rx.borrow().clone();
        QueryWatcher { rx, last }
    }
}

/// Receives query mutations as classified changes.
#[derive(Debug)]
pub struct QueryWatcher {
    rx: watch::Receiver<Query>,
    last: Query,
}

impl QueryWatcher {
    /// Wait for the next effective change. Returns `None` once every
    /// [`SharedQuery`] handle has been dropped.
    pub async fn changed(&mut self) -> Option<QueryChange> {
        loop {
            self.rx.changed().await.ok()?;
            let current = self.rx.borrow_and_update().clone();
            let filter = current.search != self.last.search;
            let ordering = current.ordering_differs(&self.last);
            self.last = current.clone();
            if filter || ordering {
                return Some(QueryChange {
                    filter,
                    ordering,
                    query: current,
                });
            }
        }
    }
}
