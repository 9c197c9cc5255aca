use obsnav_protocol::ObjectId;
use parking_lot::Mutex;
use tracing::debug;

/// A collaborator that attaches to one record at a time, such as the
/// attribute or tag editor.
///
/// `manage` with a new target supersedes the previous one; `release` only
/// detaches when the given target is still the managed one.
pub trait ScopedManager: Send + Sync {
    fn manage(&self, otype: &str, oid: &ObjectId);
    fn release(&self, otype: &str, oid: &ObjectId);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeTarget {
    pub otype: String,
    pub oid: ObjectId,
}

/// Keeps track of which record a named collaborator is attached to.
#[derive(Debug)]
pub struct ScopeRegistry {
    name: &'static str,
    current: Mutex<Option<ScopeTarget>>,
}

impl ScopeRegistry {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            current: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn current(&self) -> Option<ScopeTarget> {
        self.current.lock().clone()
    }
}

impl ScopedManager for ScopeRegistry {
    fn manage(&self, otype: &str, oid: &ObjectId) {
        debug!(manager = self.name, otype, oid = %oid, "manage");
        *self.current.lock() = Some(ScopeTarget {
            otype: otype.to_string(),
            oid: oid.clone(),
        });
    }

    fn release(&self, otype: &str, oid: &ObjectId) {
        let mut current = self.current.lock();
        let matches = current
            .as_ref()
            .is_some_and(|target| target.otype == otype && &target.oid == oid);
        if matches {
            debug!(manager = self.name, otype, oid = %oid, "release");
            *current = None;
        }
    }
}
