use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    MetadataUpdated,
    FileMoved,
    FileCreated,
    FileDeleted,
    ReferenceUpdated,
    FileReordered,
}

impl Display for ChangeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChangeKind::MetadataUpdated => "metadata-updated",
            ChangeKind::FileMoved => "file-moved",
            ChangeKind::FileCreated => "file-created",
            ChangeKind::FileDeleted => "file-deleted",
            ChangeKind::ReferenceUpdated => "reference-updated",
            ChangeKind::FileReordered => "file-reordered",
        };
        f.write_str(name)
    }
}

/// A change to the project, published after it has been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Canonical project-relative subject path.
    pub path: String,
    /// Path before a move.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            previous_path: None,
            metadata: None,
        }
    }

    pub fn moved(previous_path: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            previous_path: Some(previous_path.into()),
            ..Self::new(ChangeKind::FileMoved, path)
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

impl Display for ChangeEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.previous_path {
            Some(previous) => write!(f, "{} {} -> {}", self.kind, previous, self.path),
            None => write!(f, "{} {}", self.kind, self.path),
        }
    }
}

pub type Listener = dyn Fn(&ChangeEvent) -> anyhow::Result<()> + Send + Sync;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Arc<Listener>)>,
}

fn lock(listeners: &Mutex<Listeners>) -> MutexGuard<'_, Listeners> {
    // Listeners never run under the lock; a poisoned list is still consistent.
    listeners.lock().unwrap_or_else(|e| e.into_inner())
}

/// Synchronous fan-out of `ChangeEvent`s to subscribed listeners.
///
/// Listeners run on the publishing thread in subscription order. A listener
/// that fails or panics is logged and skipped; the others still run.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<Mutex<Listeners>>,
}

/// Handle returned by [`EventBus::subscribe`].
///
/// Dropping the handle keeps the listener subscribed; call [`Subscription::release`].
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    /// Unsubscribe. Returns false if the listener was already gone.
    pub fn release(self) -> bool {
        let Some(listeners) = self.listeners.upgrade() else {
            return false;
        };
        let mut guard = lock(&listeners);
        let before = guard.entries.len();
        guard.entries.retain(|(id, _)| *id != self.id);
        before != guard.entries.len()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ChangeEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut guard = lock(&self.listeners);
        let id = guard.next_id;
        guard.next_id += 1;
        guard.entries.push((id, Arc::new(listener)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Deliver `event` to every current listener. Returns how many handled it
    /// without error.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        // Snapshot so listeners may subscribe or release while being called.
        let snapshot: Vec<(u64, Arc<Listener>)> = lock(&self.listeners).entries.clone();

        let mut delivered = 0;
        for (id, listener) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => tracing::error!("Listener {} failed on {}: {:?}", id, event, e),
                Err(_) => tracing::error!("Listener {} panicked on {}", id, event),
            }
        }
        tracing::debug!("Published {} to {} listeners", event, delivered);
        delivered
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).entries.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
