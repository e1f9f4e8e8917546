//! Reactive documents
//!
//! A [`Document`] owns a value and notifies two kinds of observers after
//! every change:
//!
//! - **watchers** run first, in registration order, and may repair the value
//!   in place. Their repairs do not trigger another round of notification.
//! - **subscribers** run afterwards with the settled value, read-only.
//!
//! Both are registered under a [`Uuid`] and removed with the matching
//! `unwatch` / `unsubscribe` call.

use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Validation state of a document
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DocumentStatus {
    /// No validation pass has run yet
    Uninitialized,
    /// The last pass found the value conforming
    Valid,
    /// The last pass found a violation; the policy repaired what it could
    InvalidRepaired,
}

/// Reacts to a document change, possibly repairing the value.
pub trait Watcher<T>: Send + Sync {
    fn name(&self) -> &str;

    /// Inspect (and possibly repair) the changed value.
    fn observe(&self, value: &mut T) -> DocumentStatus;
}

/// Metadata for a document
#[derive(Clone, Debug, Serialize)]
pub struct DocumentMetadata {
    pub id: Uuid,
    pub name: String,
    pub version: u64,
}

pub struct Document<T> {
    metadata: DocumentMetadata,
    value: T,
    status: DocumentStatus,
    watchers: Vec<(Uuid, Box<dyn Watcher<T>>)>,
    subscribers: HashMap<Uuid, Box<dyn Fn(&T) + Send + Sync>>,
}

impl<T> Document<T> {
    pub fn new(name: &str, initial_value: T) -> Self {
        Self {
            metadata: DocumentMetadata {
                id: Uuid::new_v4(),
                name: name.to_string(),
                version: 1,
            },
            value: initial_value,
            status: DocumentStatus::Uninitialized,
            watchers: Vec::new(),
            subscribers: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    /// Number of changes observed so far (starts at 1)
    pub fn version(&self) -> u64 {
        self.metadata.version
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    /// Get the current value
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Replace the value and notify observers
    pub fn set(&mut self, new_value: T) {
        self.value = new_value;
        self.notify();
    }

    /// Mutate the value in place and notify observers
    pub fn update<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.value);
        self.notify();
        result
    }

    /// Mutate the value in place; observers are notified only when `f`
    /// reports a change by returning `Some`.
    pub fn update_if<R>(&mut self, f: impl FnOnce(&mut T) -> Option<R>) -> Option<R> {
        let result = f(&mut self.value);
        if result.is_some() {
            self.notify();
        }
        result
    }

    /// Register a watcher. With `immediate` it runs once right away.
    pub fn watch(&mut self, watcher: Box<dyn Watcher<T>>, immediate: bool) -> Uuid {
        let id = Uuid::new_v4();
        if immediate {
            let status = watcher.observe(&mut self.value);
            self.record_status(watcher.name(), status);
        }
        self.watchers.push((id, watcher));
        id
    }

    pub fn unwatch(&mut self, id: Uuid) -> bool {
        let before = self.watchers.len();
        self.watchers.retain(|(watcher_id, _)| *watcher_id != id);
        self.watchers.len() != before
    }

    /// Subscribe to settled values
    pub fn subscribe(&mut self, callback: Box<dyn Fn(&T) + Send + Sync>) -> Uuid {
        let id = Uuid::new_v4();
        self.subscribers.insert(id, callback);
        id
    }

    pub fn unsubscribe(&mut self, id: Uuid) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    /// Drop every watcher and subscriber
    pub fn clear_observers(&mut self) {
        self.watchers.clear();
        self.subscribers.clear();
    }

    fn notify(&mut self) {
        self.metadata.version += 1;

        let mut status = None;
        for (_, watcher) in &self.watchers {
            let observed = watcher.observe(&mut self.value);
            log::debug!(
                "{} watcher {} -> {:?}",
                self.metadata.name,
                watcher.name(),
                observed
            );
            status = Some(match (status, observed) {
                (Some(DocumentStatus::InvalidRepaired), _) => DocumentStatus::InvalidRepaired,
                (_, observed) => observed,
            });
        }
        if let Some(status) = status {
            self.status = status;
        }

        for callback in self.subscribers.values() {
            callback(&self.value);
        }
    }

    fn record_status(&mut self, watcher: &str, status: DocumentStatus) {
        log::debug!("{} watcher {} -> {:?}", self.metadata.name, watcher, status);
        self.status = status;
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Document<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("metadata", &self.metadata)
            .field("status", &self.status)
            .field("value", &self.value)
            .field("watchers", &self.watchers.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
