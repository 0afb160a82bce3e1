use log::debug;
use parking_lot::RwLock;
use std::sync::Arc;

/// Fired after a document write is durable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCommitted {
    pub document_id: String,
}

impl DocumentCommitted {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
        }
    }
}

/// Receives commit events. Must return quickly: it runs on the writer's path.
pub trait CommitListener: Send + Sync {
    fn on_commit(&self, event: &DocumentCommitted);
}

/// Registry of listeners notified after each document commit
#[derive(Clone, Default)]
pub struct CommitHooks {
    listeners: Arc<RwLock<Vec<Arc<dyn CommitListener>>>>,
}

impl CommitHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: Arc<dyn CommitListener>) {
        self.listeners.write().push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    pub fn notify(&self, event: &DocumentCommitted) {
        // Snapshot so a listener may register others without deadlocking
        let listeners: Vec<_> = self.listeners.read().iter().cloned().collect();
        debug!("Document {} committed, notifying {} listener(s)", event.document_id, listeners.len());
        for listener in listeners {
            listener.on_commit(event);
        }
    }
}
