//! Registry lifecycle events and listener subscription.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::types::RegistryStats;

/// Events emitted while the registry (re)discovers modules.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEvent {
    /// A module was read and parsed.
    ModuleLoaded {
        path: PathBuf,
        namespace: String,
        tools: usize,
    },
    /// A module could not be read.
    ModuleError { path: PathBuf, error: String },
    /// A tool entered the catalog.
    ToolRegistered { name: String, namespace: String },
    /// A full discovery pass completed and its catalog is now visible.
    Updated(RegistryStats),
}

impl RegistryEvent {
    /// Event name as `<subject>:<verb>`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ModuleLoaded { .. } => "module:loaded",
            Self::ModuleError { .. } => "module:error",
            Self::ToolRegistered { .. } => "tool:registered",
            Self::Updated(_) => "registry:updated",
        }
    }
}

type Listener = Arc<dyn Fn(&RegistryEvent) + Send + Sync>;

/// Returned by `ToolRegistry::subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
pub(crate) struct EventListeners {
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl EventListeners {
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&RegistryEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Deliver an event to every listener.
    ///
    /// The listener list is cloned first so a listener may subscribe or
    /// unsubscribe without deadlocking.
    pub fn emit(&self, event: &RegistryEvent) {
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(event);
        }
    }
}
