use crate::error::{ClassifierError, Result};
use crate::events::Event;
use crate::trace_if_enabled;
use dashmap::DashMap;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::r#trait::{EventTarget, Listener, ListenerId};

type ListenerList = SmallVec<[(ListenerId, Listener); 4]>;

/// In-process event target with a per-type listener registry.
pub struct Element {
    name: String,
    listeners: DashMap<String, ListenerList>,
    next_id: AtomicU64,
    connected: AtomicBool,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        debug!("Creating element '{}'", name);
        Self {
            name,
            listeners: DashMap::new(),
            next_id: AtomicU64::new(1),
            connected: AtomicBool::new(true),
        }
    }

    pub fn shared(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A disconnected element rejects listeners and dispatches.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        self.listeners
            .get(event_type)
            .map(|entry| entry.len())
            .unwrap_or(0)
    }

    /// Event types with at least one listener, sorted
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .listeners
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect();
        types.sort();
        types
    }

    fn check_usable(&self, event_type: &str) -> Result<()> {
        if !self.is_connected() {
            return ClassifierError::invalid_argument(format!(
                "element '{}' is disconnected",
                self.name
            ));
        }
        if event_type.trim().is_empty() {
            return ClassifierError::invalid_argument(format!(
                "blank event type on element '{}'",
                self.name
            ));
        }
        Ok(())
    }
}

impl EventTarget for Element {
    fn add_event_listener(&self, event_type: &str, listener: Listener) -> Result<ListenerId> {
        self.check_usable(event_type)?;

        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .entry(event_type.to_string())
            .or_default()
            .push((id, listener));

        trace_if_enabled!("{}: {} added for '{}'", self.name, id, event_type);
        Ok(id)
    }

    fn remove_event_listener(&self, event_type: &str, id: ListenerId) -> bool {
        match self.listeners.get_mut(event_type) {
            Some(mut entry) => {
                let before = entry.len();
                entry.retain(|(existing, _)| *existing != id);
                before != entry.len()
            }
            None => false,
        }
    }

    fn dispatch_event(&self, event: Arc<Event>) -> Result<usize> {
        self.check_usable(&event.event_type)?;

        // Snapshot so listeners can re-enter this element without holding the shard lock
        let snapshot: ListenerList = match self.listeners.get(&event.event_type) {
            Some(entry) => entry.value().clone(),
            None => return Ok(0),
        };

        trace_if_enabled!(
            "{}: dispatching {} to {} listener(s)",
            self.name,
            event,
            snapshot.len()
        );

        for (_, listener) in &snapshot {
            listener(&event);
        }

        Ok(snapshot.len())
    }
}
