use crate::error::Result;
use crate::events::Event;
use std::fmt;
use std::sync::Arc;

/// Callback invoked for every event of the type it was registered for
pub type Listener = Arc<dyn Fn(&Arc<Event>) + Send + Sync>;

/// Identifies one registered listener on one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Anything that accepts listeners and dispatches events to them.
///
/// Dispatch is synchronous: listeners run on the caller's thread, in
/// registration order, before `dispatch_event` returns. Listeners may
/// dispatch further events on the same target.
pub trait EventTarget: Send + Sync {
    /// Register `listener` for `event_type`. Fails with
    /// [`ClassifierError::InvalidArgument`](crate::error::ClassifierError::InvalidArgument)
    /// when the target cannot take listeners or the type name is blank.
    fn add_event_listener(&self, event_type: &str, listener: Listener) -> Result<ListenerId>;

    /// Returns false when no such listener was registered.
    fn remove_event_listener(&self, event_type: &str, id: ListenerId) -> bool;

    /// Deliver `event` to the listeners of its type. Returns how many ran.
    fn dispatch_event(&self, event: Arc<Event>) -> Result<usize>;
}

/// Build a [`Listener`] from a closure
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Arc<Event>) + Send + Sync + 'static,
{
    Arc::new(f)
}
