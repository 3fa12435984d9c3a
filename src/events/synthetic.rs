use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::Event;

/// Inferred origin of a classified event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputOrigin {
    Touch,
    Mouse,
}

impl InputOrigin {
    /// Default event-name prefix for this origin
    pub fn prefix(&self) -> &'static str {
        match self {
            InputOrigin::Touch => "touch",
            InputOrigin::Mouse => "mouse",
        }
    }
}

impl fmt::Display for InputOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Construction parameters for a synthetic event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomEventInit {
    pub bubbles: bool,
    pub cancelable: bool,
    pub detail: Option<Arc<Event>>,
}

impl CustomEventInit {
    /// Init that wraps `original`, copying its propagation flags
    pub fn wrapping(original: &Arc<Event>) -> Self {
        Self {
            bubbles: original.bubbles,
            cancelable: original.cancelable,
            detail: Some(Arc::clone(original)),
        }
    }
}

impl Event {
    pub fn custom(event_type: impl Into<String>, init: CustomEventInit) -> Self {
        let mut event = Event::new(event_type)
            .with_bubbles(init.bubbles)
            .with_cancelable(init.cancelable);
        event.detail = init.detail;
        event
    }
}

/// Name of the synthetic event for `prefix` and the original `event_type`
pub fn prefixed_type(prefix: &str, event_type: &str) -> String {
    let mut name = String::with_capacity(prefix.len() + event_type.len());
    name.push_str(prefix);
    name.push_str(event_type);
    name
}
