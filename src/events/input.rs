use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Kind of device that produced a pointer event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerType {
    Mouse,
    Pen,
    Touch,
    #[serde(untagged)]
    Other(String),
}

impl PointerType {
    pub fn is_touch(&self) -> bool {
        matches!(self, PointerType::Touch)
    }

    pub fn as_str(&self) -> &str {
        match self {
            PointerType::Mouse => "mouse",
            PointerType::Pen => "pen",
            PointerType::Touch => "touch",
            PointerType::Other(name) => name,
        }
    }
}

impl From<&str> for PointerType {
    fn from(value: &str) -> Self {
        match value {
            "mouse" => PointerType::Mouse,
            "pen" => PointerType::Pen,
            "touch" => PointerType::Touch,
            other => PointerType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PointerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event delivered to an [`EventTarget`](crate::services::EventTarget).
///
/// Native input events and synthetic classification events share this type.
/// Synthetic events carry the event they were derived from in `detail`.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_type: String,
    pub bubbles: bool,
    pub cancelable: bool,
    pub pointer_type: Option<PointerType>,
    pub detail: Option<Arc<Event>>,
    pub timestamp: std::time::Instant,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            bubbles: false,
            cancelable: false,
            pointer_type: None,
            detail: None,
            timestamp: std::time::Instant::now(),
        }
    }

    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    pub fn with_cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    pub fn with_pointer_type(mut self, pointer_type: PointerType) -> Self {
        self.pointer_type = Some(pointer_type);
        self
    }

    /// Pointer event from a touch contact
    pub fn touch_pointer(event_type: impl Into<String>) -> Self {
        Self::new(event_type).with_pointer_type(PointerType::Touch)
    }

    pub fn is_touch_pointer(&self) -> bool {
        self.pointer_type.as_ref().is_some_and(PointerType::is_touch)
    }

    pub fn into_shared(self) -> Arc<Event> {
        Arc::new(self)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event_type)?;
        if let Some(pointer_type) = &self.pointer_type {
            write!(f, "[{}]", pointer_type)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, " <- {}", detail)?;
        }
        Ok(())
    }
}
