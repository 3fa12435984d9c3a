use serde::{Deserialize, Serialize};
use std::fmt;

/// Input features the host platform exposes, read once when a classifier
/// is attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformCapabilities {
    /// Vendor-prefixed pointer events (`MSPointerDown`/`MSPointerUp`)
    pub legacy_pointer_events: bool,
    /// Standard pointer events (`pointerdown`/`pointerup`)
    pub pointer_events: bool,
    /// `touchstart`/`touchend`
    pub touch_events: bool,
    /// Gesture-change events; implies touch input is available
    pub gesture_events: bool,
}

impl PlatformCapabilities {
    /// No touch-related capability at all: everything classifies as mouse
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            legacy_pointer_events: true,
            pointer_events: true,
            touch_events: true,
            gesture_events: true,
        }
    }

    pub fn touch_only() -> Self {
        Self {
            touch_events: true,
            ..Self::default()
        }
    }

    pub fn pointer_only() -> Self {
        Self {
            pointer_events: true,
            ..Self::default()
        }
    }

    pub fn has_pointer_events(&self) -> bool {
        self.legacy_pointer_events || self.pointer_events
    }

    pub fn has_touch_events(&self) -> bool {
        self.touch_events || self.gesture_events
    }

    /// True when no touch signal can ever reach a classifier
    pub fn is_degraded(&self) -> bool {
        !self.has_pointer_events() && !self.has_touch_events()
    }
}

impl fmt::Display for PlatformCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.legacy_pointer_events { parts.push("legacy-pointer"); }
        if self.pointer_events { parts.push("pointer"); }
        if self.touch_events { parts.push("touch"); }
        if self.gesture_events { parts.push("gesture"); }
        if parts.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", parts.join("+"))
        }
    }
}
