pub mod input;
pub mod synthetic;

pub use input::{Event, PointerType};
pub use synthetic::{prefixed_type, CustomEventInit, InputOrigin};

/// Event names the classifier listens for
pub mod names {
    pub const MS_POINTER_DOWN: &str = "MSPointerDown";
    pub const POINTER_DOWN: &str = "pointerdown";
    pub const MS_POINTER_UP: &str = "MSPointerUp";
    pub const POINTER_UP: &str = "pointerup";
    pub const TOUCH_START: &str = "touchstart";
    pub const TOUCH_END: &str = "touchend";
}
