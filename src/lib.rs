//! Tells touch input apart from mouse input.
//!
//! Attach an [`InputOriginClassifier`] to an [`EventTarget`] for an event
//! type such as `"click"`; every `click` is then re-dispatched on the same
//! target as `touchclick` or `mouseclick`, with the original event in
//! [`Event::detail`].
//!
//! ```
//! use std::sync::Arc;
//! use touch_origin::{attach, Element, Event, EventTarget, PlatformCapabilities, VirtualScheduler};
//!
//! let element = Element::shared("button");
//! let _registration = attach(
//!     &element,
//!     "click",
//!     PlatformCapabilities::touch_only(),
//!     Arc::new(VirtualScheduler::new()),
//! )
//! .unwrap();
//!
//! element.dispatch_event(Event::new("touchstart").into_shared()).unwrap();
//! element.dispatch_event(Event::new("click").into_shared()).unwrap(); // -> touchclick
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod services;
mod utils;

pub use config::Config;
pub use error::{ClassifierError, Result};
pub use events::{CustomEventInit, Event, InputOrigin, PointerType};
pub use services::{
    attach, dispatch_prefixed, ClassifierOptions, Element, EventTarget, InputOriginClassifier,
    PlatformCapabilities, Registration, Replayer, Scenario, Scheduler, TimerHandle,
    TokioScheduler, VirtualScheduler,
};
