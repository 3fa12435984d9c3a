mod element;
mod r#trait;

pub use self::element::Element;
pub use self::r#trait::{listener, EventTarget, Listener, ListenerId};
