pub mod capabilities;
pub mod classifier;
pub mod event_target;
pub mod replay;
pub mod scheduler;

pub use capabilities::PlatformCapabilities;
pub use classifier::{attach, dispatch_prefixed, ClassifierOptions, InputOriginClassifier, Registration};
pub use event_target::{Element, EventTarget, Listener, ListenerId};
pub use replay::{ReplayReport, Replayer, Scenario};
pub use scheduler::{Scheduler, TimerHandle, TokioScheduler, VirtualScheduler};
