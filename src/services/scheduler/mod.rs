mod tokio_scheduler;
mod virtual_scheduler;
mod r#trait;

pub use self::r#trait::{Scheduler, Task, TimerHandle};
pub use self::tokio_scheduler::TokioScheduler;
pub use self::virtual_scheduler::VirtualScheduler;
