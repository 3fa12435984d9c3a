use std::time::Duration;

/// Deferred unit of work
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Pending scheduled task that can be cancelled before it fires
pub trait TimerHandle: Send {
    /// Prevent the task from running. No effect if it already ran.
    fn cancel(self: Box<Self>);
}

/// Delayed-callback facility
pub trait Scheduler: Send + Sync {
    /// Run `task` once `delay` has elapsed
    fn after(&self, delay: Duration, task: Task) -> Box<dyn TimerHandle>;
}
