use crate::classifier_error;
use crate::debug_if_enabled;
use crate::error::Result;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use super::r#trait::{Scheduler, Task, TimerHandle};

/// Scheduler backed by tokio tasks: each timer is a spawned `sleep` that is
/// aborted on cancel.
#[derive(Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    /// Bind to the runtime of the calling context
    pub fn new() -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| classifier_error!(internal, "no tokio runtime available: {}", e))?;
        Ok(Self { runtime })
    }

    pub fn with_handle(runtime: Handle) -> Self {
        Self { runtime }
    }
}

struct TokioTimer {
    handle: JoinHandle<()>,
}

impl TimerHandle for TokioTimer {
    fn cancel(self: Box<Self>) {
        self.handle.abort();
    }
}

impl Scheduler for TokioScheduler {
    fn after(&self, delay: Duration, task: Task) -> Box<dyn TimerHandle> {
        debug_if_enabled!("Scheduling timer in {}ms", delay.as_millis());
        let handle = self.runtime.spawn(async move {
            sleep(delay).await;
            task();
        });
        Box::new(TokioTimer { handle })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn timer_fires_after_delay() {
        let scheduler = TokioScheduler::new().unwrap();
        let fired = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&fired);
        let _timer = scheduler.after(
            Duration::from_millis(1000),
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );

        sleep(Duration::from_millis(999)).await;
        assert!(!fired.load(Ordering::SeqCst));

        sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let scheduler = TokioScheduler::new().unwrap();
        let fired = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&fired);
        let timer = scheduler.after(
            Duration::from_millis(100),
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );
        timer.cancel();

        sleep(Duration::from_millis(500)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn new_outside_runtime_fails() {
        assert!(TokioScheduler::new().is_err());
    }
}
