//! `schedule(task, interval)` fires `task` every `interval` starting
//! immediately, on a dedicated tokio task. If `task` returns an
//! unrecoverable error the schedule cancels itself rather than retrying
//! forever.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::error::NodeError;

/// A cancellable handle to a running schedule. Dropping it does not stop
/// the loop; call `cancel` explicitly.
pub struct ScheduleHandle {
    task: JoinHandle<()>,
}

impl ScheduleHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }
}

/// Spawns a task that calls `task` every `interval`, starting immediately.
/// `task` returns `Result<(), NodeError>`; an `Err` cancels the schedule
/// after logging it, leaving the node reachable but no longer
/// self-maintaining on this particular schedule.
pub fn schedule<F, Fut>(name: &'static str, interval: Duration, mut task: F) -> ScheduleHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), NodeError>> + Send,
{
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(e) = task().await {
                log::error!("schedule '{}' cancelled after unrecoverable error: {}", name, e);
                break;
            }
        }
    });
    ScheduleHandle { task: handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn fires_repeatedly_until_cancelled() {
        let count = Arc::new(AtomicUsize::new(0));
        let counted = count.clone();
        let handle = schedule("test", Duration::from_millis(5), move || {
            let counted = counted.clone();
            async move {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.cancel();
        assert!(count.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn stops_after_unrecoverable_error() {
        let count = Arc::new(AtomicUsize::new(0));
        let counted = count.clone();
        let _handle = schedule("test", Duration::from_millis(5), move || {
            let counted = counted.clone();
            async move {
                counted.fetch_add(1, Ordering::SeqCst);
                Err(NodeError::Scheduling("boom".into()))
            }
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
