//! Single-ownership wrapper around spawned timer tasks.
//!
//! The coordinator's debounce window and auto-advance countdown must each
//! have at most one live task; replacing one must cancel its predecessor.
//! Owning the task through this type makes the cancel-on-replace atomic:
//! assigning a new timer drops (and thereby aborts) the old one.

use std::future::Future;

use tokio::task::JoinHandle;

/// A spawned task that is aborted when its handle is dropped.
#[derive(Debug)]
pub struct CancellableTimer {
    handle: JoinHandle<()>,
}

impl CancellableTimer {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }
}

impl Drop for CancellableTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    #[allow(unused_assignments)]
    async fn test_replacing_a_timer_cancels_the_old_one() {
        let fired = Arc::new(AtomicU32::new(0));

        let make = |n: u32| {
            let fired = Arc::clone(&fired);
            CancellableTimer::spawn(async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                fired.fetch_add(n, Ordering::SeqCst);
            })
        };

        let mut timer = make(1);
        timer = make(10);

        tokio::time::advance(Duration::from_secs(2)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }

        // Only the replacement ran
        assert_eq!(fired.load(Ordering::SeqCst), 10);
        drop(timer);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_timer_never_fires() {
        let fired = Arc::new(AtomicU32::new(0));
        let fired_clone = Arc::clone(&fired);

        let timer = CancellableTimer::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            fired_clone.store(1, Ordering::SeqCst);
        });
        drop(timer);

        tokio::time::advance(Duration::from_secs(5)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }

        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
