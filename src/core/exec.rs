//! Per-connection sequential execution context.
//!
//! One connection's frames are processed on a single logical task; events
//! that originate elsewhere (an I/O completion, another client's task) must
//! be handed off rather than run inline. The executor is that hand-off: a
//! single-consumer job queue drained by one spawned task, so everything
//! submitted to a connection runs in submission order with no overlap.

use tokio::sync::mpsc;

enum Job {
    Run(Box<dyn FnOnce() + Send + 'static>),
    Shutdown,
}

/// Cloneable handle to one connection's job queue.
#[derive(Debug, Clone)]
pub struct ConnectionExecutor {
    tx: mpsc::UnboundedSender<Job>,
}

impl ConnectionExecutor {
    /// Spawn the drain task on the current tokio runtime.
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                match job {
                    Job::Run(run) => run(),
                    Job::Shutdown => break,
                }
            }
        });
        Self { tx }
    }

    /// Enqueue a job; returns false once the executor has shut down.
    pub fn execute<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx.send(Job::Run(Box::new(job))).is_ok()
    }

    /// Stop the drain task after the jobs already queued have run. Later
    /// submissions are rejected, not silently dropped.
    pub fn close(&self) {
        let _ = self.tx.send(Job::Shutdown);
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_jobs_run_in_submission_order() {
        let exec = ConnectionExecutor::spawn();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for n in 0..100 {
            let seen = seen.clone();
            assert!(exec.execute(move || seen.lock().unwrap().push(n)));
        }

        let (tx, rx) = oneshot::channel();
        exec.execute(move || {
            let _ = tx.send(());
        });
        rx.await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 100);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_close_rejects_later_jobs_but_drains_queued_ones() {
        let exec = ConnectionExecutor::spawn();

        let (tx, rx) = oneshot::channel();
        assert!(exec.execute(move || {
            let _ = tx.send(());
        }));
        exec.close();

        // The job queued before close still runs.
        rx.await.unwrap();

        // The drain task is gone; give the channel a moment to observe it.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(exec.is_closed());
        assert!(!exec.execute(|| {}));
    }
}
