//! Dedicated background thread for capture session work

use crate::error::MediaResult;
use parking_lot::Mutex;
use std::thread::{self, JoinHandle, ThreadId};
use tokio::sync::mpsc;
use tracing::{debug, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs submitted jobs one at a time on a named thread
pub struct BackgroundExecutor {
    name: String,
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
}

impl BackgroundExecutor {
    pub fn start(name: impl Into<String>) -> MediaResult<Self> {
        let name = name.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            while let Some(job) = receiver.blocking_recv() {
                job();
            }
        })?;
        debug!(executor = %name, "Background executor started");
        Ok(Self {
            thread_id: handle.thread().id(),
            name,
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a job. Returns false once the executor has quit.
    pub fn execute(&self, job: impl FnOnce() + Send + 'static) -> bool {
        match self.sender.lock().as_ref() {
            Some(sender) => sender.send(Box::new(job)).is_ok(),
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.sender.lock().is_some()
    }

    pub fn is_current_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Stop accepting jobs without waiting. Queued jobs still run and the
    /// thread exits after the last one.
    pub fn quit(&self) {
        if self.sender.lock().take().is_some() {
            debug!(executor = %self.name, "Background executor quitting");
        }
    }

    /// Finish queued jobs, then stop the thread and wait for it.
    ///
    /// Called from one of its own jobs the join is skipped; the thread exits
    /// once that job returns.
    pub fn quit_safely(&self) {
        self.quit();

        if self.is_current_thread() {
            debug!(executor = %self.name, "Quit requested from executor thread; not joining");
            return;
        }
        let Some(handle) = self.handle.lock().take() else {
            return;
        };
        if handle.join().is_err() {
            warn!(executor = %self.name, "Background executor panicked");
        }
        debug!(executor = %self.name, "Background executor stopped");
    }
}

impl Drop for BackgroundExecutor {
    fn drop(&mut self) {
        self.quit_safely();
    }
}

impl std::fmt::Debug for BackgroundExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundExecutor")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc as std_mpsc, Arc};

    #[test]
    fn test_jobs_run_in_order_before_quit_returns() {
        let executor = BackgroundExecutor::start("test-executor").unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5 {
            let order = Arc::clone(&order);
            assert!(executor.execute(move || order.lock().push(i)));
        }
        executor.quit_safely();
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
        assert!(!executor.is_running());
    }

    #[test]
    fn test_execute_after_quit_is_rejected() {
        let executor = BackgroundExecutor::start("test-executor").unwrap();
        executor.quit_safely();
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ran);
        assert!(!executor.execute(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        executor.quit_safely();
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_jobs_run_on_named_thread() {
        let executor = BackgroundExecutor::start("named-executor").unwrap();
        let (tx, rx) = std_mpsc::channel();
        executor.execute(move || {
            let _ = tx.send(thread::current().name().map(str::to_string));
        });
        assert_eq!(rx.recv().unwrap().as_deref(), Some("named-executor"));
    }

    #[test]
    fn test_quit_drains_queue_without_joining() {
        let executor = BackgroundExecutor::start("quit-executor").unwrap();
        let (release_tx, release_rx) = std_mpsc::channel::<()>();
        let ran = Arc::new(AtomicUsize::new(0));
        let first = Arc::clone(&ran);
        executor.execute(move || {
            let _ = release_rx.recv();
            first.fetch_add(1, Ordering::SeqCst);
        });
        let second = Arc::clone(&ran);
        executor.execute(move || {
            second.fetch_add(1, Ordering::SeqCst);
        });

        // Returns while the first job is still blocked
        executor.quit();
        assert!(!executor.is_running());
        assert!(!executor.execute(|| {}));

        release_tx.send(()).unwrap();
        executor.quit_safely();
        assert_eq!(ran.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_quit_from_own_thread_does_not_deadlock() {
        let executor = Arc::new(BackgroundExecutor::start("self-quit").unwrap());
        let (tx, rx) = std_mpsc::channel();
        let inner = Arc::clone(&executor);
        executor.execute(move || {
            inner.quit_safely();
            let _ = tx.send(inner.is_running());
        });
        assert!(!rx.recv().unwrap());
        executor.quit_safely();
    }
}
