//! Exclusive serial queues for session confinement.
//!
//! Each session owns one [`WorkQueue`]: a dedicated worker thread draining
//! boxed jobs from a channel. All access to a session's state happens in
//! jobs on its queue; callers block until their job completes, which is
//! what gives commits their deterministic FIFO ordering.
//!
//! Calls made from the queue's own worker thread run inline. Scoped
//! execution (`Session::perform`) relies on this: the closure runs as one
//! job, and session operations invoked inside it must not dead-wait on
//! the queue they are already on.

use crate::error::SessionError;
use crossbeam::channel::{self, Sender};
use std::thread::{self, ThreadId};

type Job = Box<dyn FnOnce() + Send + 'static>;

pub(crate) struct WorkQueue {
    tx: Sender<Job>,
    worker: ThreadId,
}

impl WorkQueue {
    /// Spawns the worker thread. The queue shuts down when the owning
    /// session drops its last handle and the channel disconnects.
    pub(crate) fn spawn(label: &str) -> Result<Self, SessionError> {
        let (tx, rx) = channel::unbounded::<Job>();
        let handle = thread::Builder::new()
            .name(label.to_string())
            .spawn(move || {
                for job in rx {
                    job();
                }
            })
            .map_err(|e| SessionError::Queue(format!("cannot spawn {label}: {e}")))?;
        let worker = handle.thread().id();
        Ok(Self { tx, worker })
    }

    /// Runs `job` on the queue and blocks until it returns. Runs inline
    /// when already on the worker thread.
    pub(crate) fn run<R, F>(&self, job: F) -> Result<R, SessionError>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        if thread::current().id() == self.worker {
            return Ok(job());
        }
        let (done_tx, done_rx) = channel::bounded(1);
        self.tx
            .send(Box::new(move || {
                let _ = done_tx.send(job());
            }))
            .map_err(|_| SessionError::Queue("queue disconnected".to_string()))?;
        done_rx
            .recv()
            .map_err(|_| SessionError::Queue("worker terminated".to_string()))
    }
}
