//! Background scheduler for periodic server jobs.
//!
//! A dedicated single-worker Tokio runtime drives every repeating job of a
//! server (the clock tick, timer work delegated by collaborators). Owning
//! the runtime keeps the server usable from plain synchronous code and
//! from inside another runtime alike.
//!
//! Each job waits its interval, runs to completion, then waits again, so a
//! job never overlaps with itself. [`Scheduler::stop`] cancels every job
//! scheduled so far; a job that is mid-run finishes that run and exits
//! before its next tick.

use std::{
    sync::{Mutex, PoisonError},
    time::Duration,
};

use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tokio_util::sync::CancellationToken;

/// Errors from the background scheduler.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The worker runtime could not be started
    #[error("failed to build scheduler runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Runs repeating jobs on a background worker thread.
pub struct Scheduler {
    /// `None` only while dropping.
    runtime: Option<Runtime>,
    /// Token shared by every job scheduled since the last `stop`.
    cancel: Mutex<CancellationToken>,
}

impl Scheduler {
    /// Start the worker thread.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::Runtime`] if the OS refuses to spawn the worker
    pub fn new() -> Result<Self, SchedulerError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("ua-scheduler")
            .enable_time()
            .build()?;

        Ok(Self { runtime: Some(runtime), cancel: Mutex::new(CancellationToken::new()) })
    }

    /// Run `job` every `interval`, first run one interval from now.
    pub fn schedule_repeating<F>(&self, name: &'static str, interval: Duration, mut job: F)
    where
        F: FnMut() + Send + 'static,
    {
        let Some(runtime) = &self.runtime else {
            return;
        };
        let token = self.cancel.lock().unwrap_or_else(PoisonError::into_inner).clone();

        tracing::debug!(job = name, ?interval, "Scheduling repeating job");
        runtime.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    () = tokio::time::sleep(interval) => job(),
                }
            }
            tracing::debug!(job = name, "Repeating job cancelled");
        });
    }

    /// Cancel every job scheduled so far.
    ///
    /// The scheduler stays usable: jobs scheduled afterwards run until the
    /// next `stop`.
    pub fn stop(&self) {
        let mut cancel = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        cancel.cancel();
        *cancel = CancellationToken::new();
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler").finish_non_exhaustive()
    }
}
