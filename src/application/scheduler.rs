//! # Scheduler
//!
//! The single cooperative executor of the process: a current-thread tokio runtime.
//!
//! `Scheduler` is the only value that can release the runtime. Everything else
//! (the host, extensions, the gateway) gets a `SchedulerHandle`, which can spawn
//! work and *ask* for a close, but can never release the runtime itself.
//! Closing is two-phase: `suppress_auto_close` makes close requests from the
//! framework side no-ops, `finalize_close` performs the actual release.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::domain::error::LifecycleError;
use crate::strings::logs;

#[derive(Debug, Default)]
struct SchedulerFlags {
    closed: AtomicBool,
    auto_close_suppressed: AtomicBool,
}

pub struct Scheduler {
    runtime: Option<Runtime>,
    handle: Handle,
    flags: Arc<SchedulerFlags>,
}

impl Scheduler {
    pub fn new() -> Result<Self, LifecycleError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(LifecycleError::Runtime)?;
        let handle = runtime.handle().clone();
        Ok(Self {
            runtime: Some(runtime),
            handle,
            flags: Arc::new(SchedulerFlags::default()),
        })
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            handle: self.handle.clone(),
            flags: self.flags.clone(),
        }
    }

    /// Drives `future` to completion on the scheduler, blocking the calling thread.
    pub fn block_on<F: Future>(&self, future: F) -> Result<F::Output, LifecycleError> {
        match &self.runtime {
            Some(runtime) if !self.is_closed() => Ok(runtime.block_on(future)),
            _ => Err(LifecycleError::Released),
        }
    }

    /// From now on `SchedulerHandle::request_close` is ignored.
    pub fn suppress_auto_close(&self) {
        self.flags.auto_close_suppressed.store(true, Ordering::SeqCst);
    }

    /// Stops processing and releases the runtime.
    ///
    /// Returns `false` when the runtime was already released; calling this twice is harmless.
    pub fn finalize_close(&mut self) -> bool {
        self.flags.closed.store(true, Ordering::SeqCst);
        match self.runtime.take() {
            Some(runtime) => {
                // Tasks still queued are dropped here. Their destructors may try to
                // spawn again; the closed flag turns that into a warning.
                runtime.shutdown_background();
                tracing::debug!("{}", logs::SCHEDULER_RELEASED);
                true
            }
            None => {
                tracing::debug!("{}", logs::SCHEDULER_ALREADY_RELEASED);
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.flags.closed.load(Ordering::SeqCst)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.finalize_close();
    }
}

/// Spawn access to the scheduler. Cheap to clone.
#[derive(Clone)]
pub struct SchedulerHandle {
    handle: Handle,
    flags: Arc<SchedulerFlags>,
}

impl SchedulerHandle {
    /// Spawns `future` unless the scheduler has been released.
    ///
    /// A spawn after release is the shutdown race the drain phase exists to make
    /// rare; it is logged and the future is dropped.
    pub fn spawn<F>(&self, name: &str, future: F) -> Option<JoinHandle<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        if self.is_closed() {
            tracing::warn!("{}", logs::shutdown_race(name));
            return None;
        }
        Some(self.handle.spawn(future))
    }

    /// The close a framework performs when its run loop returns.
    ///
    /// Returns whether the request was honoured. Once the owner has suppressed
    /// auto-close this only logs; the owner releases the runtime itself later.
    pub fn request_close(&self) -> bool {
        if self.flags.auto_close_suppressed.load(Ordering::SeqCst) {
            tracing::debug!("{}", logs::AUTO_CLOSE_SUPPRESSED);
            return false;
        }
        self.flags.closed.store(true, Ordering::SeqCst);
        true
    }

    pub fn is_closed(&self) -> bool {
        self.flags.closed.load(Ordering::SeqCst)
    }
}
