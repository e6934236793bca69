//! # Lifecycle Manager
//!
//! Drives the process through `Created -> Loading -> Running -> Draining -> Closed`
//! and is the only owner of the scheduler across that sequence.
//!
//! The drain phase exists because objects torn down when the run loop exits (the
//! gateway session, connections, buffers) may schedule one more callback as part
//! of their own cleanup. Releasing the scheduler the moment `run` returns would
//! leave those callbacks nowhere to run. Waiting a short, fixed delay gives them a
//! scheduler turn first. This is time-based and best-effort, not a completion
//! guarantee: anything scheduled after the release is logged and dropped.

use std::time::Duration;

use crate::application::host::BotHost;
use crate::application::loader::{ExtensionCatalog, ExtensionLoader};
use crate::application::registry::ExtensionRegistry;
use crate::application::scheduler::{Scheduler, SchedulerHandle};
use crate::domain::config::BotConfiguration;
use crate::domain::error::LifecycleError;
use crate::domain::traits::Gateway;
use crate::domain::types::{ExtensionName, HostExit, RunState};
use crate::strings::logs;

/// Grace period between the end of the run loop and releasing the scheduler.
///
/// Chosen empirically (one scheduler turn with room to spare); it is a heuristic,
/// not a measured bound. Override with `with_drain_delay` or `bot.drain_delay_ms`.
pub const DEFAULT_DRAIN_DELAY: Duration = Duration::from_millis(100);

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub loaded: Vec<ExtensionName>,
    pub exit: HostExit,
}

pub struct LifecycleManager {
    state: RunState,
    scheduler: Scheduler,
    registry: ExtensionRegistry,
    catalog: ExtensionCatalog,
    drain_delay: Duration,
    handle_signals: bool,
}

impl LifecycleManager {
    pub fn new(registry: ExtensionRegistry, catalog: ExtensionCatalog) -> Result<Self, LifecycleError> {
        Ok(Self {
            state: RunState::Created,
            scheduler: Scheduler::new()?,
            registry,
            catalog,
            drain_delay: DEFAULT_DRAIN_DELAY,
            handle_signals: true,
        })
    }

    pub fn with_drain_delay(mut self, delay: Duration) -> Self {
        self.drain_delay = delay;
        self
    }

    /// Whether Ctrl-C ends the run loop. On by default.
    pub fn with_signal_handling(mut self, enabled: bool) -> Self {
        self.handle_signals = enabled;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn drain_delay(&self) -> Duration {
        self.drain_delay
    }

    /// Spawn access for code that lives outside the host.
    pub fn scheduler(&self) -> SchedulerHandle {
        self.scheduler.handle()
    }

    /// Builds the host, loads every extension, runs until the host stops, drains,
    /// and releases the scheduler. Blocks the calling thread throughout.
    ///
    /// A load failure closes immediately (no run, no drain) and is returned.
    /// Whatever ends the run, the drain and the close still happen.
    pub fn run(
        &mut self,
        config: BotConfiguration,
        gateway: Box<dyn Gateway>,
    ) -> Result<RunReport, LifecycleError> {
        self.transition(RunState::Loading)?;
        let mut host = BotHost::new(config, gateway, self.scheduler.handle())
            .with_signal_handling(self.handle_signals);

        let loaded = match ExtensionLoader::new(&self.catalog).load(&mut host, &self.registry) {
            Ok(loaded) => loaded,
            Err(e) => {
                drop(host);
                self.close();
                return Err(e.into());
            }
        };

        // Only the Draining -> Closed edge may release the scheduler from here on.
        self.scheduler.suppress_auto_close();
        self.transition(RunState::Running)?;
        let exit = match self.scheduler.block_on(host.run()) {
            Ok(exit) => exit,
            Err(e) => {
                self.close();
                return Err(e);
            }
        };
        match &exit {
            HostExit::Failed(reason) => tracing::error!("{}", logs::host_failed(reason)),
            exit => tracing::info!("{}", logs::host_stopped(&exit.to_string())),
        }

        self.transition(RunState::Draining)?;
        self.drain();
        self.close();

        Ok(RunReport { loaded, exit })
    }

    fn drain(&self) {
        tracing::info!("{}", logs::draining(self.drain_delay.as_millis()));
        if let Err(e) = self.scheduler.block_on(tokio::time::sleep(self.drain_delay)) {
            tracing::warn!("{}", logs::drain_failed(&e.to_string()));
        }
    }

    /// Moves to `Closed` and releases the scheduler.
    ///
    /// Returns `false` if already closed; calling it again changes nothing.
    pub fn close(&mut self) -> bool {
        if self.state == RunState::Closed {
            return false;
        }
        tracing::info!("{}", logs::transition(self.state, RunState::Closed));
        self.state = RunState::Closed;
        self.scheduler.finalize_close()
    }

    fn transition(&mut self, next: RunState) -> Result<(), LifecycleError> {
        if !self.state.can_transition_to(next) {
            return Err(LifecycleError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::info!("{}", logs::transition(self.state, next));
        self.state = next;
        Ok(())
    }
}
