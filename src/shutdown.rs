//! Two-stage signal shutdown.
//!
//! `Running --signal, no batch--> exit(0)`
//! `Running --signal, batch in flight--> cancel, Draining`
//! `Draining --signal--> exit(0)`

use std::sync::{Mutex, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::orchestrator::BatchControl;

/// Shutdown state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownState {
    /// No shutdown requested yet.
    #[default]
    Running,
    /// Cancellation fired; in-flight jobs are finishing.
    Draining,
}

/// What the signal listener must do after a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownAction {
    /// Nothing was running: exit with status 0.
    Exit,
    /// Cancellation fired: keep listening while jobs drain.
    Drain,
    /// Second signal while draining: exit with status 0 immediately.
    ForceExit,
}

impl ShutdownAction {
    /// Whether the process must terminate now.
    #[must_use]
    pub fn exits(self) -> bool {
        matches!(self, Self::Exit | Self::ForceExit)
    }
}

impl ShutdownState {
    /// Transition for one received signal.
    #[must_use]
    pub fn next(self, batch_in_flight: bool) -> (Self, ShutdownAction) {
        match (self, batch_in_flight) {
            (Self::Running, false) => (Self::Running, ShutdownAction::Exit),
            (Self::Running, true) => (Self::Draining, ShutdownAction::Drain),
            (Self::Draining, _) => (Self::Draining, ShutdownAction::ForceExit),
        }
    }
}

/// Drives batch cancellation from process signals.
///
/// Built on a [`BatchControl`] rather than an orchestrator so it can be
/// installed before login and before any store client exists.
#[derive(Debug)]
pub struct ShutdownController {
    state: Mutex<ShutdownState>,
    control: BatchControl,
}

impl ShutdownController {
    /// Creates a controller in [`ShutdownState::Running`].
    #[must_use]
    pub fn new(control: BatchControl) -> Self {
        Self {
            state: Mutex::new(ShutdownState::Running),
            control,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ShutdownState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies one signal: advances the state and fires cancellation on
    /// the transition into [`ShutdownState::Draining`].
    pub fn on_signal(&self) -> ShutdownAction {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let (next, action) = state.next(self.control.has_active_batch());
        *state = next;
        drop(state);

        match action {
            ShutdownAction::Drain => {
                info!("Shutting down... waiting for running downloads (press Ctrl+C again to force)");
                self.control.cancel();
            }
            ShutdownAction::Exit => debug!("no work in progress; exiting"),
            ShutdownAction::ForceExit => info!("Forced exit"),
        }
        action
    }
}

/// Installs the signal handlers and spawns the listener task.
///
/// The task calls [`std::process::exit`] with status 0 on
/// [`ShutdownAction::Exit`] and [`ShutdownAction::ForceExit`].
///
/// # Errors
///
/// Returns an error when a signal handler cannot be installed.
pub fn listen_for_shutdown(controller: ShutdownController) -> std::io::Result<JoinHandle<()>> {
    let mut signals = Signals::install()?;
    Ok(tokio::spawn(async move {
        while signals.recv().await {
            if controller.on_signal().exits() {
                std::process::exit(0);
            }
        }
    }))
}

#[cfg(unix)]
struct Signals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Waits for the next signal; `false` once both streams have closed.
    async fn recv(&mut self) -> bool {
        tokio::select! {
            received = self.interrupt.recv() => received.is_some(),
            received = self.terminate.recv() => received.is_some(),
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    #[allow(clippy::unnecessary_wraps)]
    fn install() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> bool {
        tokio::signal::ctrl_c().await.is_ok()
    }
}
