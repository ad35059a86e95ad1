//! Manual update check with bounded waits.
//!
//! The check never blocks the UI indefinitely: a probe that keeps reporting
//! `Checking` or hangs mid-install is cut off by the configured timeouts and
//! the user gets an answer either way.

use std::time::{Duration, Instant};

/// What the registration reports at one polling instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeState {
    /// Still asking the server; nothing known yet.
    Checking,
    /// The server answered and no newer version exists.
    NoUpdate,
    /// A newer version was found and its assets are downloading.
    Installing,
    /// The newer version finished installing and is waiting for promotion.
    Installed { version: String },
    Failed(String),
}

/// Source of update progress, polled rather than awaited so the check stays
/// bounded even when the underlying registration never settles.
pub trait UpdateProbe {
    fn poll(&mut self) -> ProbeState;
}

#[derive(Debug, Clone, Copy)]
pub struct UpdateCheckConfig {
    /// How long to wait for the server to report anything at all.
    pub check_timeout: Duration,
    /// Short pause after an install starts, before watching it finish.
    pub settle: Duration,
    /// How long a started install may take before the check gives up.
    pub install_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for UpdateCheckConfig {
    fn default() -> Self {
        Self {
            check_timeout: Duration::from_secs(5),
            settle: Duration::from_millis(50),
            install_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Result surfaced to the user. `Available` means a generation is now
/// waiting; promotion still requires the explicit skip-waiting signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Available { version: String },
    UpToDate,
    Failed { reason: String },
}

/// Runs one user-triggered update check.
///
/// Phase one polls until the server reports an update, a failure, or the
/// check timeout elapses (treated as up to date). When an install starts,
/// phase two waits out the settle pause and then polls until the install
/// finishes or its own timeout elapses.
pub fn check_for_updates(probe: &mut impl UpdateProbe, config: &UpdateCheckConfig) -> UpdateOutcome {
    let deadline = Instant::now() + config.check_timeout;
    loop {
        match probe.poll() {
            ProbeState::Installed { version } => return UpdateOutcome::Available { version },
            ProbeState::Installing => break,
            ProbeState::NoUpdate => return UpdateOutcome::UpToDate,
            ProbeState::Failed(reason) => return UpdateOutcome::Failed { reason },
            ProbeState::Checking => {}
        }
        if Instant::now() >= deadline {
            // No word from the server in time; do not leave the user hanging.
            return UpdateOutcome::UpToDate;
        }
        std::thread::sleep(config.poll_interval);
    }

    std::thread::sleep(config.settle);
    let deadline = Instant::now() + config.install_timeout;
    loop {
        match probe.poll() {
            ProbeState::Installed { version } => return UpdateOutcome::Available { version },
            ProbeState::Failed(reason) => return UpdateOutcome::Failed { reason },
            ProbeState::Checking | ProbeState::NoUpdate | ProbeState::Installing => {}
        }
        if Instant::now() >= deadline {
            return UpdateOutcome::Failed {
                reason: "install did not finish in time".to_string(),
            };
        }
        std::thread::sleep(config.poll_interval);
    }
}
