//! Explicit session state for one decision round.
//!
//! Replaces the original's module-level `currentMode`/`spinning` globals with
//! a single owner. Re-entrant decision requests are refused, never queued.

use knobel_core::DecisionMode;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Deciding,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a decision is already in flight")]
    Busy,
}

#[derive(Debug)]
pub struct DecisionSession {
    mode: DecisionMode,
    phase: Phase,
}

impl DecisionSession {
    pub fn new(mode: DecisionMode) -> Self {
        Self {
            mode,
            phase: Phase::Idle,
        }
    }

    pub fn mode(&self) -> &DecisionMode {
        &self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Switching modes is only allowed between rounds.
    pub fn set_mode(&mut self, mode: DecisionMode) -> Result<(), SessionError> {
        if self.phase == Phase::Deciding {
            return Err(SessionError::Busy);
        }
        self.mode = mode;
        Ok(())
    }

    /// Marks the round as in flight. A second `begin` before `finish` is
    /// refused.
    pub fn begin(&mut self) -> Result<(), SessionError> {
        if self.phase == Phase::Deciding {
            return Err(SessionError::Busy);
        }
        self.phase = Phase::Deciding;
        Ok(())
    }

    /// Returns to idle regardless of how the round ended, so a failed round
    /// never leaves the session stuck.
    pub fn finish(&mut self) {
        self.phase = Phase::Idle;
    }
}
