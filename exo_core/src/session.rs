//! Startup handshake and connection state.
//!
//! The control loop is gated behind settings-received / start-signal /
//! connected: the controller must never drive hardware on registry
//! defaults alone, and a disconnect forces a safe stop that only a fresh
//! start command can leave.

/// Connection state of the companion-application session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Initial state; waiting for the first valid settings datagram.
    AwaitingSettings,
    /// Settings accepted; waiting for the start command.
    AwaitingStart,
    /// Control loop is live and commanding motors.
    Running,
    /// Disconnected; motors held at rest until a new start command.
    Stopped,
}

#[derive(Debug)]
pub struct Session {
    state: SessionState,
    settings_received: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::AwaitingSettings,
            settings_received: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the control loop may call into the motor driver.
    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Record an accepted settings batch. The first one completes the
    /// handshake step; later batches are live retunes and do not change
    /// state. Returns true when this was the initial batch.
    pub fn settings_applied(&mut self) -> bool {
        let first = !self.settings_received;
        self.settings_received = true;
        if self.state == SessionState::AwaitingSettings {
            self.state = SessionState::AwaitingStart;
        }
        first
    }

    /// Handle a start command. Accepted from AwaitingStart, Running
    /// (idempotent) and Stopped (re-arm); refused before any settings have
    /// been accepted. Returns whether the command was accepted.
    pub fn start(&mut self) -> bool {
        match self.state {
            SessionState::AwaitingSettings => false,
            SessionState::AwaitingStart | SessionState::Running | SessionState::Stopped => {
                // settings_received is implied by having left
                // AwaitingSettings, except for a disconnect that arrived
                // before any settings did.
                if self.settings_received {
                    self.state = SessionState::Running;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Handle a disconnect command: safe stop from any state.
    pub fn disconnect(&mut self) {
        self.state = SessionState::Stopped;
    }
}
