#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Real-time control engine for the wrist exoskeleton (hardware-agnostic).
//!
//! All hardware interaction goes through `exo_traits::MotorDriver`.
//!
//! ## Architecture
//!
//! - **Registry**: static catalog of tunable parameters with bounds and
//!   wire-key mapping (`registry` module)
//! - **Runtime configuration**: live parameter values, seeded from the
//!   safety file and retuned over the settings channel (`runtime` module)
//! - **Session**: startup handshake and disconnect-to-safe-stop state
//!   machine (`session` module)
//! - **Channels**: one UDP listener thread per inbound channel plus the
//!   acknowledgment path (`channels` module)
//! - **Classifier**: softmax-argmax over raw EMG scores (`classifier`)
//! - **Motion**: strength-to-target mapping with deadzone, smoothing and
//!   safety clamping (`motion` module)
//! - **Control**: the fixed-period loop dispatching motor commands
//!   (`control` module), wired together by `runner`

pub mod channels;
pub mod classifier;
pub mod control;
pub mod error;
pub mod mocks;
pub mod motion;
pub mod registry;
pub mod runner;
pub mod runtime;
pub mod session;

use std::sync::{Mutex, RwLock};

pub use classifier::{Classification, Movement, classify, confident};
pub use control::ControlLoop;
pub use error::{ControlError, StartupError};
pub use motion::{MotionMapper, MotorTarget};
pub use registry::{PARAMETERS, ParamSpec, validate};
pub use runtime::RuntimeConfig;
pub use session::{Session, SessionState};

/// State shared between the channel listeners and the control loop.
///
/// Write discipline per field: `config` is written only by the settings
/// handler and read as a whole-struct snapshot by the control loop;
/// `session` is written by the start/disconnect handlers and read by the
/// loop every cycle. The prediction stream bypasses this struct through
/// `channels::PredictionSlot` (single producer, single consumer).
#[derive(Debug)]
pub struct SharedState {
    pub config: RwLock<RuntimeConfig>,
    pub session: Mutex<Session>,
}

impl SharedState {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config: RwLock::new(config),
            session: Mutex::new(Session::new()),
        }
    }
}
