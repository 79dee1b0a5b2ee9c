#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Safety configuration schema for the wrist exoskeleton controller.
//!
//! The safety file is read once at startup by the technician-facing CLI and
//! is never reloaded. It carries the motor mapping, the UDP port plan, the
//! control period, logging options, and optional per-parameter overrides
//! that seed the runtime configuration before any settings datagram
//! arrives.
use std::collections::BTreeMap;

use serde::Deserialize;

/// Motor index mapping on the bus.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Motors {
    /// Index of the motor that drives wrist extension.
    pub extend_motor: usize,
    /// Index of the motor that drives wrist flexion.
    pub flex_motor: usize,
}

impl Default for Motors {
    fn default() -> Self {
        Self {
            extend_motor: 0,
            flex_motor: 1,
        }
    }
}

/// UDP port plan. The four inbound channels each own one socket; the
/// confirmation port is the remote port acknowledgments are sent to.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Network {
    pub settings_port: u16,
    pub confirmation_port: u16,
    pub start_port: u16,
    pub disconnect_port: u16,
    pub prediction_port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Control {
    /// Control loop period in seconds.
    pub period_s: f64,
}

impl Default for Control {
    fn default() -> Self {
        Self { period_s: 0.02 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub network: Network,
    #[serde(default)]
    pub motors: Motors,
    #[serde(default)]
    pub control: Control,
    #[serde(default)]
    pub logging: Logging,
    /// Optional overrides for control parameters, keyed by registry name
    /// (e.g. `position_kp = 8.0`). Unknown keys are skipped with a warning
    /// at seeding time; values are clamped to the registry bounds.
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Network: all ports present and the inbound set pairwise distinct.
        let inbound = [
            ("settings_port", self.network.settings_port),
            ("start_port", self.network.start_port),
            ("disconnect_port", self.network.disconnect_port),
            ("prediction_port", self.network.prediction_port),
        ];
        for (name, port) in inbound {
            if port == 0 {
                eyre::bail!("network.{name} must be > 0");
            }
        }
        if self.network.confirmation_port == 0 {
            eyre::bail!("network.confirmation_port must be > 0");
        }
        for i in 0..inbound.len() {
            for j in (i + 1)..inbound.len() {
                if inbound[i].1 == inbound[j].1 {
                    eyre::bail!(
                        "network.{} and network.{} must differ (both {})",
                        inbound[i].0,
                        inbound[j].0,
                        inbound[i].1
                    );
                }
            }
        }

        // Motors
        if self.motors.extend_motor == self.motors.flex_motor {
            eyre::bail!("motors.extend_motor and motors.flex_motor must differ");
        }

        // Control
        if !self.control.period_s.is_finite() || self.control.period_s <= 0.0 {
            eyre::bail!("control.period_s must be > 0");
        }
        if self.control.period_s > 1.0 {
            eyre::bail!("control.period_s is unreasonably large (>1s)");
        }

        // Params: values must at least be finite; range clamping happens
        // at seeding time against the parameter registry.
        for (key, value) in &self.params {
            if !value.is_finite() {
                eyre::bail!("params.{key} must be finite");
            }
        }

        Ok(())
    }
}
