//! Live control parameters.
//!
//! One `f64` field per registry entry. The struct is seeded once at startup
//! from the safety file and afterwards mutated only through the validation
//! path; readers take whole-struct snapshots so a settings batch is never
//! observed half-applied.

use std::collections::BTreeMap;

use crate::error::ControlError;
use crate::registry;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeConfig {
    pub position_kp: f64,
    pub position_kd: f64,
    pub movement_speed: f64,
    pub max_velocity: f64,
    pub upper_position_limit: f64,
    pub lower_position_limit: f64,
    pub extension_strength_scale: f64,
    pub flexion_strength_scale: f64,
    pub min_movement_threshold: f64,
    pub smoothing_factor: f64,
    pub deadzone_threshold: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let mut cfg = Self {
            position_kp: 0.0,
            position_kd: 0.0,
            movement_speed: 0.0,
            max_velocity: 0.0,
            upper_position_limit: 0.0,
            lower_position_limit: 0.0,
            extension_strength_scale: 0.0,
            flexion_strength_scale: 0.0,
            min_movement_threshold: 0.0,
            smoothing_factor: 0.0,
            deadzone_threshold: 0.0,
        };
        for p in registry::PARAMETERS {
            // Registry names cover exactly the fields above.
            let _ = cfg.apply(p.name, p.default);
        }
        cfg
    }
}

impl RuntimeConfig {
    /// Seed from the safety file's `[params]` table: registry defaults,
    /// then validated overrides. Unknown keys are skipped with a warning;
    /// out-of-range values clamp like any other incoming value.
    pub fn seeded_from(overrides: &BTreeMap<String, f64>) -> Self {
        let mut cfg = Self::default();
        for (name, value) in overrides {
            match registry::validate(name, *value) {
                Ok(v) => {
                    // apply cannot fail here: validate guarantees the name.
                    let _ = cfg.apply(name, v);
                }
                Err(e) => {
                    tracing::warn!(name = %name, error = %e, "skipping safety override");
                }
            }
        }
        cfg
    }

    /// Write one field by registry name. The value is assumed validated.
    pub fn apply(&mut self, name: &str, value: f64) -> Result<(), ControlError> {
        let slot = match name {
            "position_kp" => &mut self.position_kp,
            "position_kd" => &mut self.position_kd,
            "movement_speed" => &mut self.movement_speed,
            "max_velocity" => &mut self.max_velocity,
            "upper_position_limit" => &mut self.upper_position_limit,
            "lower_position_limit" => &mut self.lower_position_limit,
            "extension_strength_scale" => &mut self.extension_strength_scale,
            "flexion_strength_scale" => &mut self.flexion_strength_scale,
            "min_movement_threshold" => &mut self.min_movement_threshold,
            "smoothing_factor" => &mut self.smoothing_factor,
            "deadzone_threshold" => &mut self.deadzone_threshold,
            other => return Err(ControlError::UnknownParameter(other.to_string())),
        };
        *slot = value;
        Ok(())
    }

    /// Read one field by registry name; used by tests and diagnostics.
    pub fn get(&self, name: &str) -> Option<f64> {
        Some(match name {
            "position_kp" => self.position_kp,
            "position_kd" => self.position_kd,
            "movement_speed" => self.movement_speed,
            "max_velocity" => self.max_velocity,
            "upper_position_limit" => self.upper_position_limit,
            "lower_position_limit" => self.lower_position_limit,
            "extension_strength_scale" => self.extension_strength_scale,
            "flexion_strength_scale" => self.flexion_strength_scale,
            "min_movement_threshold" => self.min_movement_threshold,
            "smoothing_factor" => self.smoothing_factor,
            "deadzone_threshold" => self.deadzone_threshold,
            _ => return None,
        })
    }
}
