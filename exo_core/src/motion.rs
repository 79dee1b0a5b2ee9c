//! Movement-to-position mapping.
//!
//! Converts the latest classification into antagonist motor targets:
//! strength threshold, direction dispatch, deadzone, single-pole smoothing,
//! final safety clamp. The arithmetic order is load-bearing: the smoother
//! state must evolve identically across restarts and tests, so steps are
//! not reassociated or fused.

use crate::classifier::{Classification, Movement};
use crate::runtime::RuntimeConfig;

/// Clamped position commands for the antagonist pair, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorTarget {
    pub extend: f64,
    pub flex: f64,
}

/// Strength below the configured threshold is treated as no intent.
#[inline]
pub fn effective_strength(strength: f64, min_movement_threshold: f64) -> f64 {
    if strength >= min_movement_threshold {
        strength
    } else {
        0.0
    }
}

/// Exponential-moving-average accumulator for the extend-motor position.
/// The flex target is always the negation of the smoothed extend value
/// prior to clamping.
#[derive(Debug, Default)]
pub struct MotionMapper {
    smoothed_ext: f64,
}

impl MotionMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current smoother state, exposed for the loop's observability logs.
    pub fn smoothed(&self) -> f64 {
        self.smoothed_ext
    }

    /// Zero the smoother. Called whenever the session leaves Running so no
    /// stale smoothed value can be dispatched after a disconnect.
    pub fn reset(&mut self) {
        self.smoothed_ext = 0.0;
    }

    /// One mapping step. Mutates only the smoother state.
    pub fn update(&mut self, c: &Classification, cfg: &RuntimeConfig) -> MotorTarget {
        let effective = effective_strength(c.strength, cfg.min_movement_threshold);

        // Flexion drives toward the positive limit, extension toward the
        // negative one (lower_position_limit < 0 by registry bounds).
        let mut target = match c.movement {
            Movement::Flexion => {
                cfg.upper_position_limit * effective * cfg.flexion_strength_scale
                    * cfg.movement_speed
            }
            Movement::Extension => {
                cfg.lower_position_limit * effective * cfg.extension_strength_scale
                    * cfg.movement_speed
            }
            Movement::Isometric | Movement::Rest => 0.0,
        };

        if target.abs() < cfg.deadzone_threshold {
            target = 0.0;
        }

        self.smoothed_ext =
            (1.0 - cfg.smoothing_factor) * self.smoothed_ext + cfg.smoothing_factor * target;
        let flex = -self.smoothed_ext;

        MotorTarget {
            extend: self
                .smoothed_ext
                .clamp(cfg.lower_position_limit, cfg.upper_position_limit),
            flex: flex.clamp(cfg.lower_position_limit, cfg.upper_position_limit),
        }
    }
}
