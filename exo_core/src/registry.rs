//! Static catalog of every tunable control parameter.
//!
//! Each entry carries the internal name, the wire key used by the companion
//! application, hard bounds, the default, and the unit. Bounds are the
//! safety envelope: incoming values are clamped here, never rejected.

use crate::error::ControlError;

/// Immutable description of one tunable parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    /// External protocol key used in settings datagrams.
    pub wire_key: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub unit: &'static str,
}

/// The full parameter catalog. Order matches the companion application's
/// settings screen; nothing depends on it.
pub const PARAMETERS: &[ParamSpec] = &[
    // Position control
    ParamSpec {
        name: "position_kp",
        wire_key: "positionKp",
        min: 0.5,
        max: 15.0,
        default: 8.0,
        unit: "N*m/rad",
    },
    ParamSpec {
        name: "position_kd",
        wire_key: "positionKd",
        min: 0.01,
        max: 3.0,
        default: 0.8,
        unit: "N*m*s/rad",
    },
    ParamSpec {
        name: "movement_speed",
        wire_key: "movementSpeed",
        min: 0.1,
        max: 2.0,
        default: 0.8,
        unit: "",
    },
    // Safety limits
    ParamSpec {
        name: "max_velocity",
        wire_key: "maxVelocity",
        min: 0.5,
        max: 10.0,
        default: 4.0,
        unit: "rad/s",
    },
    ParamSpec {
        name: "upper_position_limit",
        wire_key: "upperPositionLimit",
        min: 0.5,
        max: 2.5,
        default: 1.8,
        unit: "rad",
    },
    ParamSpec {
        name: "lower_position_limit",
        wire_key: "lowerPositionLimit",
        min: -2.5,
        max: -0.5,
        default: -1.8,
        unit: "rad",
    },
    // Strength scaling
    ParamSpec {
        name: "extension_strength_scale",
        wire_key: "extensionStrengthScale",
        min: 0.3,
        max: 1.5,
        default: 1.0,
        unit: "",
    },
    ParamSpec {
        name: "flexion_strength_scale",
        wire_key: "flexionStrengthScale",
        min: 0.3,
        max: 1.5,
        default: 1.0,
        unit: "",
    },
    ParamSpec {
        name: "min_movement_threshold",
        wire_key: "minMovementThreshold",
        min: 0.05,
        max: 0.3,
        default: 0.1,
        unit: "",
    },
    // Comfort & smoothing
    ParamSpec {
        name: "smoothing_factor",
        wire_key: "smoothingFactor",
        min: 0.01,
        max: 0.3,
        default: 0.05,
        unit: "",
    },
    ParamSpec {
        name: "deadzone_threshold",
        wire_key: "deadzoneThreshold",
        min: 0.0,
        max: 0.2,
        default: 0.05,
        unit: "rad",
    },
];

/// Look up a parameter by its internal registry name.
pub fn spec_for(name: &str) -> Option<&'static ParamSpec> {
    PARAMETERS.iter().find(|p| p.name == name)
}

/// Map an external wire key to the internal registry name. Unmapped keys
/// pass through unchanged; they fail downstream as `UnknownParameter`.
pub fn resolve_wire_key(key: &str) -> &str {
    PARAMETERS
        .iter()
        .find(|p| p.wire_key == key)
        .map_or(key, |p| p.name)
}

/// Validate one incoming value against the registry.
///
/// Out-of-range values clamp to the violated bound and log a warning;
/// clamping is a recoverable condition, never a fault. Unknown names and
/// non-finite values are errors the caller must skip field-by-field.
pub fn validate(name: &str, value: f64) -> Result<f64, ControlError> {
    let spec = spec_for(name).ok_or_else(|| ControlError::UnknownParameter(name.to_string()))?;
    if !value.is_finite() {
        return Err(ControlError::NonFinite(name.to_string()));
    }
    if value < spec.min {
        tracing::warn!(
            name,
            value,
            min = spec.min,
            "value below minimum, clamping"
        );
        return Ok(spec.min);
    }
    if value > spec.max {
        tracing::warn!(
            name,
            value,
            max = spec.max,
            "value above maximum, clamping"
        );
        return Ok(spec.max);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_default_lies_within_bounds() {
        for p in PARAMETERS {
            assert!(
                p.min <= p.default && p.default <= p.max,
                "{}: default {} outside [{}, {}]",
                p.name,
                p.default,
                p.min,
                p.max
            );
        }
    }

    #[test]
    fn wire_keys_are_unique() {
        for (i, a) in PARAMETERS.iter().enumerate() {
            for b in &PARAMETERS[i + 1..] {
                assert_ne!(a.wire_key, b.wire_key);
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn resolves_known_and_unknown_wire_keys() {
        assert_eq!(resolve_wire_key("positionKp"), "position_kp");
        assert_eq!(resolve_wire_key("upperPositionLimit"), "upper_position_limit");
        // Unmapped keys pass through unchanged.
        assert_eq!(resolve_wire_key("torqueRipple"), "torqueRipple");
    }
}
