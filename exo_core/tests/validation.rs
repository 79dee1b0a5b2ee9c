use exo_core::error::ControlError;
use exo_core::{registry, registry::validate};
use rstest::rstest;

#[rstest]
#[case("position_kp", 0.4, 0.5)] // below min -> min
#[case("position_kp", 99.0, 15.0)] // above max -> max
#[case("position_kp", 8.5, 8.5)] // in range -> unchanged
#[case("movement_speed", 0.0, 0.1)]
#[case("lower_position_limit", -3.0, -2.5)]
#[case("lower_position_limit", 0.0, -0.5)]
#[case("deadzone_threshold", 0.0, 0.0)] // boundary value is in range
fn clamps_into_bounds(#[case] name: &str, #[case] input: f64, #[case] expected: f64) {
    assert_eq!(validate(name, input).expect("known parameter"), expected);
}

#[test]
fn unknown_parameter_is_an_error() {
    let err = validate("warp_factor", 1.0).expect_err("unknown");
    assert_eq!(err, ControlError::UnknownParameter("warp_factor".into()));
}

#[test]
fn non_finite_values_are_errors_not_clamped() {
    assert!(matches!(
        validate("position_kp", f64::NAN),
        Err(ControlError::NonFinite(_))
    ));
    assert!(matches!(
        validate("position_kp", f64::INFINITY),
        Err(ControlError::NonFinite(_))
    ));
}

#[test]
fn every_parameter_accepts_its_own_default() {
    for p in registry::PARAMETERS {
        assert_eq!(validate(p.name, p.default).expect("default in range"), p.default);
    }
}

#[test]
fn wire_keys_round_trip_through_validation() {
    // A wire key resolved to its registry name must validate; the raw wire
    // key itself must not (it is not a registry name).
    let name = registry::resolve_wire_key("minMovementThreshold");
    assert!(validate(name, 0.2).is_ok());
    assert!(matches!(
        validate("minMovementThreshold", 0.2),
        Err(ControlError::UnknownParameter(_))
    ));
}
