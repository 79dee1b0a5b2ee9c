use exo_config::load_toml;
use rstest::rstest;

const BASE: &str = r#"
[network]
settings_port = 3350
confirmation_port = 3351
start_port = 3352
disconnect_port = 3353
prediction_port = 3340

[control]
period_s = 0.02
"#;

#[test]
fn accepts_minimal_config() {
    let cfg = load_toml(BASE).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.motors.extend_motor, 0);
    assert_eq!(cfg.motors.flex_motor, 1);
    assert!(cfg.params.is_empty());
}

#[rstest]
#[case::duplicate_inbound_ports(
    r#"
[network]
settings_port = 3350
confirmation_port = 3351
start_port = 3350
disconnect_port = 3353
prediction_port = 3340
"#,
    "must differ"
)]
#[case::zero_port(
    r#"
[network]
settings_port = 3350
confirmation_port = 3351
start_port = 3352
disconnect_port = 0
prediction_port = 3340
"#,
    "disconnect_port must be > 0"
)]
#[case::zero_control_period(
    r#"
[network]
settings_port = 3350
confirmation_port = 3351
start_port = 3352
disconnect_port = 3353
prediction_port = 3340

[control]
period_s = 0.0
"#,
    "period_s must be > 0"
)]
#[case::identical_motor_indices(
    r#"
[network]
settings_port = 3350
confirmation_port = 3351
start_port = 3352
disconnect_port = 3353
prediction_port = 3340

[motors]
extend_motor = 1
flex_motor = 1
"#,
    "must differ"
)]
fn rejects_invalid_configs(#[case] toml: &str, #[case] expected: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(
        format!("{err}").contains(expected),
        "error {err} does not mention {expected}"
    );
}

#[test]
fn parses_param_overrides() {
    let toml = r#"
[network]
settings_port = 3350
confirmation_port = 3351
start_port = 3352
disconnect_port = 3353
prediction_port = 3340

[params]
position_kp = 10.0
movement_speed = 0.5
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.params.get("position_kp"), Some(&10.0));
    assert_eq!(cfg.params.get("movement_speed"), Some(&0.5));
}

#[test]
fn rejects_non_finite_param_override() {
    let toml = r#"
[network]
settings_port = 3350
confirmation_port = 3351
start_port = 3352
disconnect_port = 3353
prediction_port = 3340

[params]
position_kp = inf
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject non-finite value");
    assert!(format!("{err}").contains("must be finite"));
}

#[test]
fn missing_network_table_is_a_parse_error() {
    assert!(load_toml("[control]\nperiod_s = 0.02\n").is_err());
}
