use rstest::rstest;
use tickfilter_config::{Method, load_toml};

#[test]
fn parses_full_sensor_table() {
    let toml = r#"
[[sensor]]
source = "sensor.src_power"
method = "lowpass"
name = "Load Power (EMA 30s)"
unique_id = "load_power_ema"
update_s = 30
tau_s = 30
round = 1
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.sensor.len(), 1);
    let s = &cfg.sensor[0];
    assert_eq!(s.method, Method::Lowpass);
    assert_eq!(s.round, Some(1));
    assert!(s.force_update, "force_update defaults to true");
    assert_eq!(s.window_s, 60.0, "window_s default");
}

#[test]
fn rejects_unknown_method_at_parse_time() {
    let toml = r#"
[[sensor]]
source = "sensor.src_power"
method = "kalman"
"#;

    assert!(load_toml(toml).is_err(), "unsupported method must not parse");
}

#[rstest]
#[case("update_s = 0.5", "update_s must be >= 1")]
#[case("window_s = 0.0", "window_s must be >= 1")]
#[case("tau_s = 0.0", "tau_s must be >= 0.001")]
#[case("round = 99", "round must be in [-12, 12]")]
#[case("round = -13", "round must be in [-12, 12]")]
fn rejects_out_of_range_options(#[case] line: &str, #[case] expected: &str) {
    let toml = format!(
        r#"
[[sensor]]
source = "sensor.src_power"
method = "time_sma"
{line}
"#
    );

    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject out-of-range value");
    assert!(
        format!("{err}").contains(expected),
        "unexpected message: {err}"
    );
}

#[test]
fn accepts_negative_round_places() {
    let toml = r#"
[[sensor]]
source = "sensor.src_power"
method = "lowpass"
round = -2
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("rounding to hundreds is valid");
}

#[test]
fn rejects_empty_source_and_duplicate_unique_id() {
    let empty_source = r#"
[[sensor]]
source = "  "
method = "integrator"
"#;
    let cfg = load_toml(empty_source).expect("parse TOML");
    assert!(cfg.validate().is_err());

    let dup = r#"
[[sensor]]
source = "sensor.a"
method = "lowpass"
unique_id = "same"

[[sensor]]
source = "sensor.b"
method = "lowpass"
unique_id = "same"
"#;
    let cfg = load_toml(dup).expect("parse TOML");
    let err = cfg.validate().expect_err("duplicate unique_id must fail");
    assert!(format!("{err}").contains("duplicate unique_id"));
}

#[test]
fn rejects_config_without_sensors() {
    let cfg = load_toml("").expect("parse TOML");
    assert!(cfg.validate().is_err());
}
