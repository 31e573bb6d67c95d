use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

// Minimal valid config for the sim backend with instant flap motion
const VALID: &str = r#"
[pins]
# pins are unused in sim backend but must be present
cap_sensor = 17
ir_sensor = 27
plastic_servo = 12
paper_servo = 13

[sensors]
cap_active = "high"
ir_active = "low"

[flaps.paper]
home_deg = 180
open_deg = 90

[motion]
step_delay_ms = 0
settle_ms = 0

[control]
tick_ms = 5
"#;

fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("cfg.toml");
    fs::write(&path, body).unwrap();
    path
}

fn sorter(cfg: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sorter").unwrap();
    for var in [
        "SORTER_SIM_CAP",
        "SORTER_SIM_IR",
        "SORTER_SIM_BUTTON",
        "SORTER_SIM_FAULT",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.arg("--config").arg(cfg);
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check"], 0, "ok", "stdout")]
#[case(&["classify", "--cap", "1", "--ir", "1"], 0, "outcome=plastic", "stdout")]
#[case(&["classify", "--cap", "0", "--ir", "0"], 0, "outcome=paper", "stdout")]
#[case(&["classify", "--cap", "1", "--ir", "0"], 0, "outcome=ambiguous", "stdout")]
#[case(&["classify", "--cap", "0", "--ir", "1"], 0, "outcome=none", "stdout")]
#[case(&["classify", "--cap", "2", "--ir", "0"], 2, "invalid value", "stderr")]
#[case(&["sort"], 0, "outcome=none biodegradable=0 non_biodegradable=0", "stdout")]
#[case(&["run", "--no-http", "--for-ms", "100"], 0, "mode=manual", "stdout")]
#[case(&["run", "--no-http", "--auto", "--for-ms", "100"], 0, "mode=automatic", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);

    let mut cmd = sorter(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

// IR is active-low: "0" means something is in view
#[rstest]
#[case("1", "1", "outcome=plastic biodegradable=0 non_biodegradable=1")]
#[case("0", "0", "outcome=paper biodegradable=1 non_biodegradable=0")]
#[case("1", "0", "outcome=ambiguous biodegradable=0 non_biodegradable=0")]
fn sort_uses_simulated_levels(#[case] cap: &str, #[case] ir: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);

    sorter(&cfg)
        .env("SORTER_SIM_CAP", cap)
        .env("SORTER_SIM_IR", ir)
        .arg("sort")
        .assert()
        .success()
        .stdout(predicate::str::contains(needle));
}

#[rstest]
fn sort_json_output_is_parseable() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);

    let out = sorter(&cfg)
        .env("SORTER_SIM_IR", "0")
        .args(["--json", "sort"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["outcome"], "paper");
    assert_eq!(v["biodegradable"], 1);
    assert_eq!(v["non_biodegradable"], 0);
}

#[rstest]
fn servo_fault_exits_with_hardware_code() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);

    sorter(&cfg)
        .env("SORTER_SIM_FAULT", "1")
        .env("SORTER_SIM_CAP", "1")
        .arg("sort")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Hardware I/O failed"));
}

#[rstest]
#[case::missing_pins("[motion]\nstep_delay_ms = 0\n")]
#[case::bad_angle(
    "[pins]\ncap_sensor = 17\nir_sensor = 27\nplastic_servo = 12\npaper_servo = 13\n[flaps.plastic]\nhome_deg = 0\nopen_deg = 200\n"
)]
#[case::shared_pin(
    "[pins]\ncap_sensor = 17\nir_sensor = 17\nplastic_servo = 12\npaper_servo = 13\n"
)]
fn invalid_config_exits_with_config_code(#[case] body: &str) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, body);

    sorter(&cfg)
        .arg("self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration problem"));
}

#[rstest]
fn missing_config_file_is_a_config_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    sorter(&missing)
        .arg("self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("read config"));
}

#[rstest]
fn json_errors_carry_a_reason() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "[pins]\n");

    let out = sorter(&cfg).args(["--json", "self-check"]).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8(out.stderr).unwrap();
    let line = stderr
        .lines()
        .rev()
        .find(|l| l.contains("\"reason\""))
        .expect("json error line");
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["reason"], "Config");
}

#[rstest]
fn bad_sim_level_is_reported() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);

    sorter(&cfg)
        .env("SORTER_SIM_CAP", "yes")
        .arg("sort")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("must be 0 or 1"));
}

#[rstest]
fn run_with_http_stops_when_the_loop_ends() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);

    sorter(&cfg)
        .args(["run", "--bind", "127.0.0.1:0", "--for-ms", "200"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mode=manual"));
}

#[rstest]
fn run_json_report_includes_ticks() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);

    let out = sorter(&cfg)
        .args(["--json", "run", "--no-http", "--for-ms", "50"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["mode"], "manual");
    assert!(v["ticks"].as_u64().unwrap() >= 1);
}

#[rstest]
fn log_file_is_created_when_configured() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("logs").join("sorter.log");
    let body = format!(
        "{VALID}\n[logging]\nfile = {:?}\nlevel = \"debug\"\n",
        log.to_str().unwrap()
    );
    let cfg = write_config(&dir, &body);

    sorter(&cfg).arg("self-check").assert().success();
    assert!(log.exists());
}
