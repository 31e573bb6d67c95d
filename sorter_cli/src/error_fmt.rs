//! Human-readable error descriptions and structured JSON error formatting.

use sorter_core::error::{BuildError, SorterError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingPlasticFlap => {
                "What happened: No servo was provided for the plastic flap.\nLikely causes: The servo failed to initialize or was not wired into the builder.\nHow to fix: Check [pins].plastic_servo and make sure the servo is passed via with_plastic_servo(...).".to_string()
            }
            BuildError::MissingPaperFlap => {
                "What happened: No servo was provided for the paper flap.\nLikely causes: The servo failed to initialize or was not wired into the builder.\nHow to fix: Check [pins].paper_servo and make sure the servo is passed via with_paper_servo(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Flap angles outside 0..=180 or equal home/open angles.\nHow to fix: Edit the [flaps] tables in the config file, then rerun."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<SorterError>() {
        return match se {
            SorterError::Config(msg) => format!(
                "What happened: Configuration problem: {msg}.\nLikely causes: Missing [pins], a typo in a key, or out-of-range values.\nHow to fix: Edit the TOML config and try again; `sorter self-check` validates it."
            ),
            SorterError::Hardware(msg) | SorterError::HardwareFault(msg) => format!(
                "What happened: Hardware I/O failed: {msg}.\nLikely causes: Wrong pin numbers, loose servo or sensor wiring, missing power, or no GPIO permission.\nHow to fix: Check [pins] in the config and the wiring, then rerun with --log-level=debug."
            ),
            SorterError::LoopStopped => {
                "What happened: The control loop is no longer running.\nLikely causes: A hardware fault stopped the loop, or shutdown was requested.\nHow to fix: Check the log for the fault that stopped the loop and restart the sorter.".to_string()
            }
            SorterError::State(msg) => format!(
                "What happened: {msg}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("bind http") {
        return format!(
            "What happened: The HTTP control surface could not listen ({msg}).\nLikely causes: Port already in use or an address not present on this host.\nHow to fix: Pick another address with --bind or [server].bind, or run with --no-http."
        );
    }

    if lower.contains("sorter_sim_") {
        return format!(
            "What happened: {msg}.\nLikely causes: A simulation variable holds something other than 0 or 1.\nHow to fix: Set SORTER_SIM_CAP / SORTER_SIM_IR / SORTER_SIM_BUTTON to 0 or 1."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable short name for the error class, used as the JSON `reason`.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    match err.downcast_ref::<SorterError>() {
        Some(SorterError::Config(_)) => "Config",
        Some(SorterError::Hardware(_) | SorterError::HardwareFault(_)) => "Hardware",
        Some(SorterError::LoopStopped) => "LoopStopped",
        Some(SorterError::State(_)) | None => "Error",
    }
}

/// Map typed errors to stable exit codes: config 2, hardware 3, loop stopped 4, other 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match reason_name(err) {
        "Config" => 2,
        "Hardware" => 3,
        "LoopStopped" => 4,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "message": humanize(err),
        "detail": format!("{err:#}"),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(eyre::Report::new(SorterError::Config("x".into())), 2)]
    #[case(eyre::Report::new(BuildError::InvalidConfig("x")), 2)]
    #[case(eyre::Report::new(SorterError::HardwareFault("x".into())), 3)]
    #[case(eyre::Report::new(SorterError::Hardware("x".into())), 3)]
    #[case(eyre::Report::new(SorterError::LoopStopped), 4)]
    #[case(eyre::eyre!("something else"), 1)]
    fn exit_codes_are_stable(#[case] err: eyre::Report, #[case] code: i32) {
        assert_eq!(exit_code_for_error(&err), code);
    }

    #[test]
    fn wrapped_errors_keep_their_class() {
        use eyre::WrapErr;
        let err: eyre::Result<()> =
            Err(eyre::Report::new(SorterError::Hardware("pin busy".into())));
        let err = err.wrap_err("moving plastic flap to 1").unwrap_err();
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).contains("Hardware I/O failed"));
    }

    #[test]
    fn json_error_has_reason_and_message() {
        let err = eyre::Report::new(SorterError::LoopStopped);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "LoopStopped");
        assert!(v["message"].as_str().unwrap().contains("What happened"));
    }
}
