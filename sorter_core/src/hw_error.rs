//! Maps `Box<dyn Error>` from trait boundaries to typed `SorterError`.
//!
//! The traits in `sorter_traits` use `Box<dyn Error + Send + Sync>`; this module
//! converts those to our typed error enum, with an optional feature-gated path
//! for `sorter_hardware::HwError` downcasting.

use crate::error::SorterError;

/// Map a trait-boundary error to a typed `SorterError`.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> SorterError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<sorter_hardware::error::HwError>() {
            return match hw {
                sorter_hardware::error::HwError::AngleOutOfRange(deg) => {
                    SorterError::Config(format!("servo angle {deg} out of range"))
                }
                other => SorterError::HardwareFault(other.to_string()),
            };
        }
    }

    SorterError::Hardware(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_errors_fall_back_to_hardware() {
        let e = std::io::Error::other("pin busy");
        match map_hw_error(&e) {
            SorterError::Hardware(msg) => assert!(msg.contains("pin busy")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn typed_hw_errors_are_downcast() {
        use sorter_hardware::error::HwError;
        assert!(matches!(
            map_hw_error(&HwError::Pwm("x".into())),
            SorterError::HardwareFault(_)
        ));
        assert!(matches!(
            map_hw_error(&HwError::AngleOutOfRange(200)),
            SorterError::Config(_)
        ));
    }
}
