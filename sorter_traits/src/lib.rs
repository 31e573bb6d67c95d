//! Hardware seams shared by the sorter crates.
//!
//! Everything that touches a pin goes through these traits so the core can be
//! driven by real GPIO, by the simulator, or by test doubles.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// A binary input line (sensor output or push button).
pub trait DigitalInput {
    /// Current electrical level; `true` means high.
    fn is_high(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

/// A positional actuator accepting integer-degree commands.
pub trait Servo {
    fn set_angle(&mut self, degrees: i32) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: DigitalInput + ?Sized> DigitalInput for Box<T> {
    fn is_high(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        (**self).is_high()
    }
}

impl<T: Servo + ?Sized> Servo for Box<T> {
    fn set_angle(&mut self, degrees: i32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_angle(degrees)
    }
}
