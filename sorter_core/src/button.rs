//! Manual trigger button: press-edge detection with a fixed re-trigger lockout.

use std::time::{Duration, Instant};

/// Presses closer together than this after a trigger are ignored.
pub const BUTTON_REPEAT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Default)]
pub struct ButtonGate {
    was_pressed: bool,
    last_fire: Option<Instant>,
}

impl ButtonGate {
    /// Feed one poll of the button. Returns `true` on a press edge when
    /// `enabled` and outside the lockout window. Edges are tracked even while
    /// disabled, so holding the button across a mode change does not fire.
    pub fn poll(&mut self, pressed: bool, now: Instant, enabled: bool) -> bool {
        let edge = pressed && !self.was_pressed;
        self.was_pressed = pressed;
        if !edge || !enabled {
            return false;
        }
        if let Some(t) = self.last_fire
            && now.saturating_duration_since(t) < BUTTON_REPEAT
        {
            tracing::debug!("button press ignored during repeat lockout");
            return false;
        }
        self.last_fire = Some(now);
        true
    }

    /// Restart the lockout at `now`, for when the triggered sort ends.
    pub fn restart_lockout(&mut self, now: Instant) {
        self.last_fire = Some(now);
    }
}
