#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the sorting controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Everything here is fixed at startup; nothing is persisted back.
use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

/// Largest angle a hobby servo accepts.
pub const SERVO_MAX_DEG: i32 = 180;

/// Electrical level at which a line counts as "active".
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    High,
    Low,
}

impl Level {
    /// `true` when this level is the high level.
    #[inline]
    pub fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

#[derive(Debug, Deserialize)]
pub struct Pins {
    pub cap_sensor: u8,
    pub ir_sensor: u8,
    pub button: Option<u8>,
    pub plastic_servo: u8,
    pub paper_servo: u8,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sensors {
    pub cap_active: Level,
    pub ir_active: Level,
    /// Push button wired against a pull-up reads low when pressed.
    pub button_active: Level,
}

impl Default for Sensors {
    fn default() -> Self {
        Self {
            cap_active: Level::High,
            ir_active: Level::Low,
            button_active: Level::Low,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Flap {
    pub home_deg: i32,
    pub open_deg: i32,
}

impl Default for Flap {
    fn default() -> Self {
        Self {
            home_deg: 0,
            open_deg: 90,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Flaps {
    pub plastic: Flap,
    pub paper: Flap,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Motion {
    /// Pause after every one-degree step.
    pub step_delay_ms: u64,
    /// Hold time at the open position before closing again.
    pub settle_ms: u64,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            step_delay_ms: 15,
            settle_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Auto {
    /// A single-sensor detection must persist this long before a sort.
    pub detect_stable_ms: u64,
    /// Minimum spacing between two automatic sorts.
    pub cooldown_ms: u64,
}

impl Default for Auto {
    fn default() -> Self {
        Self {
            detect_stable_ms: 300,
            cooldown_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Control {
    /// Control loop period.
    pub tick_ms: u64,
}

impl Default for Control {
    fn default() -> Self {
        Self { tick_ms: 20 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Server {
    /// Socket address for the HTTP control surface; `None` disables it.
    pub bind: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub sensors: Sensors,
    #[serde(default)]
    pub flaps: Flaps,
    #[serde(default)]
    pub motion: Motion,
    #[serde(default)]
    pub auto: Auto,
    #[serde(default)]
    pub control: Control,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Server {
    /// Parsed bind address, if one is configured.
    pub fn bind_addr(&self) -> eyre::Result<Option<SocketAddr>> {
        match &self.bind {
            None => Ok(None),
            Some(s) => s
                .parse::<SocketAddr>()
                .map(Some)
                .map_err(|e| eyre::eyre!("server.bind {s:?} is not a socket address: {e}")),
        }
    }
}

fn validate_flap(name: &str, flap: &Flap) -> eyre::Result<()> {
    for (field, deg) in [("home_deg", flap.home_deg), ("open_deg", flap.open_deg)] {
        if !(0..=SERVO_MAX_DEG).contains(&deg) {
            eyre::bail!("flaps.{name}.{field} must be in [0, {SERVO_MAX_DEG}], got {deg}");
        }
    }
    if flap.home_deg == flap.open_deg {
        eyre::bail!("flaps.{name}.home_deg and open_deg must differ");
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        let mut seen = HashSet::new();
        let pins = [
            Some(("pins.cap_sensor", self.pins.cap_sensor)),
            Some(("pins.ir_sensor", self.pins.ir_sensor)),
            self.pins.button.map(|p| ("pins.button", p)),
            Some(("pins.plastic_servo", self.pins.plastic_servo)),
            Some(("pins.paper_servo", self.pins.paper_servo)),
        ];
        for (name, pin) in pins.into_iter().flatten() {
            if !seen.insert(pin) {
                eyre::bail!("{name} reuses pin {pin}");
            }
        }

        // Flaps
        validate_flap("plastic", &self.flaps.plastic)?;
        validate_flap("paper", &self.flaps.paper)?;

        // Motion
        if self.motion.step_delay_ms > 1000 {
            eyre::bail!("motion.step_delay_ms is unreasonably large (>1s)");
        }
        if self.motion.settle_ms > 60 * 1000 {
            eyre::bail!("motion.settle_ms is unreasonably large (>1min)");
        }

        // Auto
        if self.auto.detect_stable_ms > 60 * 1000 {
            eyre::bail!("auto.detect_stable_ms is unreasonably large (>1min)");
        }
        if self.auto.cooldown_ms > 60 * 60 * 1000 {
            eyre::bail!("auto.cooldown_ms is unreasonably large (>1h)");
        }

        // Control
        if self.control.tick_ms == 0 {
            eyre::bail!("control.tick_ms must be >= 1");
        }
        if self.control.tick_ms > 1000 {
            eyre::bail!("control.tick_ms is unreasonably large (>1s)");
        }

        // Server
        self.server.bind_addr()?;

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {r:?}");
        }

        Ok(())
    }
}
