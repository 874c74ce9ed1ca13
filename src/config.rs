//! System configuration parameters
//!
//! All tunable parameters for the switchboard: PWM scaling, report
//! periods, photocell wiring and the identity the accessories announce.
//! Defaults can be overridden at build time with a JSON document in the
//! `SWITCHBOARD_CONFIG` environment variable (see `build.rs`).

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pins;
use crate::scheduler::MAX_PERIOD_MS;

/// Short identity string (names, serials, setup data).
pub type Label = String<32>;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Dimmer ---
    /// Largest PWM duty value; brightness 100 % maps onto it
    pub pwm_range: u16,
    /// Brightness (0-100 %) the lightbulb starts with after a cold boot
    pub default_brightness: u8,

    // --- Switches ---
    /// Logic level that closes a switch relay (`false` = active LOW)
    pub switch_active_high: bool,

    // --- Timing ---
    /// Ambient light report period (milliseconds)
    pub sensor_report_interval_ms: u32,
    /// Heap / client-count diagnostic period (milliseconds)
    pub heap_report_interval_ms: u32,
    /// Yield between run-loop iterations (milliseconds)
    pub loop_delay_ms: u32,
    /// Run-loop stall that resets the device (milliseconds)
    pub watchdog_timeout_ms: u32,

    // --- Photocell ---
    /// Fixed resistor of the photocell divider (ohms)
    pub photocell_other_resistor_ohms: u32,
    /// `true` when the photocell sits between the ADC pin and ground
    pub photocell_on_ground: bool,

    // --- Accessory identity ---
    /// Pairing code shown to the user, `XXX-XX-XXX`
    pub setup_code: Label,
    /// Four-character setup id used in the pairing payload
    pub setup_id: Label,
    pub manufacturer: Label,
    pub model: Label,
    pub serial_number: Label,
    pub firmware_revision: Label,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Dimmer
            pwm_range: pins::PWM_RANGE_MAX,
            default_brightness: 50,

            // Switches
            switch_active_high: false,

            // Timing
            sensor_report_interval_ms: 10_000, // every 10 s
            heap_report_interval_ms: 5_000,    // every 5 s
            loop_delay_ms: 10,
            watchdog_timeout_ms: 10_000,

            // Photocell
            photocell_other_resistor_ohms: 10_000,
            photocell_on_ground: false,

            // Identity
            setup_code: label("111-11-111"),
            setup_id: label("1BY8"),
            manufacturer: label("NodeMCU v3 HomeKit"),
            model: label("ESP8266"),
            serial_number: label("21022021"),
            firmware_revision: label("1.0"),
        }
    }
}

impl SystemConfig {
    /// Parse a (possibly partial) JSON override.  Missing fields keep
    /// their defaults.  The result is validated before it is returned.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every field that the run loop depends on.
    pub fn validate(&self) -> Result<()> {
        if self.pwm_range == 0 {
            return Err(Error::Config("pwm_range must be non-zero"));
        }
        if self.default_brightness > 100 {
            return Err(Error::Config("default_brightness must be 0-100"));
        }
        for period in [self.sensor_report_interval_ms, self.heap_report_interval_ms] {
            if period == 0 || period > MAX_PERIOD_MS {
                return Err(Error::Config("report intervals must be 1..=2^31-1 ms"));
            }
        }
        if self.watchdog_timeout_ms <= self.loop_delay_ms {
            return Err(Error::Config("watchdog_timeout_ms must exceed loop_delay_ms"));
        }
        if self.photocell_other_resistor_ohms == 0 {
            return Err(Error::Config("photocell resistor must be non-zero"));
        }
        if !is_setup_code(&self.setup_code) {
            return Err(Error::Config("setup_code must look like 123-45-678"));
        }
        if self.setup_id.len() != 4 {
            return Err(Error::Config("setup_id must be 4 characters"));
        }
        Ok(())
    }
}

fn label(s: &str) -> Label {
    let mut out = Label::new();
    let _ = out.push_str(&s[..s.len().min(32)]);
    out
}

fn is_setup_code(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            3 | 6 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
