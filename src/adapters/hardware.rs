//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the [`Photocell`] and drives the switch outputs and the dimmer
//! through [`drivers::hw_init`](crate::drivers::hw_init), exposing them
//! through [`ActuatorPort`] and [`LightSensorPort`].  This is the only
//! module in the system that touches actual hardware.  On non-espidf
//! targets the underlying driver calls are cfg-gated simulation stubs.
//!
//! The last level and duty written to each pin are kept, so the current
//! output state can be read back on every target.

use heapless::Vec;
use log::warn;

use crate::app::ports::{ActuatorPort, LightSensorPort, PinState};
use crate::drivers::hw_init;
use crate::pins::Pin;
use crate::sensors::photocell::Photocell;

const MAX_OUTPUTS: usize = 8;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    photocell: Photocell,
    levels: Vec<(Pin, PinState), MAX_OUTPUTS>,
    duties: Vec<(Pin, u16), MAX_OUTPUTS>,
}

impl HardwareAdapter {
    pub fn new(photocell: Photocell) -> Self {
        Self {
            photocell,
            levels: Vec::new(),
            duties: Vec::new(),
        }
    }

    /// Last level written to `pin`.
    pub fn digital_level(&self, pin: Pin) -> Option<PinState> {
        self.levels.iter().find(|(p, _)| *p == pin).map(|&(_, l)| l)
    }

    /// Last duty written to `pin`.
    pub fn pwm_duty(&self, pin: Pin) -> Option<u16> {
        self.duties.iter().find(|(p, _)| *p == pin).map(|&(_, d)| d)
    }
}

fn remember<T: Copy>(slots: &mut Vec<(Pin, T), MAX_OUTPUTS>, pin: Pin, value: T) {
    if let Some(slot) = slots.iter_mut().find(|(p, _)| *p == pin) {
        slot.1 = value;
    } else {
        let _ = slots.push((pin, value));
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_digital(&mut self, pin: Pin, level: PinState) {
        hw_init::gpio_write(pin, level == PinState::High);
        remember(&mut self.levels, pin, level);
    }

    fn set_pwm(&mut self, pin: Pin, duty: u16) {
        match hw_init::ledc_channel_for(pin) {
            Some(channel) => hw_init::ledc_set(channel, duty),
            None => {
                warn!("HardwareAdapter: GPIO{} has no PWM channel, duty {} dropped", pin, duty);
                return;
            }
        }
        remember(&mut self.duties, pin, duty);
    }
}

// ── LightSensorPort implementation ────────────────────────────

impl LightSensorPort for HardwareAdapter {
    fn read_lux(&mut self) -> f32 {
        self.photocell.lux()
    }
}
