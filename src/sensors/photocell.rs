//! GL5528 light-dependent resistor (photocell).
//!
//! Wired in a voltage divider with a fixed resistor and read via the
//! ESP32 ADC. The photocell resistance follows a power law in the
//! illuminance, `R = (mult / lux)^(1/pow)`, which is inverted here.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1_CH6 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static AtomicU16 for injection.

use core::sync::atomic::AtomicU16;
#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::Ordering;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
use crate::pins::{self, Pin};

static SIM_PHOTOCELL_ADC: AtomicU16 = AtomicU16::new(pins::ADC_MAX / 2);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_photocell_adc(raw: u16) {
    SIM_PHOTOCELL_ADC.store(raw, Ordering::Relaxed);
}

/// GL5528 curve coefficients.
const GL5528_MULT: f32 = 32_017_200.0;
const GL5528_POW: f32 = 1.5832;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotocellReading {
    pub raw: u16,
    /// `None` when the divider reads fully dark (open photocell).
    pub resistance_ohms: Option<f32>,
    pub lux: f32,
}

pub struct Photocell {
    other_resistor_ohms: f32,
    on_ground: bool,
    _adc_gpio: Pin,
}

impl Photocell {
    /// `on_ground` is `true` when the photocell sits between the ADC pin
    /// and ground, `false` when it sits between the supply and the pin.
    pub fn new(adc_gpio: Pin, other_resistor_ohms: u32, on_ground: bool) -> Self {
        Self {
            other_resistor_ohms: other_resistor_ohms as f32,
            on_ground,
            _adc_gpio: adc_gpio,
        }
    }

    pub fn read(&self) -> PhotocellReading {
        let raw = self.read_adc();
        let resistance_ohms = self.resistance(raw);
        PhotocellReading {
            raw,
            resistance_ohms,
            lux: resistance_ohms.map_or(0.0, resistance_to_lux),
        }
    }

    /// Current illuminance in lux.
    pub fn lux(&self) -> f32 {
        self.read().lux
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> u16 {
        hw_init::adc_read(hw_init::ADC1_CH_PHOTOCELL)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> u16 {
        SIM_PHOTOCELL_ADC.load(Ordering::Relaxed)
    }

    fn resistance(&self, raw: u16) -> Option<f32> {
        let max = f32::from(pins::ADC_MAX);
        let raw = f32::from(raw.min(pins::ADC_MAX));
        let (num, den) = if self.on_ground {
            (raw, max - raw)
        } else {
            (max - raw, raw)
        };
        if den <= 0.0 {
            return None;
        }
        Some(self.other_resistor_ohms * num / den)
    }
}

/// Invert the GL5528 curve.  A shorted photocell (0 Ω) is treated as 1 Ω.
pub fn resistance_to_lux(resistance_ohms: f32) -> f32 {
    GL5528_MULT / resistance_ohms.max(1.0).powf(GL5528_POW)
}
