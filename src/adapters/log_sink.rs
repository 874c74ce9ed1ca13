//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink {
    emitted: u64,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events logged since boot.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted += 1;
        match event {
            AppEvent::Started { accessories } => {
                info!("START | {} accessories registered", accessories);
            }
            AppEvent::SwitchChanged { accessory, on } => {
                info!("{}: {}", accessory, on_off(*on));
            }
            AppEvent::LightbulbPower { on, duty } => {
                info!("Led is: {}", on_off(*on));
                if let Some(duty) = duty {
                    info!("Led duty: {}", duty);
                }
            }
            AppEvent::BrightnessChanged { brightness, duty } => {
                info!("Bright Led: {} (duty {})", brightness, duty);
            }
            AppEvent::LightLevelReported { lux, .. } => {
                info!("Current lux: {:.5}", lux);
            }
            AppEvent::HeapReport { free_heap, clients } => {
                info!("Free heap: {}, HomeKit clients: {}", free_heap, clients);
            }
            AppEvent::Identify { aid } => {
                info!("accessory identify (aid {})", aid);
            }
            AppEvent::WriteRejected { capability } => {
                warn!("write to capability #{} rejected", capability);
            }
        }
    }
}
