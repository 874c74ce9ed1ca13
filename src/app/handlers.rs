//! Command handlers — one per writable capability kind.
//!
//! A handler maps an inbound value-write to hardware actuation plus a
//! state-model update.  Actuation happens first and the registry is
//! committed afterwards, so a stored value never runs ahead of the pin.
//! Handlers run inline on the loop thread and must not block.
//!
//! The two boolean handlers differ on purpose:
//!
//! | write          | [`SwitchHandler`]  | [`LightbulbPowerHandler`] |
//! |----------------|--------------------|---------------------------|
//! | true → true    | pins driven again  | no pin write              |
//! | false → true   | pins driven        | duty = stored brightness  |
//! | any → false    | pins driven        | duty = 0                  |

use heapless::Vec;

use crate::error::{Error, Result};
use crate::pins::Pin;

use super::events::AppEvent;
use super::model::{
    AccessoryRegistry, CapabilityId, MAX_CAPABILITIES, Value, ValueType,
};
use super::ports::{ActuatorPort, EventSink, LightSensorPort, NotifyPort, PinState};

/// Polymorphic handler for inbound writes to one capability.
pub trait CommandHandler {
    /// The capability this handler owns.
    fn capability(&self) -> CapabilityId;

    /// Apply `value`.  The value tag is checked before anything is driven.
    fn handle(
        &mut self,
        value: Value,
        registry: &mut AccessoryRegistry,
        hw: &mut dyn ActuatorPort,
        sink: &mut dyn EventSink,
    ) -> Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Brightness → duty
// ───────────────────────────────────────────────────────────────

/// `round(range / 100 * brightness)`, exact, rounding half up.
///
/// Brightness is not clamped.  The result saturates into the duty
/// register width, so negative inputs give 0 and very large ones give
/// `u16::MAX`.
pub fn duty_for_brightness(brightness: i32, range: u16) -> u16 {
    let scaled = (i64::from(range) * i64::from(brightness) + 50).div_euclid(100);
    scaled.clamp(0, i64::from(u16::MAX)) as u16
}

fn expect_bool(value: Value) -> Result<bool> {
    value.as_bool().ok_or(Error::TypeMismatch {
        expected: ValueType::Bool,
        found: value.value_type(),
    })
}

fn expect_int(value: Value) -> Result<i32> {
    value.as_int().ok_or(Error::TypeMismatch {
        expected: ValueType::Int,
        found: value.value_type(),
    })
}

// ───────────────────────────────────────────────────────────────
// Wall switches
// ───────────────────────────────────────────────────────────────

/// Output lines a switch drives, and which level closes them.
#[derive(Debug, Clone)]
pub struct SwitchWiring {
    pub lines: Vec<Pin, 2>,
    pub active_high: bool,
}

impl SwitchWiring {
    pub fn new(lines: &[Pin], active_high: bool) -> Self {
        let mut v = Vec::new();
        for &pin in lines.iter().take(2) {
            let _ = v.push(pin);
        }
        Self {
            lines: v,
            active_high,
        }
    }

    pub fn level(&self, on: bool) -> PinState {
        if on == self.active_high {
            PinState::High
        } else {
            PinState::Low
        }
    }

    /// Drive every line for the requested state.
    pub fn drive(&self, on: bool, hw: &mut dyn ActuatorPort) {
        let level = self.level(on);
        for &pin in &self.lines {
            hw.set_digital(pin, level);
        }
    }
}

/// Wall switch: every write is applied to the pins, repeated or not.
pub struct SwitchHandler {
    capability: CapabilityId,
    wiring: SwitchWiring,
}

impl SwitchHandler {
    pub fn new(capability: CapabilityId, wiring: SwitchWiring) -> Self {
        Self { capability, wiring }
    }

    pub fn wiring(&self) -> &SwitchWiring {
        &self.wiring
    }
}

impl CommandHandler for SwitchHandler {
    fn capability(&self) -> CapabilityId {
        self.capability
    }

    fn handle(
        &mut self,
        value: Value,
        registry: &mut AccessoryRegistry,
        hw: &mut dyn ActuatorPort,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        let on = expect_bool(value)?;
        let accessory = match registry.owner(self.capability) {
            Some(acc) => acc.name.clone(),
            None => registry.capability(self.capability)?.name.clone(),
        };

        self.wiring.drive(on, hw);
        registry.write(self.capability, Value::Bool(on))?;

        sink.emit(&AppEvent::SwitchChanged { accessory, on });
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Lightbulb
// ───────────────────────────────────────────────────────────────

/// Lightbulb power.  Re-applies the stored brightness on OFF→ON only.
pub struct LightbulbPowerHandler {
    on: CapabilityId,
    brightness: CapabilityId,
    pin: Pin,
    pwm_range: u16,
}

impl LightbulbPowerHandler {
    pub fn new(on: CapabilityId, brightness: CapabilityId, pin: Pin, pwm_range: u16) -> Self {
        Self {
            on,
            brightness,
            pin,
            pwm_range,
        }
    }
}

impl CommandHandler for LightbulbPowerHandler {
    fn capability(&self) -> CapabilityId {
        self.on
    }

    fn handle(
        &mut self,
        value: Value,
        registry: &mut AccessoryRegistry,
        hw: &mut dyn ActuatorPort,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        let on = expect_bool(value)?;
        // Read before overwrite: the transition decides what is driven.
        let was_on = registry.read_bool(self.on)?;
        let brightness = registry.read_int(self.brightness)?;

        let applied = if !on {
            hw.set_pwm(self.pin, 0);
            Some(0)
        } else if !was_on {
            let duty = duty_for_brightness(brightness, self.pwm_range);
            hw.set_pwm(self.pin, duty);
            Some(duty)
        } else {
            None
        };
        registry.write(self.on, Value::Bool(on))?;

        sink.emit(&AppEvent::LightbulbPower { on, duty: applied });
        Ok(())
    }
}

/// Lightbulb brightness.  Applied immediately, whatever the power state.
pub struct LightbulbBrightnessHandler {
    brightness: CapabilityId,
    pin: Pin,
    pwm_range: u16,
}

impl LightbulbBrightnessHandler {
    pub fn new(brightness: CapabilityId, pin: Pin, pwm_range: u16) -> Self {
        Self {
            brightness,
            pin,
            pwm_range,
        }
    }
}

impl CommandHandler for LightbulbBrightnessHandler {
    fn capability(&self) -> CapabilityId {
        self.brightness
    }

    fn handle(
        &mut self,
        value: Value,
        registry: &mut AccessoryRegistry,
        hw: &mut dyn ActuatorPort,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        let brightness = expect_int(value)?;
        registry.capability(self.brightness)?;

        let duty = duty_for_brightness(brightness, self.pwm_range);
        hw.set_pwm(self.pin, duty);
        registry.write(self.brightness, Value::Int(brightness))?;

        sink.emit(&AppEvent::BrightnessChanged { brightness, duty });
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Light sensor report (read-and-push)
// ───────────────────────────────────────────────────────────────

/// Samples the light sensor into the light-level capability and notifies.
pub struct SensorReporter {
    capability: CapabilityId,
}

impl SensorReporter {
    pub fn new(capability: CapabilityId) -> Self {
        Self { capability }
    }

    pub fn capability(&self) -> CapabilityId {
        self.capability
    }

    /// Returns the level that was stored and pushed.
    pub fn report(
        &self,
        registry: &mut AccessoryRegistry,
        sensor: &mut dyn LightSensorPort,
        notifier: &mut dyn NotifyPort,
        sink: &mut dyn EventSink,
    ) -> Result<i32> {
        let lux = sensor.read_lux();
        let level = lux_to_level(lux);

        registry.write(self.capability, Value::Int(level))?;
        notifier.notify(self.capability, Value::Int(level));

        sink.emit(&AppEvent::LightLevelReported { lux, level });
        Ok(level)
    }
}

/// Round to the nearest whole lux.  NaN reads as 0, infinities saturate.
pub fn lux_to_level(lux: f32) -> i32 {
    lux.round() as i32
}

// ───────────────────────────────────────────────────────────────
// Handler table
// ───────────────────────────────────────────────────────────────

/// Handlers keyed by the capability they own, in registration order.
#[derive(Default)]
pub struct HandlerTable {
    handlers: Vec<Box<dyn CommandHandler>, MAX_CAPABILITIES>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Box<dyn CommandHandler>) -> Result<()> {
        self.handlers
            .push(handler)
            .map_err(|_| Error::RegistryFull)
    }

    pub fn get_mut(&mut self, capability: CapabilityId) -> Option<&mut (dyn CommandHandler + 'static)> {
        self.handlers
            .iter_mut()
            .find(|h| h.capability() == capability)
            .map(|h| h.as_mut())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
