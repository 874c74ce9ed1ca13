//! The accessory layout of this board.
//!
//! Four accessories are announced, in this order (the order fixes their
//! protocol accessory ids):
//!
//! | aid | accessory              | capabilities        | pins                     |
//! |-----|------------------------|---------------------|--------------------------|
//! | 1   | Left Switch            | switch              | shared line + left line  |
//! | 2   | Right Switch           | switch              | right line               |
//! | 3   | Light Sensor           | light level (lux)   | —                        |
//! | 4   | Monitor LED Controller | power, brightness   | dimmer PWM               |
//!
//! Only the left switch drives the shared line.  The board is wired that
//! way; do not fold the two switch wirings into one.

use heapless::Vec;

use crate::config::SystemConfig;
use crate::error::Result;
use crate::pins;

use super::handlers::{
    HandlerTable, LightbulbBrightnessHandler, LightbulbPowerHandler, SensorReporter,
    SwitchHandler, SwitchWiring,
};
use super::model::{
    AccessoryInfo, AccessoryRegistry, CapabilityId, CapabilityKind, Category, Value, name_from,
};

/// Light level shown before the first sensor report.
const INITIAL_LIGHT_LEVEL: i32 = 2;

/// Ids of every capability on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityIds {
    pub left_switch: CapabilityId,
    pub right_switch: CapabilityId,
    pub light_level: CapabilityId,
    pub lightbulb_on: CapabilityId,
    pub lightbulb_brightness: CapabilityId,
}

/// Everything the run loop needs, built once at boot.
pub struct Board {
    pub registry: AccessoryRegistry,
    pub handlers: HandlerTable,
    pub reporter: SensorReporter,
    pub ids: CapabilityIds,
    /// Wiring of every switch, for driving the boot state.
    pub switch_wirings: Vec<SwitchWiring, 2>,
}

fn info_from(config: &SystemConfig) -> AccessoryInfo {
    AccessoryInfo {
        manufacturer: name_from(&config.manufacturer),
        model: name_from(&config.model),
        serial_number: name_from(&config.serial_number),
        firmware_revision: name_from(&config.firmware_revision),
    }
}

/// Build the registry and handler table for this board.
pub fn build(config: &SystemConfig) -> Result<Board> {
    let mut registry = AccessoryRegistry::new();

    let left_switch = registry.add_capability(
        CapabilityKind::Switch,
        "Switch",
        Value::Bool(false),
        Some(pins::SWITCH_LEFT_GPIO),
    )?;
    let right_switch = registry.add_capability(
        CapabilityKind::Switch,
        "Switch",
        Value::Bool(false),
        Some(pins::SWITCH_RIGHT_GPIO),
    )?;
    let light_level = registry.add_capability(
        CapabilityKind::LightLevel,
        "Light",
        Value::Int(INITIAL_LIGHT_LEVEL),
        None,
    )?;
    let lightbulb_on = registry.add_capability(
        CapabilityKind::Power,
        "Monitor LED",
        Value::Bool(false),
        Some(pins::LIGHTBULB_GPIO),
    )?;
    let lightbulb_brightness = registry.add_capability(
        CapabilityKind::Brightness,
        "LED strip with rainbow switch",
        Value::Int(i32::from(config.default_brightness)),
        Some(pins::LIGHTBULB_GPIO),
    )?;

    registry.add_accessory("Left Switch", Category::Switch, info_from(config), &[left_switch])?;
    registry.add_accessory("Right Switch", Category::Switch, info_from(config), &[right_switch])?;
    registry.add_accessory("Light Sensor", Category::Sensor, info_from(config), &[light_level])?;
    registry.add_accessory(
        "Monitor LED Controller",
        Category::Lightbulb,
        info_from(config),
        &[lightbulb_on, lightbulb_brightness],
    )?;

    let left_wiring = SwitchWiring::new(
        &[pins::SWITCH_SHARED_GPIO, pins::SWITCH_LEFT_GPIO],
        config.switch_active_high,
    );
    let right_wiring = SwitchWiring::new(&[pins::SWITCH_RIGHT_GPIO], config.switch_active_high);

    let mut switch_wirings = Vec::new();
    let _ = switch_wirings.push(left_wiring.clone());
    let _ = switch_wirings.push(right_wiring.clone());

    let mut handlers = HandlerTable::new();
    handlers.register(Box::new(SwitchHandler::new(left_switch, left_wiring)))?;
    handlers.register(Box::new(SwitchHandler::new(right_switch, right_wiring)))?;
    handlers.register(Box::new(LightbulbPowerHandler::new(
        lightbulb_on,
        lightbulb_brightness,
        pins::LIGHTBULB_GPIO,
        config.pwm_range,
    )))?;
    handlers.register(Box::new(LightbulbBrightnessHandler::new(
        lightbulb_brightness,
        pins::LIGHTBULB_GPIO,
        config.pwm_range,
    )))?;

    Ok(Board {
        registry,
        handlers,
        reporter: SensorReporter::new(light_level),
        ids: CapabilityIds {
            left_switch,
            right_switch,
            light_level,
            lightbulb_on,
            lightbulb_brightness,
        },
        switch_wirings,
    })
}
