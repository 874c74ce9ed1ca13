//! Inbound writes → handlers → pins, through the server pump.

use switchboard::app::events::AppEvent;
use switchboard::app::model::Value;
use switchboard::app::ports::PinState;
use switchboard::config::SystemConfig;
use switchboard::pins;

use crate::mock_hw::{ActuatorCall, Rig};

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn start_drives_boot_state_and_announces() {
    let mut rig = Rig::booted(SystemConfig::default());
    rig.app
        .start(&mut rig.hw, &mut rig.server, &mut rig.sink)
        .unwrap();

    // Active-low switches boot released (HIGH); the dimmer boots dark.
    assert_eq!(
        rig.hw.calls,
        vec![
            ActuatorCall::Digital { pin: pins::SWITCH_SHARED_GPIO, level: PinState::High },
            ActuatorCall::Digital { pin: pins::SWITCH_LEFT_GPIO, level: PinState::High },
            ActuatorCall::Digital { pin: pins::SWITCH_RIGHT_GPIO, level: PinState::High },
            ActuatorCall::Pwm { pin: pins::LIGHTBULB_GPIO, duty: 0 },
        ]
    );
    assert_eq!(rig.server.registered_accessories, Some(4));
    assert_eq!(rig.server.setup_code, "111-11-111");

    let ids = rig.app.ids();
    assert_eq!(
        rig.server.notifications,
        vec![
            (ids.lightbulb_brightness, Value::Int(50)),
            (ids.lightbulb_on, Value::Bool(false)),
        ]
    );
    assert_eq!(rig.sink.events, vec![AppEvent::Started { accessories: 4 }]);
}

#[test]
fn active_high_wiring_boots_low() {
    let config = SystemConfig {
        switch_active_high: true,
        ..SystemConfig::default()
    };
    let mut rig = Rig::booted(config);
    rig.app
        .start(&mut rig.hw, &mut rig.server, &mut rig.sink)
        .unwrap();
    assert!(rig
        .hw
        .digital_writes()
        .iter()
        .all(|&(_, level)| level == PinState::Low));
}

// ── Lightbulb ─────────────────────────────────────────────────

#[test]
fn brightness_set_while_off_is_replayed_on_power_on() {
    let mut rig = Rig::started();
    let ids = rig.app.ids();

    rig.write(ids.lightbulb_brightness, Value::Int(75), 100);
    assert_eq!(rig.hw.pwm_writes(), vec![767], "brightness applies even while off");

    rig.write(ids.lightbulb_on, Value::Bool(true), 200);
    assert_eq!(rig.hw.pwm_writes(), vec![767, 767]);

    rig.write(ids.lightbulb_on, Value::Bool(true), 300);
    assert_eq!(rig.hw.pwm_writes(), vec![767, 767], "repeated ON writes nothing");

    let reg = rig.app.registry();
    assert!(reg.read_bool(ids.lightbulb_on).unwrap());
    assert_eq!(reg.read_int(ids.lightbulb_brightness).unwrap(), 75);
}

#[test]
fn cold_power_on_uses_default_brightness() {
    let mut rig = Rig::started();
    let ids = rig.app.ids();

    rig.write(ids.lightbulb_on, Value::Bool(true), 100);
    assert_eq!(rig.hw.pwm_writes(), vec![512]);
}

#[test]
fn off_always_zeroes_and_on_after_off_restores() {
    let mut rig = Rig::started();
    let ids = rig.app.ids();

    rig.write(ids.lightbulb_on, Value::Bool(false), 100);
    rig.write(ids.lightbulb_on, Value::Bool(false), 200);
    rig.write(ids.lightbulb_brightness, Value::Int(20), 300);
    rig.write(ids.lightbulb_on, Value::Bool(true), 400);
    rig.write(ids.lightbulb_on, Value::Bool(false), 500);
    rig.write(ids.lightbulb_on, Value::Bool(true), 600);

    assert_eq!(rig.hw.pwm_writes(), vec![0, 0, 205, 205, 0, 205]);
}

#[test]
fn switch_repeats_while_lightbulb_suppresses() {
    let mut rig = Rig::started();
    let ids = rig.app.ids();

    rig.write(ids.left_switch, Value::Bool(true), 100);
    rig.write(ids.left_switch, Value::Bool(true), 200);
    let active = PinState::Low;
    assert_eq!(
        rig.hw.digital_writes(),
        vec![
            (pins::SWITCH_SHARED_GPIO, active),
            (pins::SWITCH_LEFT_GPIO, active),
            (pins::SWITCH_SHARED_GPIO, active),
            (pins::SWITCH_LEFT_GPIO, active),
        ],
        "both switch writes reach the pins"
    );

    rig.hw.clear();
    rig.write(ids.lightbulb_on, Value::Bool(true), 300);
    rig.write(ids.lightbulb_on, Value::Bool(true), 400);
    assert_eq!(rig.hw.pwm_writes().len(), 1, "only the first ON reaches the pin");
}

#[test]
fn right_switch_leaves_shared_line_alone() {
    let mut rig = Rig::started();
    let ids = rig.app.ids();

    rig.write(ids.right_switch, Value::Bool(true), 100);
    rig.write(ids.right_switch, Value::Bool(false), 200);
    assert_eq!(
        rig.hw.digital_writes(),
        vec![
            (pins::SWITCH_RIGHT_GPIO, PinState::Low),
            (pins::SWITCH_RIGHT_GPIO, PinState::High),
        ]
    );
    assert!(!rig.app.registry().read_bool(ids.right_switch).unwrap());
}

#[test]
fn switch_events_tell_left_from_right() {
    let mut rig = Rig::started();
    let ids = rig.app.ids();

    rig.write(ids.left_switch, Value::Bool(true), 100);
    rig.write(ids.right_switch, Value::Bool(false), 200);

    let names: Vec<(String, bool)> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::SwitchChanged { accessory, on } => Some((accessory.to_string(), *on)),
            _ => None,
        })
        .collect();
    assert_eq!(
        names,
        vec![
            ("Left Switch".to_string(), true),
            ("Right Switch".to_string(), false),
        ]
    );
}

// ── Rejected writes ───────────────────────────────────────────

#[test]
fn mistyped_write_is_dropped_without_actuation() {
    let mut rig = Rig::started();
    let ids = rig.app.ids();

    rig.write(ids.lightbulb_on, Value::Int(1), 100);
    rig.write(ids.lightbulb_brightness, Value::Bool(true), 200);

    assert!(rig.hw.calls.is_empty());
    assert_eq!(rig.app.writes_rejected(), 2);
    assert_eq!(rig.app.writes_applied(), 0);
    assert!(!rig.app.registry().read_bool(ids.lightbulb_on).unwrap());
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::WriteRejected { .. })),
        2
    );
}

#[test]
fn write_to_read_only_sensor_is_rejected() {
    let mut rig = Rig::started();
    let ids = rig.app.ids();

    rig.write(ids.light_level, Value::Int(999), 100);
    assert_eq!(rig.app.writes_rejected(), 1);
    assert_eq!(rig.app.registry().read_int(ids.light_level).unwrap(), 0);
}

#[test]
fn one_pump_dispatches_every_queued_write_in_order() {
    let mut rig = Rig::started();
    let ids = rig.app.ids();

    rig.server.queue(ids.lightbulb_brightness, Value::Int(100));
    rig.server.queue(ids.lightbulb_on, Value::Bool(true));
    rig.server.queue(ids.lightbulb_on, Value::Bool(false));
    rig.run_once(100);

    assert_eq!(rig.hw.pwm_writes(), vec![1023, 1023, 0]);
    assert_eq!(rig.app.writes_applied(), 3);
    assert!(rig.server.writes.is_empty());
}
