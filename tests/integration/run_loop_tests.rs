//! Run loop: periodic reports, identify requests and the scheduler clock.

use switchboard::app::events::AppEvent;
use switchboard::app::model::Value;
use switchboard::app::service::{HEAP_REPORT_TASK, SENSOR_REPORT_TASK};
use switchboard::config::SystemConfig;
use switchboard::scheduler::Millis;

use crate::mock_hw::Rig;

fn light_reports(rig: &Rig) -> usize {
    rig.sink
        .count(|e| matches!(e, AppEvent::LightLevelReported { .. }))
}

fn heap_reports(rig: &Rig) -> usize {
    rig.sink.count(|e| matches!(e, AppEvent::HeapReport { .. }))
}

#[test]
fn both_reports_fire_on_first_iteration() {
    let mut rig = Rig::booted(SystemConfig::default());
    rig.app
        .start(&mut rig.hw, &mut rig.server, &mut rig.sink)
        .unwrap();
    rig.sink.events.clear();

    rig.run_once(0);
    assert_eq!(light_reports(&rig), 1);
    assert_eq!(heap_reports(&rig), 1);
    assert_eq!(
        rig.app.scheduler().next_due(SENSOR_REPORT_TASK),
        Some(Millis(10_000))
    );
    assert_eq!(rig.app.scheduler().next_due(HEAP_REPORT_TASK), Some(Millis(5_000)));
}

#[test]
fn report_ticks_eleven_seconds_apart_both_fire() {
    // Task due at t = 0 with a 10 s period; the loop stalls until t = 11 s.
    let mut rig = Rig::booted(SystemConfig::default());

    rig.run_once(11_000);
    assert_eq!(light_reports(&rig), 1);
    assert_eq!(
        rig.app.scheduler().next_due(SENSOR_REPORT_TASK),
        Some(Millis(21_000))
    );

    rig.run_once(20_999);
    assert_eq!(light_reports(&rig), 1);

    rig.run_once(21_000);
    assert_eq!(light_reports(&rig), 2);
    assert_eq!(
        rig.app.scheduler().next_due(SENSOR_REPORT_TASK),
        Some(Millis(31_000))
    );
}

#[test]
fn light_report_rounds_stores_and_notifies() {
    let mut rig = Rig::started();
    let ids = rig.app.ids();
    assert_eq!(rig.hw.lux_reads, 0, "fixture hands over a clean read count");

    rig.hw.lux = 14.88;
    rig.run_once(10_000);

    assert_eq!(rig.hw.lux_reads, 1);
    assert_eq!(rig.app.registry().read_int(ids.light_level).unwrap(), 15);
    assert_eq!(rig.server.notifications_for(ids.light_level), vec![Value::Int(15)]);
    assert!(rig.sink.events.contains(&AppEvent::LightLevelReported {
        lux: 14.88,
        level: 15
    }));
}

#[test]
fn heap_report_carries_free_heap_and_clients() {
    let mut rig = Rig::started();
    rig.server.clients = 2;

    rig.run_once(5_000);
    assert!(rig.sink.events.contains(&AppEvent::HeapReport {
        free_heap: 40_000,
        clients: 2
    }));
    assert_eq!(light_reports(&rig), 0, "light report is not due until 10 s");
}

#[test]
fn heap_report_runs_twice_per_light_report() {
    let mut rig = Rig::started();
    for t in (10..=20_000).step_by(10) {
        rig.run_once(t);
    }
    assert_eq!(heap_reports(&rig), 4);
    assert_eq!(light_reports(&rig), 2);
}

#[test]
fn identify_requests_become_events() {
    let mut rig = Rig::started();
    rig.server.identify.push_back(4);
    rig.server.identify.push_back(1);

    rig.run_once(100);
    assert_eq!(
        rig.sink.events,
        vec![AppEvent::Identify { aid: 4 }, AppEvent::Identify { aid: 1 }]
    );
    assert!(rig.hw.calls.is_empty());
}

#[test]
fn writes_are_handled_before_the_report_in_the_same_iteration() {
    let mut rig = Rig::started();
    let ids = rig.app.ids();

    rig.server.queue(ids.lightbulb_on, Value::Bool(true));
    rig.run_once(10_000);

    let power = rig
        .sink
        .events
        .iter()
        .position(|e| matches!(e, AppEvent::LightbulbPower { .. }));
    let report = rig
        .sink
        .events
        .iter()
        .position(|e| matches!(e, AppEvent::LightLevelReported { .. }));
    assert!(power.unwrap() < report.unwrap());
}

#[test]
fn custom_periods_are_honoured() {
    let config = SystemConfig {
        sensor_report_interval_ms: 1_000,
        heap_report_interval_ms: 60_000,
        ..SystemConfig::default()
    };
    let mut rig = Rig::started_with(config);
    for t in (100..=3_000).step_by(100) {
        rig.run_once(t);
    }
    assert_eq!(light_reports(&rig), 3);
    assert_eq!(heap_reports(&rig), 0);
}

#[test]
fn reports_survive_clock_wraparound() {
    let start = u32::MAX - 2_000;
    let mut rig = Rig::booted_at(SystemConfig::default(), start);

    rig.run_once(start);
    assert_eq!(light_reports(&rig), 1);
    let due = rig.app.scheduler().next_due(SENSOR_REPORT_TASK).unwrap();
    assert_eq!(due, Millis(start).wrapping_add(10_000));

    // Just past the wrap, well before the deadline: nothing fires early.
    rig.run_once(500);
    assert_eq!(light_reports(&rig), 1);

    rig.run_once(due.0);
    assert_eq!(light_reports(&rig), 2);
}
