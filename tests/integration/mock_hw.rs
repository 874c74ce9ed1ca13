//! Mock adapters for integration tests.
//!
//! Records every actuator call, notification and event so tests can assert
//! on the full history without touching real GPIO/PWM registers.

use std::collections::VecDeque;

use switchboard::app::commands::InboundWrite;
use switchboard::app::events::AppEvent;
use switchboard::app::model::{AccessoryRegistry, CapabilityId, Value};
use switchboard::app::ports::{
    AccessoryServer, ActuatorPort, EventSink, HeapStatsPort, LightSensorPort, NotifyPort,
    PinState, SetupInfo,
};
use switchboard::app::service::AppService;
use switchboard::config::SystemConfig;
use switchboard::pins::{self, Pin};
use switchboard::scheduler::Millis;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    Digital { pin: Pin, level: PinState },
    Pwm { pin: Pin, duty: u16 },
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    pub lux: f32,
    pub lux_reads: usize,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            lux: 0.0,
            lux_reads: 0,
        }
    }

    pub fn pwm_writes(&self) -> Vec<u16> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::Pwm { pin, duty } if *pin == pins::LIGHTBULB_GPIO => Some(*duty),
                _ => None,
            })
            .collect()
    }

    pub fn digital_writes(&self) -> Vec<(Pin, PinState)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::Digital { pin, level } => Some((*pin, *level)),
                ActuatorCall::Pwm { .. } => None,
            })
            .collect()
    }

    /// Forget every recorded call and sensor read.
    pub fn clear(&mut self) {
        self.calls.clear();
        self.lux_reads = 0;
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorPort for MockHardware {
    fn set_digital(&mut self, pin: Pin, level: PinState) {
        self.calls.push(ActuatorCall::Digital { pin, level });
    }

    fn set_pwm(&mut self, pin: Pin, duty: u16) {
        self.calls.push(ActuatorCall::Pwm { pin, duty });
    }
}

impl LightSensorPort for MockHardware {
    fn read_lux(&mut self) -> f32 {
        self.lux_reads += 1;
        self.lux
    }
}

// ── MockServer ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockServer {
    pub writes: VecDeque<InboundWrite>,
    pub identify: VecDeque<u8>,
    pub notifications: Vec<(CapabilityId, Value)>,
    pub registered_accessories: Option<usize>,
    pub setup_code: String,
    pub clients: usize,
}

#[allow(dead_code)]
impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&mut self, capability: CapabilityId, value: Value) {
        self.writes.push_back(InboundWrite::new(capability, value));
    }

    pub fn notifications_for(&self, capability: CapabilityId) -> Vec<Value> {
        self.notifications
            .iter()
            .filter(|(id, _)| *id == capability)
            .map(|(_, v)| *v)
            .collect()
    }
}

impl NotifyPort for MockServer {
    fn notify(&mut self, capability: CapabilityId, value: Value) {
        self.notifications.push((capability, value));
    }
}

impl AccessoryServer for MockServer {
    fn register(&mut self, registry: &AccessoryRegistry, setup: &SetupInfo<'_>) {
        self.registered_accessories = Some(registry.accessories().len());
        self.setup_code = setup.setup_code.to_string();
    }

    fn pump(&mut self, dispatch: &mut dyn FnMut(InboundWrite)) {
        while let Some(write) = self.writes.pop_front() {
            dispatch(write);
        }
    }

    fn take_identify(&mut self) -> Option<u8> {
        self.identify.pop_front()
    }

    fn connected_clients(&self) -> usize {
        self.clients
    }
}

// ── MockHeap ──────────────────────────────────────────────────

pub struct MockHeap(pub u32);

impl HeapStatsPort for MockHeap {
    fn free_heap(&self) -> u32 {
        self.0
    }
}

// ── LogSink ───────────────────────────────────────────────────

#[derive(Default)]
pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Fixture ───────────────────────────────────────────────────

pub struct Rig {
    pub app: AppService,
    pub hw: MockHardware,
    pub server: MockServer,
    pub heap: MockHeap,
    pub sink: LogSink,
}

#[allow(dead_code)]
impl Rig {
    /// Service booted and started at t = 0, with the first loop iteration
    /// (both reports) already run and every recorded call cleared.  The
    /// next report is due at t = 5 000.
    pub fn started() -> Self {
        Self::started_with(SystemConfig::default())
    }

    pub fn started_with(config: SystemConfig) -> Self {
        let mut rig = Self::booted(config);
        rig.app
            .start(&mut rig.hw, &mut rig.server, &mut rig.sink)
            .unwrap();
        rig.run_once(0);
        rig.hw.clear();
        rig.server.notifications.clear();
        rig.sink.events.clear();
        rig
    }

    /// Constructed at t = 0 but not started.
    pub fn booted(config: SystemConfig) -> Self {
        Self::booted_at(config, 0)
    }

    pub fn booted_at(config: SystemConfig, boot_ms: u32) -> Self {
        Self {
            app: AppService::new(config, Millis(boot_ms)).unwrap(),
            hw: MockHardware::new(),
            server: MockServer::new(),
            heap: MockHeap(40_000),
            sink: LogSink::new(),
        }
    }

    pub fn run_once(&mut self, now_ms: u32) {
        self.app.run_once(
            Millis(now_ms),
            &mut self.hw,
            &mut self.server,
            &self.heap,
            &mut self.sink,
        );
    }

    /// Deliver one controller write through the server pump.
    pub fn write(&mut self, capability: CapabilityId, value: Value, now_ms: u32) {
        self.server.queue(capability, value);
        self.run_once(now_ms);
    }
}
