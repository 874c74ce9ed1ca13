//! Application service — the run-loop controller.
//!
//! [`AppService`] owns the accessory registry, the handler table and the
//! scheduler.  It exposes a hardware-agnostic API; all I/O flows through
//! port traits injected at call sites, so the whole service is testable
//! with mock adapters.
//!
//! ```text
//!  AccessoryServer ──pump──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                            │        AppService        │
//!     ActuatorPort ◀──────── │ Registry · Handlers      │ ──▶ NotifyPort
//!  LightSensorPort ────────▶ │ Scheduler                │
//!                            └──────────────────────────┘
//! ```
//!
//! One [`run_once`](AppService::run_once) is one loop iteration: pump the
//! protocol server (inbound writes are handled inline), serve identify
//! requests, then evaluate the scheduler.

use heapless::Vec;
use log::{info, warn};

use crate::config::SystemConfig;
use crate::error::{Error, Result};
use crate::scheduler::{Millis, Scheduler};

use super::accessories::{self, CapabilityIds};
use super::commands::InboundWrite;
use super::events::AppEvent;
use super::handlers::{HandlerTable, SensorReporter, SwitchWiring};
use super::model::AccessoryRegistry;
use super::ports::{
    AccessoryServer, ActuatorPort, EventSink, HeapStatsPort, LightSensorPort, SchedulerDelegate,
    SetupInfo, TaskAction,
};

/// Label of the ambient-light report task.
pub const SENSOR_REPORT_TASK: &str = "sensor-report";
/// Label of the heap / client-count diagnostic task.
pub const HEAP_REPORT_TASK: &str = "heap-report";

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: SystemConfig,
    registry: AccessoryRegistry,
    handlers: HandlerTable,
    reporter: SensorReporter,
    ids: CapabilityIds,
    switch_wirings: Vec<SwitchWiring, 2>,
    scheduler: Scheduler,
    writes_applied: u64,
    writes_rejected: u64,
}

impl AppService {
    /// Build the registry, handlers and scheduler.
    ///
    /// Both periodic tasks are first due at `boot`, so they fire on the
    /// first loop iteration.  Does **not** touch hardware — call
    /// [`start`](Self::start) next.
    pub fn new(config: SystemConfig, boot: Millis) -> Result<Self> {
        config.validate()?;
        let board = accessories::build(&config)?;

        let mut scheduler = Scheduler::new();
        scheduler.register(
            SENSOR_REPORT_TASK,
            TaskAction::ReportLightLevel,
            config.sensor_report_interval_ms,
            boot,
        )?;
        scheduler.register(
            HEAP_REPORT_TASK,
            TaskAction::ReportHeap,
            config.heap_report_interval_ms,
            boot,
        )?;

        Ok(Self {
            config,
            registry: board.registry,
            handlers: board.handlers,
            reporter: board.reporter,
            ids: board.ids,
            switch_wirings: board.switch_wirings,
            scheduler,
            writes_applied: 0,
            writes_rejected: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive boot pin states, register with the protocol server and push
    /// the initial lightbulb state to controllers.
    pub fn start(
        &mut self,
        hw: &mut impl ActuatorPort,
        server: &mut impl AccessoryServer,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        for wiring in &self.switch_wirings {
            wiring.drive(false, hw);
        }
        if let Some(pin) = self.registry.capability(self.ids.lightbulb_on)?.pin {
            hw.set_pwm(pin, 0);
        }

        server.register(
            &self.registry,
            &SetupInfo {
                setup_code: &self.config.setup_code,
                setup_id: &self.config.setup_id,
            },
        );

        let brightness = self.ids.lightbulb_brightness;
        let on = self.ids.lightbulb_on;
        server.notify(brightness, self.registry.read(brightness)?);
        server.notify(on, self.registry.read(on)?);

        let accessories = self.registry.accessories().len();
        sink.emit(&AppEvent::Started { accessories });
        info!("AppService started with {} accessories", accessories);
        Ok(())
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// One run-loop iteration at time `now`.
    ///
    /// The `hw` parameter satisfies **both** [`ActuatorPort`] and
    /// [`LightSensorPort`] — this avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn run_once(
        &mut self,
        now: Millis,
        hw: &mut (impl ActuatorPort + LightSensorPort),
        server: &mut impl AccessoryServer,
        heap: &impl HeapStatsPort,
        sink: &mut impl EventSink,
    ) {
        // 1. Protocol I/O; writes are dispatched inline.
        server.pump(&mut |write| {
            let _ = self.handle_write(write, &mut *hw, &mut *sink);
        });

        // 2. Identify requests
        while let Some(aid) = server.take_identify() {
            sink.emit(&AppEvent::Identify { aid });
        }

        // 3. Periodic tasks
        self.poll_scheduler(now, hw, server, heap, sink);
    }

    // ── Command handling ──────────────────────────────────────

    /// Route one inbound write to its handler.
    ///
    /// Unknown capabilities and mistyped values are logged and dropped;
    /// nothing is actuated for them.
    pub fn handle_write(
        &mut self,
        write: InboundWrite,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let result = match self.handlers.get_mut(write.capability) {
            Some(handler) => handler.handle(write.value, &mut self.registry, hw, sink),
            None => Err(Error::UnknownCapability(write.capability)),
        };

        match result {
            Ok(()) => self.writes_applied += 1,
            Err(e) => {
                self.writes_rejected += 1;
                warn!("Dropped write to capability #{}: {}", write.capability.index(), e);
                sink.emit(&AppEvent::WriteRejected {
                    capability: write.capability.index(),
                });
            }
        }
        result
    }

    /// Evaluate the scheduler.  Returns the number of tasks that fired.
    pub fn poll_scheduler(
        &mut self,
        now: Millis,
        sensor: &mut impl LightSensorPort,
        server: &mut impl AccessoryServer,
        heap: &impl HeapStatsPort,
        sink: &mut impl EventSink,
    ) -> usize {
        let mut runner = TaskRunner {
            registry: &mut self.registry,
            reporter: &self.reporter,
            sensor,
            server,
            heap,
            sink,
        };
        self.scheduler.tick(now, &mut runner)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn registry(&self) -> &AccessoryRegistry {
        &self.registry
    }

    pub fn ids(&self) -> CapabilityIds {
        self.ids
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Writes that reached a handler and were applied.
    pub fn writes_applied(&self) -> u64 {
        self.writes_applied
    }

    /// Writes dropped for an unknown capability or a wrong value type.
    pub fn writes_rejected(&self) -> u64 {
        self.writes_rejected
    }
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate
// ───────────────────────────────────────────────────────────────

/// Borrows what the task bodies need for the duration of one tick.
struct TaskRunner<'a, L, S, P, E> {
    registry: &'a mut AccessoryRegistry,
    reporter: &'a SensorReporter,
    sensor: &'a mut L,
    server: &'a mut S,
    heap: &'a P,
    sink: &'a mut E,
}

impl<L, S, P, E> SchedulerDelegate for TaskRunner<'_, L, S, P, E>
where
    L: LightSensorPort,
    S: AccessoryServer,
    P: HeapStatsPort,
    E: EventSink,
{
    fn on_task_fired(&mut self, label: &str, action: TaskAction, _now: Millis) {
        match action {
            TaskAction::ReportLightLevel => {
                let result = self.reporter.report(
                    &mut *self.registry,
                    &mut *self.sensor,
                    &mut *self.server,
                    &mut *self.sink,
                );
                if let Err(e) = result {
                    warn!("Task '{}' failed: {}", label, e);
                }
            }
            TaskAction::ReportHeap => {
                self.sink.emit(&AppEvent::HeapReport {
                    free_heap: self.heap.free_heap(),
                    clients: self.server.connected_clients(),
                });
            }
        }
    }
}
