//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (pins, light sensor, protocol server, clock, event
//! sinks) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them at call sites,
//! so the domain core never touches hardware directly.
//!
//! Every port is called from the single run-loop thread.  None of them may
//! block.

pub use embedded_hal::digital::PinState;

use crate::pins::Pin;
use crate::scheduler::Millis;

use super::commands::InboundWrite;
use super::model::{AccessoryRegistry, CapabilityId, Value};

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: single pin writes, fire-and-forget.
pub trait ActuatorPort {
    /// Drive a digital output to `level`.
    fn set_digital(&mut self, pin: Pin, level: PinState);

    /// Set the PWM duty of an output (0 = fully off).
    fn set_pwm(&mut self, pin: Pin, duty: u16);
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Ambient light sensor.  The analog-to-lux conversion lives behind it.
pub trait LightSensorPort {
    /// Current illuminance in lux.
    fn read_lux(&mut self) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Protocol ports (accessory server ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Outbound: push a capability's current value to subscribed controllers.
pub trait NotifyPort {
    fn notify(&mut self, capability: CapabilityId, value: Value);
}

/// Pairing data handed to the protocol server at registration.
#[derive(Debug, Clone, Copy)]
pub struct SetupInfo<'a> {
    pub setup_code: &'a str,
    pub setup_id: &'a str,
}

/// The external accessory-protocol server.
///
/// Pairing, encryption, transport and the characteristic registry all
/// live on the far side of this trait.
pub trait AccessoryServer: NotifyPort {
    /// Announce every accessory in the registry and start serving.
    fn register(&mut self, registry: &AccessoryRegistry, setup: &SetupInfo<'_>);

    /// Process queued network work.  Inbound value-writes are delivered
    /// synchronously through `dispatch` before this call returns.
    fn pump(&mut self, dispatch: &mut dyn FnMut(InboundWrite));

    /// Pending accessory identify request, if any (accessory id).
    fn take_identify(&mut self) -> Option<u8>;

    /// Number of currently connected controllers.
    fn connected_clients(&self) -> usize;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.  Wraps at `u32::MAX`.
pub trait ClockPort {
    fn now(&self) -> Millis;
}

// ───────────────────────────────────────────────────────────────
// Heap statistics port
// ───────────────────────────────────────────────────────────────

/// Source of the free-heap figure for the periodic diagnostic line.
pub trait HeapStatsPort {
    fn free_heap(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from task bodies)
// ───────────────────────────────────────────────────────────────

/// Work a scheduled task performs when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// Read the light sensor and notify the light-level capability.
    ReportLightLevel,
    /// Log free heap and connected-client count.
    ReportHeap,
}

/// Callback trait that the scheduler invokes when a task is due.
///
/// The [`Scheduler`](crate::scheduler::Scheduler) only tracks deadlines;
/// it knows nothing about sensors, notifications or logs.
pub trait SchedulerDelegate {
    /// Run the task body.  Must not block.
    fn on_task_fired(&mut self, label: &str, action: TaskAction, now: Millis);
}
