//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them — log to serial, count them in tests.

use super::model::Name;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The run loop is about to start; carries the number of accessories.
    Started { accessories: usize },

    /// A wall switch was written (applied even when unchanged).
    /// `accessory` names the switch, e.g. "Left Switch".
    SwitchChanged { accessory: Name, on: bool },

    /// The lightbulb power characteristic was written.
    /// `duty` is `None` when the write was absorbed (ON while already ON).
    LightbulbPower { on: bool, duty: Option<u16> },

    /// The lightbulb brightness was written and applied to the pin.
    BrightnessChanged { brightness: i32, duty: u16 },

    /// The light sensor was sampled and the value pushed to controllers.
    LightLevelReported { lux: f32, level: i32 },

    /// Periodic heap / connection diagnostic.
    HeapReport { free_heap: u32, clients: usize },

    /// A controller asked an accessory to identify itself.
    Identify { aid: u8 },

    /// An inbound write was dropped (unknown capability or wrong type).
    WriteRejected { capability: usize },
}
