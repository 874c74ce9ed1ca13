//! Accessory-protocol server adapter.
//!
//! Implements [`AccessoryServer`] and [`NotifyPort`].
//!
//! - **`target_os = "espidf"`** — binds to the externally linked HAP
//!   component (`hap_bridge_component`) through its `extern "C"` entry
//!   points.  Pairing, encryption, mDNS and the characteristic database all
//!   live in that component; this adapter only announces the registry,
//!   drains queued writes / identify requests and forwards notifications.
//! - **`not(target_os = "espidf")`** — an in-process loopback.  Tests queue
//!   writes and identify requests into it and read back every notification
//!   it was asked to send.
//!
//! Values cross the bridge as a `(tag, i32)` pair, see [`RawValue`].
//!
//! ## Where the bridge comes from
//!
//! `hap_bridge_component/` in this crate only declares the C ABI
//! (`include/hap_bridge.h`).  The `hap_bridge_*` symbols are provided by a
//! separate ESP-IDF component built on Espressif's `esp-homekit-sdk`
//! (`esp_hap_core`, `esp_hap_apple_profiles`).  It is added to the firmware
//! build as a second `extra_components` entry under
//! `[package.metadata.esp-idf-sys]` in `Cargo.toml`, pointing at the
//! checkout that holds it.  Without it the ESP-IDF binary fails to link
//! with undefined `hap_bridge_*` references; host builds never need it.

use log::{info, warn};

use crate::app::commands::InboundWrite;
use crate::app::model::{AccessoryRegistry, CapabilityId, CapabilityKind, Category, Value};
use crate::app::ports::{AccessoryServer, NotifyPort, SetupInfo};

// ───────────────────────────────────────────────────────────────
// Bridge wire format
// ───────────────────────────────────────────────────────────────

pub const TAG_BOOL: u8 = 0;
pub const TAG_INT: u8 = 1;

/// A value as exchanged with the bridge.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawValue {
    pub tag: u8,
    pub value: i32,
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(b) => Self {
                tag: TAG_BOOL,
                value: i32::from(b),
            },
            Value::Int(v) => Self {
                tag: TAG_INT,
                value: v,
            },
        }
    }
}

impl RawValue {
    /// `None` for an unknown tag.
    pub fn decode(self) -> Option<Value> {
        match self.tag {
            TAG_BOOL => Some(Value::Bool(self.value != 0)),
            TAG_INT => Some(Value::Int(self.value)),
            _ => None,
        }
    }
}

/// A characteristic write queued by the bridge.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawWrite {
    pub capability: u8,
    pub value: RawValue,
}

impl RawWrite {
    pub fn decode(self) -> Option<InboundWrite> {
        let value = self.value.decode()?;
        Some(InboundWrite::new(CapabilityId::from_raw(self.capability), value))
    }
}

/// Category code as understood by the bridge (HAP accessory category ids).
pub const fn category_code(category: Category) -> u8 {
    match category {
        Category::Lightbulb => 5,
        Category::Switch => 8,
        Category::Sensor => 10,
    }
}

/// Characteristic code as understood by the bridge.
pub const fn kind_code(kind: CapabilityKind) -> u8 {
    match kind {
        CapabilityKind::Switch => 0,
        CapabilityKind::Power => 1,
        CapabilityKind::Brightness => 2,
        CapabilityKind::LightLevel => 3,
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF bridge
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod ffi {
    use core::ffi::c_char;

    use super::{RawValue, RawWrite};

    unsafe extern "C" {
        pub fn hap_bridge_add_accessory(
            aid: u8,
            category: u8,
            name: *const c_char,
            manufacturer: *const c_char,
            model: *const c_char,
            serial_number: *const c_char,
            firmware_revision: *const c_char,
        ) -> i32;
        pub fn hap_bridge_add_characteristic(
            aid: u8,
            capability: u8,
            kind: u8,
            initial: RawValue,
        ) -> i32;
        pub fn hap_bridge_start(setup_code: *const c_char, setup_id: *const c_char) -> i32;
        pub fn hap_bridge_poll();
        pub fn hap_bridge_next_write(out: *mut RawWrite) -> bool;
        pub fn hap_bridge_next_identify(aid: *mut u8) -> bool;
        pub fn hap_bridge_notify(capability: u8, value: RawValue);
        pub fn hap_bridge_client_count() -> u32;
    }
}

#[cfg(target_os = "espidf")]
fn c_string(s: &str) -> std::ffi::CString {
    std::ffi::CString::new(s).unwrap_or_default()
}

// ───────────────────────────────────────────────────────────────
// HapServer
// ───────────────────────────────────────────────────────────────

/// The accessory-protocol server.
#[derive(Default)]
pub struct HapServer {
    registered: bool,
    #[cfg(not(target_os = "espidf"))]
    sim: Loopback,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct Loopback {
    writes: std::collections::VecDeque<RawWrite>,
    identify: std::collections::VecDeque<u8>,
    notifications: std::vec::Vec<(CapabilityId, Value)>,
    clients: usize,
    announced: std::vec::Vec<(u8, u8, usize)>,
    setup_code: String,
}

impl HapServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }
}

#[cfg(target_os = "espidf")]
impl HapServer {
    fn announce(&mut self, registry: &AccessoryRegistry, setup: &SetupInfo<'_>) {
        for acc in registry.accessories() {
            let name = c_string(&acc.name);
            let manufacturer = c_string(&acc.info.manufacturer);
            let model = c_string(&acc.info.model);
            let serial = c_string(&acc.info.serial_number);
            let firmware = c_string(&acc.info.firmware_revision);
            // SAFETY: all pointers are NUL-terminated and outlive the call;
            // the bridge copies what it keeps.
            let rc = unsafe {
                ffi::hap_bridge_add_accessory(
                    acc.aid,
                    category_code(acc.category),
                    name.as_ptr(),
                    manufacturer.as_ptr(),
                    model.as_ptr(),
                    serial.as_ptr(),
                    firmware.as_ptr(),
                )
            };
            if rc != 0 {
                warn!("HAP: accessory {} rejected by bridge (rc={})", acc.aid, rc);
                continue;
            }
            for &id in &acc.capabilities {
                let Ok(cap) = registry.capability(id) else {
                    continue;
                };
                // SAFETY: plain-value call into the bridge.
                let rc = unsafe {
                    ffi::hap_bridge_add_characteristic(
                        acc.aid,
                        id.raw(),
                        kind_code(cap.kind),
                        RawValue::from(cap.current_value),
                    )
                };
                if rc != 0 {
                    warn!("HAP: characteristic #{} rejected by bridge (rc={})", id.raw(), rc);
                }
            }
        }

        let code = c_string(setup.setup_code);
        let id = c_string(setup.setup_id);
        // SAFETY: both strings are NUL-terminated and outlive the call.
        let rc = unsafe { ffi::hap_bridge_start(code.as_ptr(), id.as_ptr()) };
        if rc != 0 {
            warn!("HAP: bridge start failed (rc={})", rc);
            return;
        }
        self.registered = true;
    }
}

#[cfg(not(target_os = "espidf"))]
impl HapServer {
    fn announce(&mut self, registry: &AccessoryRegistry, setup: &SetupInfo<'_>) {
        self.sim.announced = registry
            .accessories()
            .iter()
            .map(|a| (a.aid, category_code(a.category), a.capabilities.len()))
            .collect();
        self.sim.setup_code = setup.setup_code.to_string();
        self.registered = true;
    }

    /// Queue a controller write for the next [`pump`](AccessoryServer::pump).
    pub fn queue_write(&mut self, write: InboundWrite) {
        self.sim.writes.push_back(RawWrite {
            capability: write.capability.raw(),
            value: RawValue::from(write.value),
        });
    }

    /// Queue a write exactly as the bridge would deliver it.
    pub fn queue_raw_write(&mut self, write: RawWrite) {
        self.sim.writes.push_back(write);
    }

    pub fn queue_identify(&mut self, aid: u8) {
        self.sim.identify.push_back(aid);
    }

    pub fn set_clients(&mut self, clients: usize) {
        self.sim.clients = clients;
    }

    /// Every notification sent so far, oldest first.
    pub fn notifications(&self) -> &[(CapabilityId, Value)] {
        &self.sim.notifications
    }

    /// `(aid, category code, capability count)` per announced accessory.
    pub fn announced(&self) -> &[(u8, u8, usize)] {
        &self.sim.announced
    }

    pub fn setup_code(&self) -> &str {
        &self.sim.setup_code
    }
}

impl NotifyPort for HapServer {
    #[cfg(target_os = "espidf")]
    fn notify(&mut self, capability: CapabilityId, value: Value) {
        // SAFETY: plain-value call into the bridge.
        unsafe { ffi::hap_bridge_notify(capability.raw(), RawValue::from(value)) };
    }

    #[cfg(not(target_os = "espidf"))]
    fn notify(&mut self, capability: CapabilityId, value: Value) {
        self.sim.notifications.push((capability, value));
    }
}

impl AccessoryServer for HapServer {
    fn register(&mut self, registry: &AccessoryRegistry, setup: &SetupInfo<'_>) {
        self.announce(registry, setup);
        info!(
            "HAP: {} accessories announced (setup id {})",
            registry.accessories().len(),
            setup.setup_id
        );
    }

    #[cfg(target_os = "espidf")]
    fn pump(&mut self, dispatch: &mut dyn FnMut(InboundWrite)) {
        // SAFETY: the bridge is only driven from the run-loop task.
        unsafe { ffi::hap_bridge_poll() };
        let mut raw = RawWrite::default();
        // SAFETY: `raw` is a valid out-pointer for the duration of the call.
        while unsafe { ffi::hap_bridge_next_write(&mut raw) } {
            match raw.decode() {
                Some(write) => dispatch(write),
                None => warn!("HAP: write with unknown tag {} dropped", raw.value.tag),
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn pump(&mut self, dispatch: &mut dyn FnMut(InboundWrite)) {
        while let Some(raw) = self.sim.writes.pop_front() {
            match raw.decode() {
                Some(write) => dispatch(write),
                None => warn!("HAP: write with unknown tag {} dropped", raw.value.tag),
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn take_identify(&mut self) -> Option<u8> {
        let mut aid = 0u8;
        // SAFETY: `aid` is a valid out-pointer for the duration of the call.
        unsafe { ffi::hap_bridge_next_identify(&mut aid) }.then_some(aid)
    }

    #[cfg(not(target_os = "espidf"))]
    fn take_identify(&mut self) -> Option<u8> {
        self.sim.identify.pop_front()
    }

    #[cfg(target_os = "espidf")]
    fn connected_clients(&self) -> usize {
        // SAFETY: read-only query.
        unsafe { ffi::hap_bridge_client_count() as usize }
    }

    #[cfg(not(target_os = "espidf"))]
    fn connected_clients(&self) -> usize {
        self.sim.clients
    }
}
