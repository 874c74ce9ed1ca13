//! Run-loop watchdog.
//!
//! Subscribes the run-loop task to the ESP-IDF task watchdog (TWDT) with
//! the timeout from [`SystemConfig::watchdog_timeout_ms`]. A loop that
//! stops calling [`Watchdog::feed`] for that long panics and reboots.
//!
//! On host there is no TWDT; the same type only counts feeds so the
//! timeout wiring can be checked in tests.
//!
//! [`SystemConfig::watchdog_timeout_ms`]: crate::config::SystemConfig

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::{info, warn};

use crate::config::SystemConfig;

pub struct Watchdog {
    timeout_ms: u32,
    armed: bool,
    feeds: u64,
}

impl Watchdog {
    /// Arm the watchdog for the run loop described by `config`.
    pub fn arm(config: &SystemConfig) -> Self {
        let timeout_ms = config.watchdog_timeout_ms;
        let armed = subscribe(timeout_ms);
        if armed {
            info!(
                "Watchdog: armed, {} ms timeout ({} loop delays)",
                timeout_ms,
                timeout_ms / config.loop_delay_ms.max(1)
            );
        } else {
            warn!("Watchdog: not armed, run loop is unsupervised");
        }
        Self {
            timeout_ms,
            armed,
            feeds: 0,
        }
    }

    /// Call once per run-loop iteration.
    pub fn feed(&mut self) {
        if !self.armed {
            return;
        }
        reset();
        self.feeds += 1;
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Feeds since the watchdog was armed.
    pub fn feeds(&self) -> u64 {
        self.feeds
    }
}

#[cfg(target_os = "espidf")]
fn subscribe(timeout_ms: u32) -> bool {
    let cfg = esp_task_wdt_config_t {
        timeout_ms,
        idle_core_mask: 0,
        trigger_panic: true,
    };
    // SAFETY: called once from main before the loop; the config outlives the call.
    let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
    if ret != ESP_OK as i32 {
        warn!("Watchdog: reconfigure returned {}", ret);
    }
    // SAFETY: a null handle subscribes the calling task.
    let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
    if ret != ESP_OK as i32 {
        warn!("Watchdog: subscribe failed ({})", ret);
    }
    ret == ESP_OK as i32
}

#[cfg(not(target_os = "espidf"))]
fn subscribe(_timeout_ms: u32) -> bool {
    true
}

#[cfg(target_os = "espidf")]
fn reset() {
    // SAFETY: only reached after the calling task subscribed.
    unsafe {
        esp_task_wdt_reset();
    }
}

#[cfg(not(target_os = "espidf"))]
fn reset() {}
