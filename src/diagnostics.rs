//! Runtime diagnostics.
//!
//! The free-heap figure is read on demand for the periodic heap report.
//! A panic hook logs the panic reason before the default handler aborts,
//! so the last words of a crashing device reach the serial console.

use crate::app::ports::HeapStatsPort;

/// Free heap the host build reports, roughly an idle ESP32 with Wi-Fi up.
#[cfg(not(target_os = "espidf"))]
pub const SIM_FREE_HEAP: u32 = 307_200;

/// [`HeapStatsPort`] backed by the system allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHeap;

impl SystemHeap {
    pub fn new() -> Self {
        Self
    }
}

impl HeapStatsPort for SystemHeap {
    #[cfg(target_os = "espidf")]
    fn free_heap(&self) -> u32 {
        // SAFETY: reads an allocator counter; callable from any task.
        unsafe { esp_idf_svc::sys::esp_get_free_heap_size() }
    }

    #[cfg(not(target_os = "espidf"))]
    fn free_heap(&self) -> u32 {
        SIM_FREE_HEAP
    }
}

// ───────────────────────────────────────────────────────────────
// Panic hook
// ───────────────────────────────────────────────────────────────

/// Install a panic hook that logs the panic reason.
///
/// Call once during init, after the logger is up.
pub fn install_panic_handler() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };

        match info.location() {
            Some(loc) => log::error!("PANIC: {} at {}:{}", reason, loc.file(), loc.line()),
            None => log::error!("PANIC: {}", reason),
        }
        default_hook(info);
    }));
}
