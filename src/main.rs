//! Switchboard Firmware — Main Entry Point
//!
//! Hexagonal architecture with a single cooperative run loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        HapServer          LogEventSink        │
//! │  (Actuator+LightSensor) (AccessoryServer)  (EventSink)         │
//! │  Esp32TimeAdapter       SystemHeap                             │
//! │  (ClockPort)            (HeapStatsPort)                        │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Registry · Handlers · Scheduler                       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use log::{error, info, warn};

use switchboard::adapters::hap::HapServer;
use switchboard::adapters::hardware::HardwareAdapter;
use switchboard::adapters::log_sink::LogEventSink;
use switchboard::adapters::time::Esp32TimeAdapter;
use switchboard::app::ports::ClockPort;
use switchboard::app::service::AppService;
use switchboard::config::SystemConfig;
use switchboard::diagnostics::{self, SystemHeap};
use switchboard::drivers::{hw_init, watchdog::Watchdog};
use switchboard::pins;
use switchboard::sensors::photocell::Photocell;

/// JSON override baked in at build time (see `build.rs`).
const CONFIG_OVERRIDE: Option<&str> = option_env!("SWITCHBOARD_CONFIG");

fn load_config() -> SystemConfig {
    let Some(json) = CONFIG_OVERRIDE.filter(|s| !s.trim().is_empty()) else {
        return SystemConfig::default();
    };
    match SystemConfig::from_json(json) {
        Ok(cfg) => {
            info!("Config: build-time override applied");
            cfg
        }
        Err(e) => {
            warn!("Config: override rejected ({}), using defaults", e);
            SystemConfig::default()
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Switchboard v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    diagnostics::install_panic_handler();

    // ── 2. Initialise hardware peripherals ────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Peripheral init failure is critical — log and halt.
        // The watchdog is not armed yet, so the device stays here.
        error!("HAL init failed: {} — halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    // ── 3. Configuration and watchdog ─────────────────────────
    let config = load_config();
    let mut watchdog = Watchdog::arm(&config);

    // ── 4. Construct adapters ─────────────────────────────────
    let photocell = Photocell::new(
        pins::PHOTOCELL_ADC_GPIO,
        config.photocell_other_resistor_ohms,
        config.photocell_on_ground,
    );
    let mut hw = HardwareAdapter::new(photocell);
    let mut server = HapServer::new();
    let mut log_sink = LogEventSink::new();
    let heap = SystemHeap::new();
    let clock = Esp32TimeAdapter::new();

    // ── 5. Construct and start the app service ────────────────
    let loop_delay_ms = config.loop_delay_ms;
    let mut app = AppService::new(config, clock.now())?;
    app.start(&mut hw, &mut server, &mut log_sink)?;

    info!("System ready. Entering run loop.");

    // ── 6. Run loop ───────────────────────────────────────────
    loop {
        app.run_once(clock.now(), &mut hw, &mut server, &heap, &mut log_sink);

        // Feed watchdog on every iteration.
        watchdog.feed();

        // Yield to FreeRTOS.
        FreeRtos::delay_ms(loop_delay_ms);
    }
}
