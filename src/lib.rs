//! Switchboard firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod pins;
pub mod scheduler;

// The hardware-facing modules compile on every target; their ESP-IDF
// bodies are guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;
pub mod sensors;
