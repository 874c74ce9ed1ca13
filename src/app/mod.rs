//! Application core — pure domain logic, zero I/O.
//!
//! This module holds the accessory state model, the command handlers that
//! map inbound writes to pin actuation, and the run-loop service that ties
//! them to the periodic scheduler.  All interaction with hardware and the
//! accessory-protocol server happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod accessories;
pub mod commands;
pub mod events;
pub mod handlers;
pub mod model;
pub mod ports;
pub mod service;
