//! Unified error types for the Switchboard firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! run loop's error handling uniform.  All variants are `Copy` so they can
//! be logged and dropped without allocation.

use core::fmt;

use crate::app::model::{CapabilityId, ValueType};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No capability (or no handler) is registered under this id.
    UnknownCapability(CapabilityId),
    /// A value's tag does not match the capability's declared kind.
    TypeMismatch { expected: ValueType, found: ValueType },
    /// The fixed-capacity accessory registry is full.
    RegistryFull,
    /// The fixed-capacity scheduler has no free task slot.
    SchedulerFull,
    /// Configuration is invalid or could not be parsed.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCapability(id) => write!(f, "unknown capability #{}", id.index()),
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected:?}, found {found:?}")
            }
            Self::RegistryFull => write!(f, "accessory registry full"),
            Self::SchedulerFull => write!(f, "scheduler full"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
