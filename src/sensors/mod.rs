//! Sensor drivers.
//!
//! Each driver converts a raw peripheral sample into engineering units.
//! The hardware adapter owns the drivers and exposes them through the
//! sensor ports.

pub mod photocell;
