//! Inbound commands to the application service.
//!
//! The accessory server delivers one [`InboundWrite`] per characteristic
//! write a controller performs.  The
//! [`AppService`](super::service::AppService) routes it to the handler
//! registered for that capability.

use super::model::{CapabilityId, Value};

/// A controller wrote `value` to `capability`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundWrite {
    pub capability: CapabilityId,
    pub value: Value,
}

impl InboundWrite {
    pub const fn new(capability: CapabilityId, value: Value) -> Self {
        Self { capability, value }
    }
}
