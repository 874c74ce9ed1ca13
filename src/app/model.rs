//! Accessory state model.
//!
//! Mutable records mirroring each exposed capability's current value.
//! The [`AccessoryRegistry`] is constructed once at startup, owned by the
//! [`AppService`](super::service::AppService) and handed by reference to
//! the handlers and the scheduler delegate.  It is only ever touched from
//! the run-loop thread, so there is no locking.

use heapless::{String, Vec};

use crate::error::{Error, Result};
use crate::pins::Pin;

/// Maximum number of capabilities across all accessories.
pub const MAX_CAPABILITIES: usize = 8;
/// Maximum number of accessories announced to the protocol server.
pub const MAX_ACCESSORIES: usize = 4;
/// Maximum number of capabilities grouped under one accessory.
pub const MAX_CAPABILITIES_PER_ACCESSORY: usize = 4;

pub type Name = String<32>;

// ───────────────────────────────────────────────────────────────
// Values
// ───────────────────────────────────────────────────────────────

/// A tagged characteristic value as delivered by the protocol layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i32),
}

/// The tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Bool,
    Int,
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(b) => Some(b),
            Self::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match *self {
            Self::Int(i) => Some(i),
            Self::Bool(_) => None,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Capabilities
// ───────────────────────────────────────────────────────────────

/// What a capability represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    /// Wall switch on/off.
    Switch,
    /// Lightbulb power on/off.
    Power,
    /// Lightbulb brightness, integer percent.
    Brightness,
    /// Ambient light level, integer lux.
    LightLevel,
}

impl CapabilityKind {
    /// The value tag every write to this kind must carry.
    pub const fn value_type(self) -> ValueType {
        match self {
            Self::Switch | Self::Power => ValueType::Bool,
            Self::Brightness | Self::LightLevel => ValueType::Int,
        }
    }
}

/// Index of a capability inside the [`AccessoryRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CapabilityId(u8);

impl CapabilityId {
    /// Id as carried on the protocol bridge.  Not checked against any
    /// registry; lookups of an unregistered id fail with
    /// [`Error::UnknownCapability`].
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One exposed accessory trait.
#[derive(Debug, Clone)]
pub struct Capability {
    pub kind: CapabilityKind,
    pub name: Name,
    pub current_value: Value,
    /// Output pin driven by this capability; sensors have none.
    pub pin: Option<Pin>,
}

// ───────────────────────────────────────────────────────────────
// Accessories
// ───────────────────────────────────────────────────────────────

/// Category advertised to controllers (drives the icon in the Home app).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Switch,
    Sensor,
    Lightbulb,
}

/// Accessory information service contents.
#[derive(Debug, Clone)]
pub struct AccessoryInfo {
    pub manufacturer: Name,
    pub model: Name,
    pub serial_number: Name,
    pub firmware_revision: Name,
}

/// A registration unit for the protocol layer.
#[derive(Debug, Clone)]
pub struct Accessory {
    /// Protocol accessory id, 1-based.
    pub aid: u8,
    pub name: Name,
    pub category: Category,
    pub info: AccessoryInfo,
    pub capabilities: Vec<CapabilityId, MAX_CAPABILITIES_PER_ACCESSORY>,
}

// ───────────────────────────────────────────────────────────────
// Registry
// ───────────────────────────────────────────────────────────────

/// Owns every capability and accessory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct AccessoryRegistry {
    capabilities: Vec<Capability, MAX_CAPABILITIES>,
    accessories: Vec<Accessory, MAX_ACCESSORIES>,
}

impl AccessoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a capability with its initial value.
    pub fn add_capability(
        &mut self,
        kind: CapabilityKind,
        name: &str,
        initial: Value,
        pin: Option<Pin>,
    ) -> Result<CapabilityId> {
        check_type(kind, initial)?;
        let id = CapabilityId(self.capabilities.len() as u8);
        self.capabilities
            .push(Capability {
                kind,
                name: name_from(name),
                current_value: initial,
                pin,
            })
            .map_err(|_| Error::RegistryFull)?;
        Ok(id)
    }

    /// Group already-added capabilities under a new accessory.
    /// The accessory id is assigned in registration order, starting at 1.
    pub fn add_accessory(
        &mut self,
        name: &str,
        category: Category,
        info: AccessoryInfo,
        capabilities: &[CapabilityId],
    ) -> Result<u8> {
        let mut caps = Vec::new();
        for &id in capabilities {
            self.capability(id)?;
            caps.push(id).map_err(|_| Error::RegistryFull)?;
        }
        let aid = self.accessories.len() as u8 + 1;
        self.accessories
            .push(Accessory {
                aid,
                name: name_from(name),
                category,
                info,
                capabilities: caps,
            })
            .map_err(|_| Error::RegistryFull)?;
        Ok(aid)
    }

    pub fn capability(&self, id: CapabilityId) -> Result<&Capability> {
        self.capabilities
            .get(id.index())
            .ok_or(Error::UnknownCapability(id))
    }

    /// Current value of a capability.
    pub fn read(&self, id: CapabilityId) -> Result<Value> {
        Ok(self.capability(id)?.current_value)
    }

    /// Replace the current value.  The only check is the type tag.
    pub fn write(&mut self, id: CapabilityId, value: Value) -> Result<()> {
        let cap = self
            .capabilities
            .get_mut(id.index())
            .ok_or(Error::UnknownCapability(id))?;
        check_type(cap.kind, value)?;
        cap.current_value = value;
        Ok(())
    }

    pub fn read_bool(&self, id: CapabilityId) -> Result<bool> {
        let value = self.read(id)?;
        value.as_bool().ok_or(Error::TypeMismatch {
            expected: ValueType::Bool,
            found: value.value_type(),
        })
    }

    pub fn read_int(&self, id: CapabilityId) -> Result<i32> {
        let value = self.read(id)?;
        value.as_int().ok_or(Error::TypeMismatch {
            expected: ValueType::Int,
            found: value.value_type(),
        })
    }

    pub fn accessories(&self) -> &[Accessory] {
        &self.accessories
    }

    pub fn accessory(&self, aid: u8) -> Option<&Accessory> {
        self.accessories.iter().find(|a| a.aid == aid)
    }

    /// Accessory that groups `id`, if any.
    pub fn owner(&self, id: CapabilityId) -> Option<&Accessory> {
        self.accessories
            .iter()
            .find(|a| a.capabilities.contains(&id))
    }

    /// Iterate `(id, capability)` pairs in registration order.
    pub fn capabilities(&self) -> impl Iterator<Item = (CapabilityId, &Capability)> {
        self.capabilities
            .iter()
            .enumerate()
            .map(|(i, c)| (CapabilityId(i as u8), c))
    }
}

fn check_type(kind: CapabilityKind, value: Value) -> Result<()> {
    let expected = kind.value_type();
    let found = value.value_type();
    if expected == found {
        Ok(())
    } else {
        Err(Error::TypeMismatch { expected, found })
    }
}

pub(crate) fn name_from(s: &str) -> Name {
    let mut out = Name::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> AccessoryInfo {
        AccessoryInfo {
            manufacturer: name_from("Acme"),
            model: name_from("M1"),
            serial_number: name_from("0001"),
            firmware_revision: name_from("1.0"),
        }
    }

    #[test]
    fn write_replaces_value_unconditionally() {
        let mut reg = AccessoryRegistry::new();
        let bright = reg
            .add_capability(CapabilityKind::Brightness, "Brightness", Value::Int(50), Some(13))
            .unwrap();

        reg.write(bright, Value::Int(250)).unwrap();
        assert_eq!(reg.read_int(bright).unwrap(), 250, "no range validation");
        reg.write(bright, Value::Int(-3)).unwrap();
        assert_eq!(reg.read(bright).unwrap(), Value::Int(-3));
    }

    #[test]
    fn write_rejects_wrong_tag() {
        let mut reg = AccessoryRegistry::new();
        let on = reg
            .add_capability(CapabilityKind::Power, "On", Value::Bool(false), Some(13))
            .unwrap();

        let err = reg.write(on, Value::Int(1)).unwrap_err();
        assert_eq!(
            err,
            Error::TypeMismatch {
                expected: ValueType::Bool,
                found: ValueType::Int
            }
        );
        assert_eq!(reg.read_bool(on).unwrap(), false, "value untouched on error");
    }

    #[test]
    fn initial_value_must_match_kind() {
        let mut reg = AccessoryRegistry::new();
        assert!(
            reg.add_capability(CapabilityKind::LightLevel, "Light", Value::Bool(true), None)
                .is_err()
        );
    }

    #[test]
    fn unknown_capability_is_reported() {
        let reg = AccessoryRegistry::new();
        let ghost = CapabilityId(7);
        assert_eq!(reg.read(ghost), Err(Error::UnknownCapability(ghost)));
    }

    #[test]
    fn accessories_get_sequential_aids() {
        let mut reg = AccessoryRegistry::new();
        let a = reg
            .add_capability(CapabilityKind::Switch, "A", Value::Bool(false), Some(5))
            .unwrap();
        let b = reg
            .add_capability(CapabilityKind::Switch, "B", Value::Bool(false), Some(4))
            .unwrap();

        assert_eq!(reg.add_accessory("Left", Category::Switch, info(), &[a]), Ok(1));
        assert_eq!(reg.add_accessory("Right", Category::Switch, info(), &[b]), Ok(2));
        assert_eq!(reg.accessory(2).unwrap().name.as_str(), "Right");
        assert!(reg.accessory(3).is_none());
    }

    #[test]
    fn owner_finds_the_grouping_accessory() {
        let mut reg = AccessoryRegistry::new();
        let a = reg
            .add_capability(CapabilityKind::Switch, "Switch", Value::Bool(false), Some(5))
            .unwrap();
        let b = reg
            .add_capability(CapabilityKind::Switch, "Switch", Value::Bool(false), Some(4))
            .unwrap();
        let loose = reg
            .add_capability(CapabilityKind::LightLevel, "Light", Value::Int(0), None)
            .unwrap();
        reg.add_accessory("Left", Category::Switch, info(), &[a]).unwrap();
        reg.add_accessory("Right", Category::Switch, info(), &[b]).unwrap();

        assert_eq!(reg.owner(a).unwrap().name.as_str(), "Left");
        assert_eq!(reg.owner(b).unwrap().name.as_str(), "Right");
        assert!(reg.owner(loose).is_none());
    }

    #[test]
    fn registry_capacity_is_bounded() {
        let mut reg = AccessoryRegistry::new();
        for _ in 0..MAX_CAPABILITIES {
            reg.add_capability(CapabilityKind::Switch, "s", Value::Bool(false), None)
                .unwrap();
        }
        assert_eq!(
            reg.add_capability(CapabilityKind::Switch, "s", Value::Bool(false), None),
            Err(Error::RegistryFull)
        );
    }

    #[test]
    fn long_names_are_truncated() {
        let n = name_from("a very long accessory name that overflows");
        assert_eq!(n.len(), 32);
    }
}
