//! Preset slot registry
//!
//! Cameras store pan/tilt/zoom positions in numbered slots. The registry
//! tracks which slots are in use for one device and hands out the lowest
//! free slot on allocation, so freed slots are reused before the range
//! grows. Slot contents live on the camera; the registry only manages the
//! numbering.

use crate::error::{CameraError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Preset slot range supported by the device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceClass {
    /// Slots 0–127, the floor every VISCA device supports
    #[default]
    Standard,
    /// Slots 0–254, offered by extended-memory devices
    Extended,
}

impl DeviceClass {
    /// Highest valid slot number
    pub fn max_slot(&self) -> u8 {
        match self {
            DeviceClass::Standard => 127,
            DeviceClass::Extended => 254,
        }
    }

    /// Total number of slots
    pub fn capacity(&self) -> u16 {
        self.max_slot() as u16 + 1
    }
}

/// Tracks allocated preset slots for one camera
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PresetRegistry {
    class: DeviceClass,
    used: BTreeSet<u8>,
}

impl PresetRegistry {
    pub fn new(class: DeviceClass) -> Self {
        Self {
            class,
            used: BTreeSet::new(),
        }
    }

    /// Rebuild a registry from persisted slot numbers
    ///
    /// # Errors
    ///
    /// [`CameraError::InvalidArgument`] when a slot exceeds the device range.
    pub fn with_slots(class: DeviceClass, slots: impl IntoIterator<Item = u8>) -> Result<Self> {
        let mut registry = Self::new(class);
        for slot in slots {
            registry.validate(slot)?;
            registry.used.insert(slot);
        }
        Ok(registry)
    }

    pub fn class(&self) -> DeviceClass {
        self.class
    }

    /// Allocate the lowest free slot
    ///
    /// # Errors
    ///
    /// [`CameraError::SlotExhausted`] when every slot is in use; nothing is
    /// allocated in that case.
    pub fn allocate(&mut self) -> Result<u8> {
        let slot = (0..=self.class.max_slot())
            .find(|s| !self.used.contains(s))
            .ok_or(CameraError::SlotExhausted(self.class.capacity()))?;
        self.used.insert(slot);
        Ok(slot)
    }

    /// Return a slot to the free pool
    ///
    /// # Errors
    ///
    /// [`CameraError::NotFound`] when the slot is not allocated;
    /// [`CameraError::InvalidArgument`] when it exceeds the device range.
    pub fn free(&mut self, slot: u8) -> Result<()> {
        self.validate(slot)?;
        if !self.used.remove(&slot) {
            return Err(CameraError::not_found(format!(
                "preset slot {slot} is not allocated"
            )));
        }
        Ok(())
    }

    /// True when the slot is currently allocated
    pub fn is_allocated(&self, slot: u8) -> bool {
        self.used.contains(&slot)
    }

    /// Allocated slots in ascending order, for persistence
    pub fn slots(&self) -> Vec<u8> {
        self.used.iter().copied().collect()
    }

    /// Slot must exist on this device class
    pub fn validate(&self, slot: u8) -> Result<()> {
        if slot > self.class.max_slot() {
            return Err(CameraError::invalid(format!(
                "preset slot {slot} exceeds device maximum {}",
                self.class.max_slot()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocates_lowest_free_slot() {
        let mut reg = PresetRegistry::new(DeviceClass::Standard);
        assert_eq!(reg.allocate().unwrap(), 0);
        assert_eq!(reg.allocate().unwrap(), 1);
        assert_eq!(reg.allocate().unwrap(), 2);
    }

    #[test]
    fn test_freed_slot_is_reused_first() {
        let mut reg = PresetRegistry::new(DeviceClass::Standard);
        for _ in 0..5 {
            reg.allocate().unwrap();
        }
        reg.free(2).unwrap();
        assert_eq!(reg.allocate().unwrap(), 2);
        assert_eq!(reg.allocate().unwrap(), 5);
    }

    #[test]
    fn test_exhaustion_reports_capacity() {
        let mut reg = PresetRegistry::new(DeviceClass::Standard);
        for expected in 0..=127u8 {
            assert_eq!(reg.allocate().unwrap(), expected);
        }
        let err = reg.allocate().unwrap_err();
        assert!(matches!(err, CameraError::SlotExhausted(128)));
    }

    #[test]
    fn test_extended_class_range() {
        let mut reg = PresetRegistry::new(DeviceClass::Extended);
        for _ in 0..255u16 {
            reg.allocate().unwrap();
        }
        assert!(matches!(
            reg.allocate().unwrap_err(),
            CameraError::SlotExhausted(255)
        ));
    }

    #[test]
    fn test_free_unallocated_slot_rejected() {
        let mut reg = PresetRegistry::new(DeviceClass::Standard);
        assert!(matches!(
            reg.free(3).unwrap_err(),
            CameraError::NotFound(_)
        ));
    }

    #[test]
    fn test_out_of_range_slot_rejected() {
        let mut reg = PresetRegistry::new(DeviceClass::Standard);
        assert!(matches!(
            reg.free(200).unwrap_err(),
            CameraError::InvalidArgument(_)
        ));
    }

    #[test]
    fn test_rebuild_from_persisted_slots() {
        let mut reg = PresetRegistry::with_slots(DeviceClass::Standard, [0, 1, 4]).unwrap();
        assert!(reg.is_allocated(4));
        assert_eq!(reg.allocate().unwrap(), 2);
        assert_eq!(reg.slots(), vec![0, 1, 2, 4]);

        assert!(PresetRegistry::with_slots(DeviceClass::Standard, [130]).is_err());
    }
}
