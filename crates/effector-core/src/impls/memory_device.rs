//! InMemoryDevice - 開発・テスト用の Device
//!
//! # 実装詳細
//! - 疎なバイト配列（HashMap<Address, u8>）、マルチバイト値は big-endian
//! - freeze テーブル：`tick()` のたびに凍結値を書き戻す（外部のフレーム相当）
//! - 故障注入：`set_fault` で次の N 回の操作を失敗させる
//!
//! `poke` / `peek` は故障注入と書き込みカウントを通らない（テストの準備と検証用）。

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::ports::{Address, Device, Width};

/// How injected faults behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultMode {
    /// Write/freeze is not applied and reports `false`.
    Fail,

    /// Write/freeze is applied but still reports `false`.
    Ambiguous,

    /// Reads return `None`.
    Unreadable,
}

#[derive(Debug, Default)]
struct Memory {
    bytes: HashMap<Address, u8>,
    frozen: HashMap<Address, (Width, u32)>,
    writes: u64,
    fault: Option<(FaultMode, u32)>,
}

impl Memory {
    fn load(&self, address: Address, width: Width) -> u32 {
        (0..width.bytes() as u64).fold(0u32, |acc, offset| {
            let byte = self.bytes.get(&(address + offset)).copied().unwrap_or(0);
            (acc << 8) | byte as u32
        })
    }

    fn store(&mut self, address: Address, width: Width, value: u32) {
        let value = width.truncate(value);
        let n = width.bytes();
        for i in 0..n {
            let shift = 8 * (n - 1 - i);
            self.bytes.insert(address + i as u64, (value >> shift) as u8);
        }
    }

    /// Consume one fault of `mode`'s kind, if armed.
    fn take_fault(&mut self, reading: bool) -> Option<FaultMode> {
        let (mode, remaining) = self.fault?;
        if (mode == FaultMode::Unreadable) != reading {
            return None;
        }
        self.fault = (remaining > 1).then_some((mode, remaining - 1));
        Some(mode)
    }

    /// Apply a mutating operation through the fault injector.
    fn mutate(&mut self, op: impl FnOnce(&mut Self)) -> bool {
        match self.take_fault(false) {
            Some(FaultMode::Fail) => false,
            Some(FaultMode::Ambiguous) => {
                op(self);
                self.writes += 1;
                false
            }
            _ => {
                op(self);
                self.writes += 1;
                true
            }
        }
    }
}

/// In-process memory standing in for the target's address space.
#[derive(Debug, Default)]
pub struct InMemoryDevice {
    memory: Mutex<Memory>,
}

impl InMemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn memory(&self) -> MutexGuard<'_, Memory> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set memory directly (no faults, not counted, frozen cells are overwritten too).
    pub fn poke(&self, address: Address, width: Width, value: u32) {
        self.memory().store(address, width, value);
    }

    pub fn peek(&self, address: Address, width: Width) -> u32 {
        self.memory().load(address, width)
    }

    pub fn peek8(&self, address: Address) -> u8 {
        self.peek(address, Width::W8) as u8
    }

    pub fn peek16(&self, address: Address) -> u16 {
        self.peek(address, Width::W16) as u16
    }

    /// Re-assert every frozen value, like one external frame.
    pub fn tick(&self) {
        let mut memory = self.memory();
        let frozen: Vec<(Address, Width, u32)> = memory
            .frozen
            .iter()
            .map(|(address, (width, value))| (*address, *width, *value))
            .collect();
        for (address, width, value) in frozen {
            memory.store(address, width, value);
        }
    }

    pub fn is_frozen(&self, address: Address) -> bool {
        self.memory().frozen.contains_key(&address)
    }

    pub fn frozen_value(&self, address: Address) -> Option<u32> {
        self.memory().frozen.get(&address).map(|(_, value)| *value)
    }

    /// Successful (or ambiguous) writes and freezes so far.
    pub fn write_count(&self) -> u64 {
        self.memory().writes
    }

    /// Make the next `count` operations of the mode's kind misbehave.
    pub fn set_fault(&self, mode: FaultMode, count: u32) {
        self.memory().fault = (count > 0).then_some((mode, count));
    }

    pub fn clear_fault(&self) {
        self.memory().fault = None;
    }
}

impl Device for InMemoryDevice {
    fn read(&self, address: Address, width: Width) -> Option<u32> {
        let mut memory = self.memory();
        match memory.take_fault(true) {
            Some(FaultMode::Unreadable) => None,
            _ => Some(memory.load(address, width)),
        }
    }

    fn write(&self, address: Address, width: Width, value: u32) -> bool {
        self.memory()
            .mutate(|memory| memory.store(address, width, value))
    }

    fn freeze(&self, address: Address, width: Width, value: u32) -> bool {
        self.memory().mutate(|memory| {
            memory.frozen.insert(address, (width, width.truncate(value)));
            memory.store(address, width, value);
        })
    }

    fn unfreeze(&self, address: Address) -> bool {
        self.memory().frozen.remove(&address);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multibyte_values_are_big_endian() {
        let device = InMemoryDevice::new();
        assert!(device.write16(0x8007_b2bc, 0x01f4));
        assert_eq!(device.peek8(0x8007_b2bc), 0x01);
        assert_eq!(device.peek8(0x8007_b2bd), 0xf4);
        assert_eq!(device.read16(0x8007_b2bc), Some(500));
        assert_eq!(device.read32(0x8007_b2bc), Some(0x01f4_0000));
    }

    #[test]
    fn unwritten_memory_reads_zero() {
        let device = InMemoryDevice::new();
        assert_eq!(device.read8(0x1234), Some(0));
    }

    #[test]
    fn freeze_reasserts_on_tick_until_unfrozen() {
        let device = InMemoryDevice::new();
        assert!(device.freeze8(0x10, 3));
        device.poke(0x10, Width::W8, 9);
        device.tick();
        assert_eq!(device.peek8(0x10), 3);
        assert!(device.is_frozen(0x10));

        assert!(device.unfreeze(0x10));
        assert!(device.unfreeze(0x10));
        device.poke(0x10, Width::W8, 9);
        device.tick();
        assert_eq!(device.peek8(0x10), 9);
    }

    #[test]
    fn failed_write_is_not_applied() {
        let device = InMemoryDevice::new();
        device.set_fault(FaultMode::Fail, 1);
        assert!(!device.write8(0x20, 7));
        assert_eq!(device.peek8(0x20), 0);
        assert!(device.write8(0x20, 7));
        assert_eq!(device.peek8(0x20), 7);
        assert_eq!(device.write_count(), 1);
    }

    #[test]
    fn ambiguous_write_lands_anyway() {
        let device = InMemoryDevice::new();
        device.set_fault(FaultMode::Ambiguous, 2);
        assert!(!device.write8(0x20, 7));
        assert!(!device.freeze8(0x21, 1));
        assert_eq!(device.peek8(0x20), 7);
        assert!(device.is_frozen(0x21));
        assert!(device.write8(0x22, 1));
    }

    #[test]
    fn unreadable_fault_only_hits_reads() {
        let device = InMemoryDevice::new();
        device.poke(0x30, Width::W8, 5);
        device.set_fault(FaultMode::Unreadable, 1);
        assert!(device.write8(0x31, 1));
        assert_eq!(device.read8(0x30), None);
        assert_eq!(device.read8(0x30), Some(5));
    }

    #[test]
    fn range_add_goes_through_read_and_write() {
        let device = InMemoryDevice::new();
        device.poke(0x40, Width::W16, 498);
        assert!(device.range_add16(0x40, 5, 0, 500, false));
        assert_eq!(device.peek16(0x40), 500);

        device.set_fault(FaultMode::Unreadable, 1);
        assert!(!device.range_add16(0x40, -5, 0, 500, false));
        assert_eq!(device.peek16(0x40), 500);
    }
}
