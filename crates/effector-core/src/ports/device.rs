//! Device port - 外部プロセスのメモリへの窓口
//!
//! Device の呼び出しは best-effort です。
//! - read が `None` を返すのは一時的な失敗（致命的ではない）
//! - write が `false` を返しても、実際には書けている可能性がある
//!
//! したがって Action は retry 安全（clamped set など）に書く必要があります。

/// External address.
pub type Address = u64;

/// Access width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    W8,
    W16,
    W32,
}

impl Width {
    pub fn bytes(self) -> usize {
        match self {
            Width::W8 => 1,
            Width::W16 => 2,
            Width::W32 => 4,
        }
    }

    /// Largest value representable at this width.
    pub fn max_value(self) -> u32 {
        match self {
            Width::W8 => u8::MAX as u32,
            Width::W16 => u16::MAX as u32,
            Width::W32 => u32::MAX,
        }
    }

    pub fn truncate(self, value: u32) -> u32 {
        value & self.max_value()
    }
}

/// Device Memory Interface.
///
/// Only the four required methods touch the device; everything else is
/// derived from them.
pub trait Device: Send + Sync {
    fn read(&self, address: Address, width: Width) -> Option<u32>;

    fn write(&self, address: Address, width: Width, value: u32) -> bool;

    /// Rewrite `value` to `address` on every external tick until `unfreeze`.
    fn freeze(&self, address: Address, width: Width, value: u32) -> bool;

    /// Stop a prior freeze. Idempotent when nothing is frozen there.
    fn unfreeze(&self, address: Address) -> bool;

    fn read8(&self, address: Address) -> Option<u8> {
        self.read(address, Width::W8).map(|v| v as u8)
    }

    fn read16(&self, address: Address) -> Option<u16> {
        self.read(address, Width::W16).map(|v| v as u16)
    }

    fn read32(&self, address: Address) -> Option<u32> {
        self.read(address, Width::W32)
    }

    fn write8(&self, address: Address, value: u8) -> bool {
        self.write(address, Width::W8, value as u32)
    }

    fn write16(&self, address: Address, value: u16) -> bool {
        self.write(address, Width::W16, value as u32)
    }

    fn write32(&self, address: Address, value: u32) -> bool {
        self.write(address, Width::W32, value)
    }

    fn freeze8(&self, address: Address, value: u8) -> bool {
        self.freeze(address, Width::W8, value as u32)
    }

    fn freeze16(&self, address: Address, value: u16) -> bool {
        self.freeze(address, Width::W16, value as u32)
    }

    fn freeze32(&self, address: Address, value: u32) -> bool {
        self.freeze(address, Width::W32, value)
    }

    /// Read, adjust by `delta`, clamp (or wrap) into `[min, max]`, write back.
    ///
    /// Not idempotent: repeating it after an ambiguous write adjusts twice.
    /// Effects that retry compute their target once (`pack::Pinned`) and write it.
    fn range_add(
        &self,
        address: Address,
        width: Width,
        delta: i64,
        min: u32,
        max: u32,
        wrap: bool,
    ) -> bool {
        let Some(current) = self.read(address, width) else {
            return false;
        };
        let next = adjust_in_range(current, delta, min, max, wrap);
        self.write(address, width, width.truncate(next))
    }

    fn range_add8(&self, address: Address, delta: i64, min: u8, max: u8, wrap: bool) -> bool {
        self.range_add(address, Width::W8, delta, min as u32, max as u32, wrap)
    }

    fn range_add16(&self, address: Address, delta: i64, min: u16, max: u16, wrap: bool) -> bool {
        self.range_add(address, Width::W16, delta, min as u32, max as u32, wrap)
    }
}

/// `current + delta` clamped into `[min, max]`, or wrapped modulo the range.
pub fn adjust_in_range(current: u32, delta: i64, min: u32, max: u32, wrap: bool) -> u32 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    let raw = current as i64 + delta;
    if wrap {
        let span = hi as i64 - lo as i64 + 1;
        (lo as i64 + (raw - lo as i64).rem_euclid(span)) as u32
    } else {
        raw.clamp(lo as i64, hi as i64) as u32
    }
}
