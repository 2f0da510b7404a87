//! Shared reads and writes used by several handlers.
//!
//! Every probe reads fresh; failed reads make the probe answer "no".

use super::memory_map as mm;
use crate::ports::Device;

pub fn is_in_battle(device: &dyn Device) -> bool {
    device.read8(mm::ENEMY_COUNT).is_some_and(|count| count > 0)
}

pub fn is_boss_fight(device: &dyn Device) -> bool {
    device.read8(mm::BOSS_FLAG) == Some(0x01)
}

/// Battle is waiting for the player's input (safe to hand over an item).
pub fn is_battle_idle(device: &dyn Device) -> bool {
    device.read16(mm::BATTLE_STATE) == Some(1)
}

pub fn transition_running(device: &dyn Device) -> Option<bool> {
    device.read32(mm::TRANSITION_TIMER).map(|timer| timer > 0)
}

/// Occupied inventory slots, up to the first end marker.
/// Unreadable bytes count as occupied.
pub fn inventory_size(device: &dyn Device) -> u32 {
    let limit = mm::MAX_INVENTORY_SIZE + 10;
    (0..limit)
        .find(|&i| device.read8(mm::INVENTORY_START + i as u64) == Some(mm::INVENTORY_END))
        .unwrap_or(limit)
}

/// Address offset of enemy `index`'s record.
pub fn enemy_offset(index: u8) -> u64 {
    index as u64 * mm::ENEMY_DATA_SIZE
}

/// First enemy below its max HP, with its current and max HP.
pub fn find_damaged_enemy(device: &dyn Device) -> Option<(u8, u16, u16)> {
    let count = device.read8(mm::ENEMY_COUNT)?;
    if count == 0 || count > mm::MAX_ENEMIES {
        return None;
    }
    for index in 0..count {
        let current = device.read16(mm::ENEMY_CURRENT_HEALTH + enemy_offset(index))?;
        let max = device.read16(mm::ENEMY_MAX_HEALTH + enemy_offset(index))?;
        if current < max {
            return Some((index, current, max));
        }
    }
    None
}

/// Queue a sound effect into the game's ring of eight slots.
///
/// Slot 5 is skipped: it gets a harmless filler and the sound goes one slot later.
pub fn play_sfx(device: &dyn Device, id: u8) -> bool {
    if id == 0 {
        return false;
    }
    let Some(mut next) = device.read32(mm::NEXT_SFX) else {
        return false;
    };
    if next as usize >= mm::SFX_QUEUE.len() {
        return false;
    }
    if next == mm::SFX_CURSED_SLOT {
        if !device.write32(mm::SFX_QUEUE[next as usize], mm::SFX_CURSED_FILLER) {
            return false;
        }
        next += 1;
    }
    device.write32(mm::NEXT_SFX, (next + 1) % mm::SFX_QUEUE.len() as u32)
        && device.write8(mm::SFX_QUEUE[next as usize], id)
}

/// Write `0xRRGGBB` into three consecutive bytes.
pub fn write_rgb(device: &dyn Device, address: u64, color: u32) -> bool {
    device.write8(address, (color >> 16) as u8)
        && device.write8(address + 1, (color >> 8) as u8)
        && device.write8(address + 2, color as u8)
}
