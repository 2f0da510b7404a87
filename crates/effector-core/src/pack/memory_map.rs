//! Quest 64 (US) memory map.

use crate::ports::Address;

pub const CURRENT_HP: Address = 0x8007_ba84;
pub const MAX_HP: Address = 0x8007_ba86;
pub const CURRENT_MP: Address = 0x8007_ba88;
pub const MAX_MP: Address = 0x8007_ba8a;
pub const AGILITY: Address = 0x8007_ba8c;
pub const DEFENSE: Address = 0x8007_ba8e;

pub const BRIAN_ANIMATION_ID: Address = 0x8007_bb1f;
pub const BRIAN_SCALE: Address = 0x8007_baf0;
pub const BRIAN_STATUS: Address = 0x8007_bb38;
pub const MOVE_SIZE_MULTIPLIER: Address = 0x8007_bbc8;
pub const ELEMENT_TOTAL: Address = 0x8007_bbbc;

pub const CAMERA_FOV: Address = 0x8008_6ec8;
pub const HUD_TIMER: Address = 0x8004_d2bc;
pub const COMPASS_TEXTURE: Address = 0x803a_8ea4;

pub const ITEM_QUEUE: Address = 0x8007_ba73;
pub const INVENTORY_START: Address = 0x8008_cf78;

pub const ENEMY_COUNT: Address = 0x8007_c993;
pub const ENEMY_CURRENT_HEALTH: Address = 0x8007_c9a2;
pub const ENEMY_MAX_HEALTH: Address = 0x8007_c9a4;
/// Stride between two enemy records.
pub const ENEMY_DATA_SIZE: Address = 0x128;
pub const MAX_ENEMIES: u8 = 6;

/// Read as 16 bits it is the battle state (1 = waiting for input);
/// read as 8 bits it is the boss flag.
pub const BATTLE_STATE: Address = 0x8008_c592;
pub const BOSS_FLAG: Address = 0x8008_c592;
pub const ENCOUNTER_RATE: Address = 0x8008_c578;
pub const TRANSITION_TIMER: Address = 0x8007_b2ec;

pub const NEXT_BGM: Address = 0x8008_fcc1;
pub const BGM_SWAP_TIMER: Address = 0x8008_fcc3;

pub const NEXT_SFX: Address = 0x8005_3970;
/// The eight slots of the sound effect ring. `NEXT_SFX` indexes the one
/// that plays on the next frame.
pub const SFX_QUEUE: [Address; 8] = [
    0x8005_390f,
    0x8005_3913,
    0x8005_3917,
    0x8005_391b,
    0x8005_391f,
    0x8005_3920,
    0x8005_3927,
    0x8005_392b,
];
/// Writing most ids into this slot kills the sound driver.
pub const SFX_CURSED_SLOT: u32 = 5;
pub const SFX_CURSED_FILLER: u32 = 0x0000_0021;

pub const SPELL_ID: Address = 0x8007_bbd6;
pub const SPELL_TIMER: Address = 0x8007_bbd8;

/// Red byte of each cloak polygon, left to right; green and blue follow.
pub const CLOAK_POLYS: [Address; 6] = [
    0x8020_bd0c,
    0x8020_bc5c,
    0x8020_bbac,
    0x8020_bdbc,
    0x8020_be6c,
    0x8020_bf1c,
];

pub const BRIAN_ORIGINAL_SCALE: u16 = 0x3d8f;
pub const BRIAN_BIG_SCALE: u16 = 0x3e4f;
pub const BRIAN_SMALL_SCALE: u16 = 0x3c8f;
/// Door enter/exit animations; the original scale must hold through them.
pub const DOOR_ANIMATIONS: [u8; 3] = [0x14, 0x15, 0x1a];

pub const FOV_ORIGINAL: u32 = 0x4218_0000;
pub const FOV_WIDE: u32 = 0x42d0_0000;
pub const FOV_NARROW: u32 = 0x4150_0000;
pub const FOV_INVERT: u32 = 0x4427_0000;

pub const COMPASS_HIDE: u32 = 0x8039_00b0;
pub const COMPASS_SHOW: u32 = 0x8039_9cb0;

pub const MOVEMENT_MULTIPLIER_BIG: u32 = 0x4000_0000;
pub const MOVEMENT_MULTIPLIER_NORMAL: u32 = 0x3f80_0000;
pub const MOVEMENT_MULTIPLIER_SMALL: u32 = 0x3f00_0000;

pub const ENCOUNTER_RATE_MAX: u16 = 0x7fff;
pub const ENCOUNTER_RATE_MIN: u16 = 0x0000;

pub const HUD_HIDDEN_TIMER: u32 = 0x20;
pub const ITEM_QUEUE_EMPTY: u8 = 0xff;
pub const INVENTORY_END: u8 = 0xff;
pub const MAX_INVENTORY_SIZE: u32 = 100;

pub const STAT_MAX: u16 = 512;
pub const STAT_MIN: u16 = 1;
pub const SPIRIT_MIN: u8 = 1;
pub const SPIRIT_MAX: u8 = 50;

pub const UNLOCKED_ELEMENT_LEVEL_REQ: u16 = 0x01;
pub const LOCKED_ELEMENT_LEVEL_REQ: u16 = 0x63;

pub const STATUS_ROUNDS: u8 = 3;
