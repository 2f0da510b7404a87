//! Items, enemies, status effects, encounter rate and movement range.

use super::memory_map as mm;
use super::tables::{Item, StatusType, sfx};
use super::{EffectContext, Pinned, probe};
use crate::app::EffectRequest;
use crate::engine::{CompletionHook, EffectHandle};
use crate::ports::Device;

/// Safe moment to hand over an item: outside battle or waiting for input,
/// alive, empty item queue, room in the inventory, no screen transition.
fn can_receive_item(device: &dyn Device) -> bool {
    (!probe::is_in_battle(device) || probe::is_battle_idle(device))
        && device.read16(mm::CURRENT_HP).is_some_and(|hp| hp > 0)
        && device.read8(mm::ITEM_QUEUE) == Some(mm::ITEM_QUEUE_EMPTY)
        && probe::inventory_size(device) < mm::MAX_INVENTORY_SIZE
        && probe::transition_running(device) == Some(false)
}

pub(super) fn give_item(
    ctx: &EffectContext,
    request: &EffectRequest,
    item: &'static Item,
) -> EffectHandle {
    let precondition = {
        let device = ctx.device.clone();
        move || can_receive_item(device.as_ref())
    };
    let action = {
        let device = ctx.device.clone();
        move || device.write8(mm::ITEM_QUEUE, item.value)
    };
    let on_success = {
        let say = ctx.say();
        let message = format!("{} gave a {}", request.requester, item.name);
        move || {
            say.send(message);
        }
    };
    ctx.one_shot(request, precondition, action, on_success)
}

/// Heal the first damaged enemy: to full, or by a quarter of its max in a boss fight.
pub(super) fn heal_enemy(ctx: &EffectContext, request: &EffectRequest) -> EffectHandle {
    let pin = Pinned::<(u8, u16)>::new();

    let precondition = {
        let device = ctx.device.clone();
        let pin = pin.clone();
        move || {
            pin.is_pinned()
                || (probe::is_in_battle(device.as_ref())
                    && probe::find_damaged_enemy(device.as_ref()).is_some())
        }
    };
    let action = {
        let device = ctx.device.clone();
        move || {
            let target = pin.get_or_pin(|| {
                let (index, current, max) = probe::find_damaged_enemy(device.as_ref())?;
                let healed = if probe::is_boss_fight(device.as_ref()) {
                    current.saturating_add(max >> 2).min(max)
                } else {
                    max
                };
                Some((index, healed))
            });
            target.is_some_and(|(index, healed)| {
                device.write16(mm::ENEMY_CURRENT_HEALTH + probe::enemy_offset(index), healed)
            })
        }
    };
    let on_success = {
        let say = ctx.say();
        let message = format!("{} healed an injured enemy", request.requester);
        move || {
            say.send(message);
        }
    };
    ctx.one_shot(request, precondition, action, on_success)
}

/// Set a status bit on Brian for `STATUS_ROUNDS` rounds.
///
/// The bitfield decides: a status that is already set is not applied again.
pub(super) fn apply_status(
    ctx: &EffectContext,
    request: &EffectRequest,
    status: &'static StatusType,
) -> EffectHandle {
    let pin = Pinned::<u16>::new();

    let precondition = {
        let device = ctx.device.clone();
        let pin = pin.clone();
        move || {
            pin.is_pinned()
                || (probe::is_in_battle(device.as_ref())
                    && !(status.blocked_in_boss_fight && probe::is_boss_fight(device.as_ref()))
                    && device
                        .read16(mm::BRIAN_STATUS)
                        .is_some_and(|bits| bits & status.bit == 0))
        }
    };
    let action = {
        let device = ctx.device.clone();
        move || {
            let Some(bits) = pin.get_or_pin(|| {
                device.read16(mm::BRIAN_STATUS).map(|bits| bits | status.bit)
            }) else {
                return false;
            };
            device.write16(mm::BRIAN_STATUS, bits)
                && device.write8(status.duration, mm::STATUS_ROUNDS)
                && status
                    .icon
                    .is_none_or(|(address, value)| device.write8(address, value))
        }
    };
    let on_success = {
        let device = ctx.device.clone();
        let say = ctx.say();
        let message = format!(
            "{} applied the {} effect for {} turns",
            request.requester,
            status.name,
            mm::STATUS_ROUNDS
        );
        move || {
            probe::play_sfx(device.as_ref(), status.sfx);
            say.send(message);
        }
    };
    ctx.one_shot(request, precondition, action, on_success)
}

pub(super) fn encounter_rate(
    ctx: &EffectContext,
    request: &EffectRequest,
    more_likely: bool,
) -> EffectHandle {
    let precondition = {
        let device = ctx.device.clone();
        move || !probe::is_in_battle(device.as_ref())
    };
    let action = {
        let device = ctx.device.clone();
        let say = ctx.say();
        let (rate, wording) = if more_likely {
            (mm::ENCOUNTER_RATE_MAX, "more")
        } else {
            (mm::ENCOUNTER_RATE_MIN, "less")
        };
        let message = format!(
            "{} made random battles much {wording} likely for {} seconds",
            request.requester,
            request.duration_secs()
        );
        move || {
            let frozen = device.freeze16(mm::ENCOUNTER_RATE, rate);
            if frozen {
                say.send(&message);
            }
            frozen
        }
    };
    let hook = {
        let device = ctx.device.clone();
        let say = ctx.say();
        CompletionHook::new(move || {
            device.unfreeze(mm::ENCOUNTER_RATE);
            say.send("The encounter rate returns to normal");
        })
    };
    ctx.timed(request, precondition, action, hook)
}

/// Grow or shrink the in-battle movement range.
pub(super) fn move_multiplier(
    ctx: &EffectContext,
    request: &EffectRequest,
    increase: bool,
) -> EffectHandle {
    let (target, sound, wording) = if increase {
        (mm::MOVEMENT_MULTIPLIER_BIG, sfx::STAT_UP, "increased")
    } else {
        (mm::MOVEMENT_MULTIPLIER_SMALL, sfx::STAT_DOWN, "decreased")
    };

    let precondition = {
        let device = ctx.device.clone();
        move || {
            probe::is_in_battle(device.as_ref())
                && device
                    .read32(mm::MOVE_SIZE_MULTIPLIER)
                    .is_some_and(|multiplier| multiplier != target)
        }
    };
    let action = {
        let device = ctx.device.clone();
        let say = ctx.say();
        let message = format!(
            "{} {wording} Brian's movement range for {} seconds",
            request.requester,
            request.duration_secs()
        );
        move || {
            let frozen = device.freeze32(mm::MOVE_SIZE_MULTIPLIER, target);
            if frozen {
                probe::play_sfx(device.as_ref(), sound);
                say.send(&message);
            }
            frozen
        }
    };
    let hook = {
        let device = ctx.device.clone();
        CompletionHook::new(move || {
            device.unfreeze(mm::MOVE_SIZE_MULTIPLIER);
            device.write32(mm::MOVE_SIZE_MULTIPLIER, mm::MOVEMENT_MULTIPLIER_NORMAL);
        })
    };
    ctx.timed(request, precondition, action, hook)
}
