//! Spirit counts and element locks.

use super::memory_map as mm;
use super::tables::{Element, sfx};
use super::{EffectContext, Pinned, probe};
use crate::app::EffectRequest;
use crate::engine::{CompletionHook, EffectHandle};

/// One spirit more (or less) of `element`, plus the matching element total.
///
/// The total only follows when the count actually moved, so a clamped count
/// at 1 or 50 leaves both untouched.
///
/// Targets are pinned and written instead of going through
/// `Device::range_add`: a retry after an ambiguous write would add twice.
pub(super) fn change_spirit(
    ctx: &EffectContext,
    request: &EffectRequest,
    element: Element,
    give: bool,
) -> EffectHandle {
    let spirit = element.spirit();
    let pin = Pinned::<(u8, u16)>::new();

    let action = {
        let device = ctx.device.clone();
        move || {
            let target = pin.get_or_pin(|| {
                let count = device.read8(spirit.count)?;
                let total = device.read16(mm::ELEMENT_TOTAL)?;
                let (count_target, total_target) = if give {
                    (count.saturating_add(1).min(mm::SPIRIT_MAX), total.saturating_add(1))
                } else {
                    (count.saturating_sub(1).max(mm::SPIRIT_MIN), total.saturating_sub(1).max(1))
                };
                if count_target == count {
                    Some((count, total))
                } else {
                    Some((count_target, total_target))
                }
            });
            let Some((count, total)) = target else {
                return false;
            };
            device.write8(spirit.count, count) && device.write16(mm::ELEMENT_TOTAL, total)
        }
    };

    let on_success = {
        let device = ctx.device.clone();
        let say = ctx.say();
        let requester = request.requester.clone();
        move || {
            if give {
                probe::play_sfx(device.as_ref(), sfx::MENU_OPEN);
                say.send(format!("{requester} gave you a {} spirit", spirit.name));
            } else {
                probe::play_sfx(device.as_ref(), sfx::MENU_CLOSE);
                say.send(format!("{requester} took a(n) {} spirit", spirit.name));
            }
        }
    };

    ctx.one_shot(request, || true, action, on_success)
}

/// Raise the element's first level requirement out of reach for the duration.
pub(super) fn lock_element(
    ctx: &EffectContext,
    request: &EffectRequest,
    element: Element,
) -> EffectHandle {
    let spirit = element.spirit();

    let precondition = {
        let device = ctx.device.clone();
        move || device.read16(spirit.level_req) == Some(mm::UNLOCKED_ELEMENT_LEVEL_REQ)
    };

    let action = {
        let device = ctx.device.clone();
        let say = ctx.say();
        let message = format!(
            "{} locked all {} spells for {} seconds",
            request.requester,
            spirit.name,
            request.duration_secs()
        );
        move || {
            let locked = device.write16(spirit.level_req, mm::LOCKED_ELEMENT_LEVEL_REQ);
            if locked {
                probe::play_sfx(device.as_ref(), sfx::SILENCE);
                say.send(&message);
            }
            locked
        }
    };

    let hook = {
        let device = ctx.device.clone();
        let say = ctx.say();
        CompletionHook::new(move || {
            device.write16(spirit.level_req, mm::UNLOCKED_ELEMENT_LEVEL_REQ);
            say.send(format!("{} spells have been unlocked", spirit.name));
        })
    };

    ctx.timed(request, precondition, action, hook)
}
