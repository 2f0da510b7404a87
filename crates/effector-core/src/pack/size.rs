//! Brian's scale (periodic).
//!
//! The game recomputes the scale on its own, so the target is reasserted every
//! tick. During door animations and screen transitions the original scale is
//! kept, otherwise Brian lands displaced on the other side of the door.

use super::memory_map as mm;
use super::tables::sfx;
use super::{EffectContext, probe};
use crate::app::EffectRequest;
use crate::engine::{CompletionHook, EffectHandle, TickResult};
use crate::ports::Device;

/// One tick: the scale to hold right now, written. `false` on an unreadable frame.
fn reassert_scale(device: &dyn Device, target: u16) -> bool {
    let (Some(transition), Some(animation)) = (
        device.read32(mm::TRANSITION_TIMER),
        device.read8(mm::BRIAN_ANIMATION_ID),
    ) else {
        return false;
    };
    let scale = if transition > 0 || mm::DOOR_ANIMATIONS.contains(&animation) {
        mm::BRIAN_ORIGINAL_SCALE
    } else {
        target
    };
    device.write16(mm::BRIAN_SCALE, scale)
}

pub(super) fn brian_size(ctx: &EffectContext, request: &EffectRequest, big: bool) -> EffectHandle {
    let (target, sound, wording) = if big {
        (mm::BRIAN_BIG_SCALE, sfx::STAT_UP, "big")
    } else {
        (mm::BRIAN_SMALL_SCALE, sfx::STAT_DOWN, "small")
    };

    let precondition = {
        let device = ctx.device.clone();
        move || device.read16(mm::BRIAN_SCALE).is_some_and(|scale| scale != target)
    };
    let setup = {
        let device = ctx.device.clone();
        let say = ctx.say();
        let message = format!(
            "{} made Brian {wording} for {} seconds",
            request.requester,
            request.duration_secs()
        );
        move || {
            probe::play_sfx(device.as_ref(), sound);
            say.send(&message).then_some(())
        }
    };
    let tick = {
        let device = ctx.device.clone();
        move |()| TickResult::new((), reassert_scale(device.as_ref(), target))
    };
    let hook = {
        let device = ctx.device.clone();
        let say = ctx.say();
        CompletionHook::new(move || {
            device.write16(mm::BRIAN_SCALE, mm::BRIAN_ORIGINAL_SCALE);
            say.send("Brian returned to his normal size.");
        })
    };

    ctx.periodic(request, precondition, setup, tick, true, hook)
}
