//! Camera, music, HUD, compass and cloak.

use super::memory_map as mm;
use super::tables::{BgmTrack, CloakColor};
use super::{EffectContext, probe};
use crate::app::EffectRequest;
use crate::engine::{CompletionHook, EffectHandle};
use crate::ports::Device;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Camera {
    Wide,
    Narrow,
    Flip,
}

impl Camera {
    fn fov(self) -> u32 {
        match self {
            Camera::Wide => mm::FOV_WIDE,
            Camera::Narrow => mm::FOV_NARROW,
            Camera::Flip => mm::FOV_INVERT,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Camera::Wide => "zoomed the camera out",
            Camera::Narrow => "zoomed the camera in",
            Camera::Flip => "flipped the camera",
        }
    }
}

/// Freeze a timed-hold value, announcing it once it is frozen.
fn freeze_then_say(
    ctx: &EffectContext,
    message: String,
    mut freeze: impl FnMut(&dyn Device) -> bool + Send + 'static,
) -> impl FnMut() -> bool + Send + 'static {
    let device = ctx.device.clone();
    let say = ctx.say();
    move || {
        let frozen = freeze(device.as_ref());
        if frozen {
            say.send(&message);
        }
        frozen
    }
}

pub(super) fn camera(ctx: &EffectContext, request: &EffectRequest, camera: Camera) -> EffectHandle {
    let precondition = {
        let device = ctx.device.clone();
        move || device.read32(mm::CAMERA_FOV).is_some_and(|fov| fov != camera.fov())
    };
    let action = freeze_then_say(
        ctx,
        format!(
            "{} {} for {} seconds",
            request.requester,
            camera.verb(),
            request.duration_secs()
        ),
        move |device| device.freeze32(mm::CAMERA_FOV, camera.fov()),
    );
    let hook = {
        let device = ctx.device.clone();
        let say = ctx.say();
        CompletionHook::new(move || {
            device.unfreeze(mm::CAMERA_FOV);
            device.write32(mm::CAMERA_FOV, mm::FOV_ORIGINAL);
            say.send("Brian's view returns to normal");
        })
    };
    ctx.timed(request, precondition, action, hook)
}

pub(super) fn change_music(
    ctx: &EffectContext,
    request: &EffectRequest,
    track: &'static BgmTrack,
) -> EffectHandle {
    let precondition = {
        let device = ctx.device.clone();
        move || device.read8(mm::NEXT_BGM).is_some_and(|current| current != track.index)
    };
    let action = freeze_then_say(
        ctx,
        format!(
            "{} changed the music to \"{}\" for {} seconds",
            request.requester,
            track.name,
            request.duration_secs()
        ),
        move |device| {
            device.freeze8(mm::NEXT_BGM, track.index) && device.write8(mm::BGM_SWAP_TIMER, 0xff)
        },
    );
    let hook = {
        let device = ctx.device.clone();
        let say = ctx.say();
        CompletionHook::new(move || {
            device.unfreeze(mm::NEXT_BGM);
            say.send("The background music is now unlocked");
        })
    };
    ctx.timed(request, precondition, action, hook)
}

pub(super) fn hide_hud(ctx: &EffectContext, request: &EffectRequest) -> EffectHandle {
    let precondition = {
        let device = ctx.device.clone();
        move || device.read16(mm::HUD_TIMER) == Some(0)
    };
    let action = freeze_then_say(
        ctx,
        format!(
            "{} hid the HUD for {} seconds",
            request.requester,
            request.duration_secs()
        ),
        |device| device.freeze32(mm::HUD_TIMER, mm::HUD_HIDDEN_TIMER),
    );
    let hook = {
        let device = ctx.device.clone();
        let say = ctx.say();
        CompletionHook::new(move || {
            device.unfreeze(mm::HUD_TIMER);
            say.send("The HUD reappears");
        })
    };
    ctx.timed(request, precondition, action, hook)
}

/// Offsets the compass texture onto a blank area.
pub(super) fn hide_compass(ctx: &EffectContext, request: &EffectRequest) -> EffectHandle {
    let precondition = {
        let device = ctx.device.clone();
        move || {
            !probe::is_in_battle(device.as_ref())
                && device.read32(mm::COMPASS_TEXTURE) == Some(mm::COMPASS_SHOW)
        }
    };
    let action = freeze_then_say(
        ctx,
        format!(
            "{} took the compass away for {} seconds",
            request.requester,
            request.duration_secs()
        ),
        |device| device.write32(mm::COMPASS_TEXTURE, mm::COMPASS_HIDE),
    );
    let hook = {
        let device = ctx.device.clone();
        let say = ctx.say();
        CompletionHook::new(move || {
            device.write32(mm::COMPASS_TEXTURE, mm::COMPASS_SHOW);
            say.send("The compass came back");
        })
    };
    ctx.timed(request, precondition, action, hook)
}

pub(super) fn cloak_color(
    ctx: &EffectContext,
    request: &EffectRequest,
    cloak: &'static CloakColor,
) -> EffectHandle {
    let action = {
        let device = ctx.device.clone();
        move || {
            mm::CLOAK_POLYS
                .iter()
                .zip(cloak.colors)
                .all(|(&poly, color)| probe::write_rgb(device.as_ref(), poly, color))
        }
    };
    let on_success = {
        let say = ctx.say();
        let message = format!("{} changed Brian's cloak to {}", request.requester, cloak.name);
        move || {
            say.send(message);
        }
    };
    ctx.one_shot(request, || true, action, on_success)
}
