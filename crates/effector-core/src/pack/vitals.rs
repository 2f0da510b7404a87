//! HP / MP and agility / defense adjustments (one-shot, pinned target).

use super::memory_map as mm;
use super::tables::sfx;
use super::{EffectContext, Pinned, probe};
use crate::app::EffectRequest;
use crate::engine::EffectHandle;
use crate::ports::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Vital {
    Hp,
    Mp,
}

impl Vital {
    fn current(self) -> Address {
        match self {
            Vital::Hp => mm::CURRENT_HP,
            Vital::Mp => mm::CURRENT_MP,
        }
    }

    fn max(self) -> Address {
        match self {
            Vital::Hp => mm::MAX_HP,
            Vital::Mp => mm::MAX_MP,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Vital::Hp => "HP",
            Vital::Mp => "MP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Stat {
    Agility,
    Defense,
}

impl Stat {
    fn address(self) -> Address {
        match self {
            Stat::Agility => mm::AGILITY,
            Stat::Defense => mm::DEFENSE,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Stat::Agility => "agility",
            Stat::Defense => "defense",
        }
    }
}

/// `tenths` tenths of max, added or taken from the current value.
///
/// An increase is clamped to max. A decrease never goes below 0: while the
/// current value is smaller than the change the effect keeps waiting.
///
/// Pins `(target, change)` on the first successful read, so a retry after an
/// ambiguous write sets the same value again.
pub(super) fn adjust_vital(
    ctx: &EffectContext,
    request: &EffectRequest,
    vital: Vital,
    tenths: u8,
    increase: bool,
) -> EffectHandle {
    let pin = Pinned::<(u16, u16)>::new();

    let precondition = {
        let device = ctx.device.clone();
        let pin = pin.clone();
        move || {
            pin.is_pinned()
                || match (device.read16(vital.current()), device.read16(vital.max())) {
                    (Some(current), Some(max)) if increase => current < max,
                    (Some(current), Some(max)) => current > 0 && current >= change_of(max, tenths),
                    _ => false,
                }
        }
    };

    let action = {
        let device = ctx.device.clone();
        let pin = pin.clone();
        move || {
            let target = pin.get_or_pin(|| {
                let current = device.read16(vital.current())?;
                let max = device.read16(vital.max())?;
                let change = change_of(max, tenths);
                let target = if increase {
                    current.saturating_add(change).min(max)
                } else {
                    current.checked_sub(change)?
                };
                Some((target, current.abs_diff(target)))
            });
            let Some((target, _)) = target else {
                return false;
            };
            device.write16(vital.current(), target)
        }
    };

    let on_success = {
        let device = ctx.device.clone();
        let say = ctx.say();
        let requester = request.requester.clone();
        move || {
            probe::play_sfx(
                device.as_ref(),
                if increase { sfx::HEALING } else { sfx::DAMAGE_CONTACT },
            );
            let change = pin.get().map_or(0, |(_, change)| change);
            let verb = if increase { "gave" } else { "took" };
            say.send(format!("{requester} {verb} {change} {}", vital.label()));
        }
    };

    ctx.one_shot(request, precondition, action, on_success)
}

fn change_of(max: u16, tenths: u8) -> u16 {
    (tenths as u32 * max as u32 / 10) as u16
}

/// Agility / defense by `amount`, clamped into `[STAT_MIN, STAT_MAX]`.
pub(super) fn adjust_stat(
    ctx: &EffectContext,
    request: &EffectRequest,
    stat: Stat,
    amount: u8,
    increase: bool,
) -> EffectHandle {
    let pin = Pinned::<u16>::new();

    let precondition = {
        let device = ctx.device.clone();
        let pin = pin.clone();
        move || {
            pin.is_pinned()
                || device.read16(stat.address()).is_some_and(|value| {
                    if increase {
                        value < mm::STAT_MAX
                    } else {
                        value > mm::STAT_MIN
                    }
                })
        }
    };

    let action = {
        let device = ctx.device.clone();
        move || {
            let target = pin.get_or_pin(|| {
                let value = device.read16(stat.address())?;
                let delta = if increase {
                    amount as i64
                } else {
                    -(amount as i64)
                };
                let next = (value as i64 + delta).clamp(mm::STAT_MIN as i64, mm::STAT_MAX as i64);
                Some(next as u16)
            });
            target.is_some_and(|target| device.write16(stat.address(), target))
        }
    };

    let on_success = {
        let device = ctx.device.clone();
        let say = ctx.say();
        let requester = request.requester.clone();
        move || {
            probe::play_sfx(
                device.as_ref(),
                if increase { sfx::STAT_UP } else { sfx::STAT_DOWN },
            );
            let verb = if increase { "increased" } else { "decreased" };
            say.send(format!("{requester} {verb} {} by {amount}", stat.label()));
        }
    };

    ctx.one_shot(request, precondition, action, on_success)
}
