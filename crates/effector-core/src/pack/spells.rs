//! Spell cost and random spell effects (periodic with tick state).
//!
//! Each tick function gets the state the previous tick returned. The state
//! lives in the running instance only, so two overlapping effects never see
//! each other's MP history.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::memory_map as mm;
use super::tables::{Element, SPELLS, Spell};
use super::{EffectContext, SpellPool};
use crate::app::EffectRequest;
use crate::engine::{CompletionHook, EffectHandle, TickResult};
use crate::ports::Device;

/// Doubles MP spending: whatever was spent since `last_mp` is taken once more.
pub fn double_spending(device: &dyn Device, last_mp: u16) -> TickResult<u16> {
    let Some(current) = device.read16(mm::CURRENT_MP) else {
        return TickResult::new(last_mp, false);
    };
    let spent = last_mp.saturating_sub(current);
    if spent > 0 && current >= spent {
        let charged = current - spent;
        TickResult::new(charged, device.write16(mm::CURRENT_MP, charged))
    } else {
        TickResult::new(current, true)
    }
}

/// Refunds MP spending: a drop below `last_mp` is written back.
pub fn refund_spending(device: &dyn Device, last_mp: u16) -> TickResult<u16> {
    let Some(current) = device.read16(mm::CURRENT_MP) else {
        return TickResult::new(last_mp, false);
    };
    if current < last_mp {
        TickResult::new(last_mp, device.write16(mm::CURRENT_MP, last_mp))
    } else {
        TickResult::new(current, true)
    }
}

/// Tick state of `randomspell`.
#[derive(Debug)]
pub struct RandomSpellState {
    pub previous_timer: u16,
    pub rng: StdRng,
}

impl RandomSpellState {
    pub fn new(rng: StdRng) -> Self {
        Self {
            previous_timer: 0,
            rng,
        }
    }
}

/// A spell Brian can cast right now, from `pool`.
pub fn choose_spell(
    device: &dyn Device,
    pool: SpellPool,
    rng: &mut StdRng,
) -> Option<&'static Spell> {
    let counts = Element::ALL.map(|element| device.read8(element.spirit().count).unwrap_or(0));
    let level = |element: Element| {
        Element::ALL
            .iter()
            .position(|e| *e == element)
            .map_or(0, |i| counts[i])
    };
    let available: Vec<&'static Spell> = SPELLS
        .iter()
        .filter(|spell| pool.admits(spell.element) && spell.level_req <= level(spell.element))
        .collect();
    available.choose(rng).copied()
}

/// Locks a random spell in when a cast starts (timer 0 -> running) and
/// releases it when the cast ends (running -> 0).
pub fn randomize_cast(
    device: &dyn Device,
    pool: SpellPool,
    mut state: RandomSpellState,
) -> TickResult<RandomSpellState> {
    let Some(timer) = device.read16(mm::SPELL_TIMER) else {
        return TickResult::new(state, false);
    };
    let ok = if state.previous_timer > 0 && timer == 0 {
        device.unfreeze(mm::SPELL_ID)
    } else if state.previous_timer == 0 && timer > 0 {
        choose_spell(device, pool, &mut state.rng)
            .is_some_and(|spell| device.freeze16(mm::SPELL_ID, spell.id))
    } else {
        true
    };
    state.previous_timer = timer;
    TickResult::new(state, ok)
}

pub(super) fn expensive_spells(ctx: &EffectContext, request: &EffectRequest) -> EffectHandle {
    let setup = {
        let device = ctx.device.clone();
        let say = ctx.say();
        let message = format!(
            "{} made spells cost double normal MP for {} seconds",
            request.requester,
            request.duration_secs()
        );
        move || {
            let mp = device.read16(mm::CURRENT_MP)?;
            say.send(&message).then_some(mp)
        }
    };
    let tick = {
        let device = ctx.device.clone();
        move |last_mp| double_spending(device.as_ref(), last_mp)
    };
    ctx.periodic(request, || true, setup, tick, true, CompletionHook::noop())
}

pub(super) fn cheap_spells(ctx: &EffectContext, request: &EffectRequest) -> EffectHandle {
    let setup = {
        let say = ctx.say();
        let message = format!(
            "{} made spells cost 0 MP for {} seconds",
            request.requester,
            request.duration_secs()
        );
        move || say.send(&message).then_some(0)
    };
    let tick = {
        let device = ctx.device.clone();
        move |last_mp| refund_spending(device.as_ref(), last_mp)
    };
    ctx.periodic(request, || true, setup, tick, true, CompletionHook::noop())
}

pub(super) fn random_spell(
    ctx: &EffectContext,
    request: &EffectRequest,
    pool: SpellPool,
) -> EffectHandle {
    let setup = {
        let say = ctx.say();
        let message = match pool {
            SpellPool::Any => format!(
                "{} randomized spells for {} seconds",
                request.requester,
                request.duration_secs()
            ),
            SpellPool::Element(_) => format!(
                "{} randomized spells using spells from the {} pool for {} seconds",
                request.requester,
                pool.key(),
                request.duration_secs()
            ),
        };
        move || {
            say.send(&message)
                .then(|| RandomSpellState::new(StdRng::from_entropy()))
        }
    };
    let tick = {
        let device = ctx.device.clone();
        move |state| randomize_cast(device.as_ref(), pool, state)
    };
    let hook = {
        let device = ctx.device.clone();
        let say = ctx.say();
        CompletionHook::new(move || {
            device.unfreeze(mm::SPELL_ID);
            say.send("Spells are no longer randomized");
        })
    };
    ctx.periodic(request, || true, setup, tick, false, hook)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::Termination;
    use crate::impls::{FaultMode, InMemoryDevice};
    use crate::pack::testing::Rig;
    use crate::ports::Width;

    fn device_with_mp(mp: u16) -> InMemoryDevice {
        let device = InMemoryDevice::new();
        device.poke(mm::CURRENT_MP, Width::W16, mp as u32);
        device
    }

    #[test]
    fn spending_is_charged_twice() {
        let device = device_with_mp(40);
        let tick = double_spending(&device, 50);
        assert!(tick.ok);
        assert_eq!(tick.state, 30);
        assert_eq!(device.peek16(mm::CURRENT_MP), 30);

        // Nothing spent since: nothing charged.
        let tick = double_spending(&device, tick.state);
        assert_eq!(tick.state, 30);
        assert_eq!(device.peek16(mm::CURRENT_MP), 30);
    }

    #[test]
    fn spending_bigger_than_the_rest_is_not_charged() {
        let device = device_with_mp(10);
        let tick = double_spending(&device, 30);
        assert_eq!(tick.state, 10);
        assert_eq!(device.peek16(mm::CURRENT_MP), 10);
    }

    #[test]
    fn regeneration_moves_the_baseline() {
        let device = device_with_mp(60);
        assert_eq!(refund_spending(&device, 50).state, 60);
        assert_eq!(double_spending(&device, 50).state, 60);
    }

    #[test]
    fn spending_is_refunded() {
        let device = device_with_mp(20);
        let tick = refund_spending(&device, 35);
        assert!(tick.ok);
        assert_eq!(tick.state, 35);
        assert_eq!(device.peek16(mm::CURRENT_MP), 35);
    }

    #[test]
    fn unreadable_mp_keeps_the_baseline() {
        let device = device_with_mp(20);
        device.set_fault(FaultMode::Unreadable, 1);
        let tick = refund_spending(&device, 35);
        assert!(!tick.ok);
        assert_eq!(tick.state, 35);
    }

    #[test]
    fn only_castable_spells_are_chosen() {
        let device = InMemoryDevice::new();
        device.poke(Element::Water.spirit().count, Width::W8, 4);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let spell = choose_spell(&device, SpellPool::Any, &mut rng).unwrap();
            assert_eq!(spell.element, Element::Water);
            assert!(spell.level_req <= 4);
        }
        assert!(choose_spell(&device, SpellPool::Element(Element::Fire), &mut rng).is_none());
    }

    #[test]
    fn spell_is_locked_for_one_cast() {
        let device = InMemoryDevice::new();
        device.poke(Element::Fire.spirit().count, Width::W8, 1);
        let pool = SpellPool::Element(Element::Fire);
        let mut state = RandomSpellState::new(StdRng::seed_from_u64(1));

        // 0 -> 0: idle, nothing frozen.
        for timer in [0u32, 20, 19, 18, 0, 0] {
            device.poke(mm::SPELL_TIMER, Width::W16, timer);
            let tick = randomize_cast(&device, pool, state);
            assert!(tick.ok);
            state = tick.state;

            match timer {
                0 => assert!(!device.is_frozen(mm::SPELL_ID)),
                _ => assert_eq!(device.frozen_value(mm::SPELL_ID), Some(0x0000)),
            }
        }
    }

    #[test]
    fn no_castable_spell_fails_the_tick() {
        let device = InMemoryDevice::new();
        device.poke(mm::SPELL_TIMER, Width::W16, 20);
        let state = RandomSpellState::new(StdRng::seed_from_u64(1));

        let tick = randomize_cast(&device, SpellPool::Element(Element::Wind), state);
        assert!(!tick.ok);
        assert!(!device.is_frozen(mm::SPELL_ID));
    }

    #[tokio::test(start_paused = true)]
    async fn random_spell_releases_the_id_at_the_end() {
        let rig = Rig::new();
        rig.device.poke(Element::Earth.spirit().count, Width::W8, 1);

        let handle = rig.start("randomspell_earth");
        tokio::time::sleep(Duration::from_millis(600)).await;
        rig.device.poke(mm::SPELL_TIMER, Width::W16, 30);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(rig.device.frozen_value(mm::SPELL_ID), Some(0x0100));

        assert_eq!(handle.wait().await, Termination::Expired);
        assert!(!rig.device.is_frozen(mm::SPELL_ID));
        assert_eq!(
            rig.messages(),
            vec![
                "viewer randomized spells using spells from the earth pool for 30 seconds"
                    .to_string(),
                "Spells are no longer randomized".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cheap_spells_refund_while_running() {
        let rig = Rig::new();
        rig.device.poke(mm::CURRENT_MP, Width::W16, 40);

        let handle = rig.start("cheapspells");
        tokio::time::sleep(Duration::from_millis(300)).await;
        rig.device.poke(mm::CURRENT_MP, Width::W16, 28);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(rig.device.peek16(mm::CURRENT_MP), 40);

        handle.wait().await;
        rig.device.poke(mm::CURRENT_MP, Width::W16, 10);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(rig.device.peek16(mm::CURRENT_MP), 10);
    }
}
