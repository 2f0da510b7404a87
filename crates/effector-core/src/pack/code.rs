//! EffectCode - 閉じた効果コード
//!
//! 外部からは `base[_param]` 形式の文字列で届きます（`hpplus_5`, `givespirit_fire`,
//! `changemusic_boss`, `randomspell_any`）。受付時に一度だけ parse し、
//! 以降は enum で扱います。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::tables::{self, BgmTrack, CloakColor, Element, Item, StatusType};
use crate::domain::{EngineError, Group};

/// Base code of an effect; the unit timings are configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    HpPlus,
    HpMinus,
    MpPlus,
    MpMinus,
    AgiPlus,
    AgiMinus,
    DefPlus,
    DefMinus,
    GiveSpirit,
    TakeSpirit,
    LockElement,
    GiveItem,
    BigBrian,
    SmallBrian,
    WideView,
    NarrowView,
    FlipCamera,
    ExpensiveSpells,
    CheapSpells,
    MaxEncounter,
    MinEncounter,
    HealEnemy,
    StatusEffect,
    ChangeMusic,
    HideHud,
    CloakColor,
    MoveDown,
    MoveUp,
    HideCompass,
    RandomSpell,
}

impl EffectKind {
    pub const ALL: [EffectKind; 30] = [
        EffectKind::HpPlus,
        EffectKind::HpMinus,
        EffectKind::MpPlus,
        EffectKind::MpMinus,
        EffectKind::AgiPlus,
        EffectKind::AgiMinus,
        EffectKind::DefPlus,
        EffectKind::DefMinus,
        EffectKind::GiveSpirit,
        EffectKind::TakeSpirit,
        EffectKind::LockElement,
        EffectKind::GiveItem,
        EffectKind::BigBrian,
        EffectKind::SmallBrian,
        EffectKind::WideView,
        EffectKind::NarrowView,
        EffectKind::FlipCamera,
        EffectKind::ExpensiveSpells,
        EffectKind::CheapSpells,
        EffectKind::MaxEncounter,
        EffectKind::MinEncounter,
        EffectKind::HealEnemy,
        EffectKind::StatusEffect,
        EffectKind::ChangeMusic,
        EffectKind::HideHud,
        EffectKind::CloakColor,
        EffectKind::MoveDown,
        EffectKind::MoveUp,
        EffectKind::HideCompass,
        EffectKind::RandomSpell,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EffectKind::HpPlus => "hpplus",
            EffectKind::HpMinus => "hpminus",
            EffectKind::MpPlus => "mpplus",
            EffectKind::MpMinus => "mpminus",
            EffectKind::AgiPlus => "agiplus",
            EffectKind::AgiMinus => "agiminus",
            EffectKind::DefPlus => "defplus",
            EffectKind::DefMinus => "defminus",
            EffectKind::GiveSpirit => "givespirit",
            EffectKind::TakeSpirit => "takespirit",
            EffectKind::LockElement => "lockelement",
            EffectKind::GiveItem => "giveitem",
            EffectKind::BigBrian => "bigbrian",
            EffectKind::SmallBrian => "smallbrian",
            EffectKind::WideView => "wideview",
            EffectKind::NarrowView => "narrowview",
            EffectKind::FlipCamera => "flipcamera",
            EffectKind::ExpensiveSpells => "expensivespells",
            EffectKind::CheapSpells => "cheapspells",
            EffectKind::MaxEncounter => "maxencounter",
            EffectKind::MinEncounter => "minencounter",
            EffectKind::HealEnemy => "healenemy",
            EffectKind::StatusEffect => "statuseffect",
            EffectKind::ChangeMusic => "changemusic",
            EffectKind::HideHud => "hidehud",
            EffectKind::CloakColor => "cloakcolor",
            EffectKind::MoveDown => "movedown",
            EffectKind::MoveUp => "moveup",
            EffectKind::HideCompass => "hidecompass",
            EffectKind::RandomSpell => "randomspell",
        }
    }

    pub fn parse(base: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == base)
    }

    /// Applied once and never held, so it has no group to share.
    pub fn is_one_shot(self) -> bool {
        matches!(
            self,
            EffectKind::HpPlus
                | EffectKind::HpMinus
                | EffectKind::MpPlus
                | EffectKind::MpMinus
                | EffectKind::AgiPlus
                | EffectKind::AgiMinus
                | EffectKind::DefPlus
                | EffectKind::DefMinus
                | EffectKind::GiveSpirit
                | EffectKind::TakeSpirit
                | EffectKind::GiveItem
                | EffectKind::HealEnemy
                | EffectKind::StatusEffect
                | EffectKind::CloakColor
        )
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spell pool of `randomspell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpellPool {
    Element(Element),
    Any,
}

impl SpellPool {
    pub fn key(self) -> &'static str {
        match self {
            SpellPool::Element(element) => element.key(),
            SpellPool::Any => "any",
        }
    }

    pub fn admits(self, element: Element) -> bool {
        match self {
            SpellPool::Element(pool) => pool == element,
            SpellPool::Any => true,
        }
    }
}

/// A fully parsed effect code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectCode {
    HpPlus(u8),
    HpMinus(u8),
    MpPlus(u8),
    MpMinus(u8),
    AgiPlus(u8),
    AgiMinus(u8),
    DefPlus(u8),
    DefMinus(u8),
    GiveSpirit(Element),
    TakeSpirit(Element),
    LockElement(Element),
    GiveItem(&'static Item),
    BigBrian,
    SmallBrian,
    WideView,
    NarrowView,
    FlipCamera,
    ExpensiveSpells,
    CheapSpells,
    MaxEncounter,
    MinEncounter,
    HealEnemy,
    StatusEffect(&'static StatusType),
    ChangeMusic(&'static BgmTrack),
    HideHud,
    CloakColor(&'static CloakColor),
    MoveDown,
    MoveUp,
    HideCompass,
    RandomSpell(SpellPool),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodeError {
    #[error("unknown effect '{0}'")]
    Unknown(String),

    #[error("'{code}' needs a parameter")]
    MissingParam { code: String },

    #[error("'{code}' takes no parameter")]
    UnexpectedParam { code: String },

    #[error("invalid parameter '{param}' for '{code}'")]
    BadParam { code: String, param: String },
}

impl From<CodeError> for EngineError {
    fn from(err: CodeError) -> Self {
        let reason = err.to_string();
        match err {
            CodeError::Unknown(code) => EngineError::UnknownEffect(code),
            CodeError::MissingParam { code }
            | CodeError::UnexpectedParam { code }
            | CodeError::BadParam { code, .. } => EngineError::MalformedParams { code, reason },
        }
    }
}

impl EffectCode {
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectCode::HpPlus(_) => EffectKind::HpPlus,
            EffectCode::HpMinus(_) => EffectKind::HpMinus,
            EffectCode::MpPlus(_) => EffectKind::MpPlus,
            EffectCode::MpMinus(_) => EffectKind::MpMinus,
            EffectCode::AgiPlus(_) => EffectKind::AgiPlus,
            EffectCode::AgiMinus(_) => EffectKind::AgiMinus,
            EffectCode::DefPlus(_) => EffectKind::DefPlus,
            EffectCode::DefMinus(_) => EffectKind::DefMinus,
            EffectCode::GiveSpirit(_) => EffectKind::GiveSpirit,
            EffectCode::TakeSpirit(_) => EffectKind::TakeSpirit,
            EffectCode::LockElement(_) => EffectKind::LockElement,
            EffectCode::GiveItem(_) => EffectKind::GiveItem,
            EffectCode::BigBrian => EffectKind::BigBrian,
            EffectCode::SmallBrian => EffectKind::SmallBrian,
            EffectCode::WideView => EffectKind::WideView,
            EffectCode::NarrowView => EffectKind::NarrowView,
            EffectCode::FlipCamera => EffectKind::FlipCamera,
            EffectCode::ExpensiveSpells => EffectKind::ExpensiveSpells,
            EffectCode::CheapSpells => EffectKind::CheapSpells,
            EffectCode::MaxEncounter => EffectKind::MaxEncounter,
            EffectCode::MinEncounter => EffectKind::MinEncounter,
            EffectCode::HealEnemy => EffectKind::HealEnemy,
            EffectCode::StatusEffect(_) => EffectKind::StatusEffect,
            EffectCode::ChangeMusic(_) => EffectKind::ChangeMusic,
            EffectCode::HideHud => EffectKind::HideHud,
            EffectCode::CloakColor(_) => EffectKind::CloakColor,
            EffectCode::MoveDown => EffectKind::MoveDown,
            EffectCode::MoveUp => EffectKind::MoveUp,
            EffectCode::HideCompass => EffectKind::HideCompass,
            EffectCode::RandomSpell(_) => EffectKind::RandomSpell,
        }
    }

    /// Group of the addresses this effect holds. One-shots hold nothing.
    pub fn default_group(&self) -> Option<Group> {
        let tag = match self {
            EffectCode::LockElement(element) => {
                return Some(Group::new(format!("lockelement_{}", element.key())));
            }
            EffectCode::BigBrian | EffectCode::SmallBrian => "briansize",
            EffectCode::WideView | EffectCode::NarrowView | EffectCode::FlipCamera => "camerafov",
            EffectCode::ExpensiveSpells | EffectCode::CheapSpells => "spellcost",
            EffectCode::MaxEncounter | EffectCode::MinEncounter => "encounterrate",
            EffectCode::ChangeMusic(_) => "music",
            EffectCode::HideHud => "hud",
            EffectCode::MoveDown | EffectCode::MoveUp => "movemultiplier",
            EffectCode::HideCompass => "compass",
            EffectCode::RandomSpell(_) => "randomspell",
            _ => return None,
        };
        Some(Group::new(tag))
    }

    fn param(&self) -> Option<String> {
        match self {
            EffectCode::HpPlus(n)
            | EffectCode::HpMinus(n)
            | EffectCode::MpPlus(n)
            | EffectCode::MpMinus(n)
            | EffectCode::AgiPlus(n)
            | EffectCode::AgiMinus(n)
            | EffectCode::DefPlus(n)
            | EffectCode::DefMinus(n) => Some(n.to_string()),
            EffectCode::GiveSpirit(e) | EffectCode::TakeSpirit(e) | EffectCode::LockElement(e) => {
                Some(e.key().to_string())
            }
            EffectCode::GiveItem(item) => Some(item.key.to_string()),
            EffectCode::StatusEffect(status) => Some(status.key.to_string()),
            EffectCode::ChangeMusic(track) => Some(track.key.to_string()),
            EffectCode::CloakColor(cloak) => Some(cloak.key.to_string()),
            EffectCode::RandomSpell(pool) => Some(pool.key().to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for EffectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.param() {
            Some(param) => write!(f, "{}_{}", self.kind(), param),
            None => write!(f, "{}", self.kind()),
        }
    }
}

fn amount(code: &str, param: &str, max: u8) -> Result<u8, CodeError> {
    match param.parse::<u8>() {
        Ok(n) if (1..=max).contains(&n) => Ok(n),
        _ => Err(CodeError::BadParam {
            code: code.to_string(),
            param: param.to_string(),
        }),
    }
}

impl FromStr for EffectCode {
    type Err = CodeError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let (base, param) = match code.split_once('_') {
            Some((base, param)) => (base, Some(param)),
            None => (code, None),
        };
        let kind = EffectKind::parse(base).ok_or_else(|| CodeError::Unknown(code.to_string()))?;

        let bad = |param: &str| CodeError::BadParam {
            code: code.to_string(),
            param: param.to_string(),
        };
        let need = || {
            param.ok_or_else(|| CodeError::MissingParam {
                code: code.to_string(),
            })
        };
        let element = |param: &str| Element::parse(param).ok_or_else(|| bad(param));

        let parsed = match kind {
            EffectKind::HpPlus => EffectCode::HpPlus(amount(code, need()?, 10)?),
            EffectKind::HpMinus => EffectCode::HpMinus(amount(code, need()?, 10)?),
            EffectKind::MpPlus => EffectCode::MpPlus(amount(code, need()?, 10)?),
            EffectKind::MpMinus => EffectCode::MpMinus(amount(code, need()?, 10)?),
            EffectKind::AgiPlus => EffectCode::AgiPlus(amount(code, need()?, 5)?),
            EffectKind::AgiMinus => EffectCode::AgiMinus(amount(code, need()?, 5)?),
            EffectKind::DefPlus => EffectCode::DefPlus(amount(code, need()?, 5)?),
            EffectKind::DefMinus => EffectCode::DefMinus(amount(code, need()?, 5)?),
            EffectKind::GiveSpirit => EffectCode::GiveSpirit(element(need()?)?),
            EffectKind::TakeSpirit => EffectCode::TakeSpirit(element(need()?)?),
            EffectKind::LockElement => EffectCode::LockElement(element(need()?)?),
            EffectKind::GiveItem => {
                let p = need()?;
                EffectCode::GiveItem(tables::item(p).ok_or_else(|| bad(p))?)
            }
            EffectKind::StatusEffect => {
                let p = need()?;
                EffectCode::StatusEffect(tables::status_type(p).ok_or_else(|| bad(p))?)
            }
            EffectKind::ChangeMusic => {
                let p = need()?;
                EffectCode::ChangeMusic(tables::bgm_track(p).ok_or_else(|| bad(p))?)
            }
            EffectKind::CloakColor => {
                let p = need()?;
                EffectCode::CloakColor(tables::cloak_color(p).ok_or_else(|| bad(p))?)
            }
            EffectKind::RandomSpell => {
                let p = need()?;
                if p == "any" {
                    EffectCode::RandomSpell(SpellPool::Any)
                } else {
                    EffectCode::RandomSpell(SpellPool::Element(element(p)?))
                }
            }
            EffectKind::BigBrian => EffectCode::BigBrian,
            EffectKind::SmallBrian => EffectCode::SmallBrian,
            EffectKind::WideView => EffectCode::WideView,
            EffectKind::NarrowView => EffectCode::NarrowView,
            EffectKind::FlipCamera => EffectCode::FlipCamera,
            EffectKind::ExpensiveSpells => EffectCode::ExpensiveSpells,
            EffectKind::CheapSpells => EffectCode::CheapSpells,
            EffectKind::MaxEncounter => EffectCode::MaxEncounter,
            EffectKind::MinEncounter => EffectCode::MinEncounter,
            EffectKind::HealEnemy => EffectCode::HealEnemy,
            EffectKind::HideHud => EffectCode::HideHud,
            EffectKind::MoveDown => EffectCode::MoveDown,
            EffectKind::MoveUp => EffectCode::MoveUp,
            EffectKind::HideCompass => EffectCode::HideCompass,
        };

        if parsed.param().is_none() && param.is_some() {
            return Err(CodeError::UnexpectedParam {
                code: code.to_string(),
            });
        }
        Ok(parsed)
    }
}
