//! Static tables: spirits, status effects, items, music, cloak colors, spells.
//!
//! 起動時に一度だけ参照される不変データ。`EffectCode` のパラメータはここへの
//! `&'static` 参照として持ちます。

use serde::{Deserialize, Serialize};

use crate::ports::Address;

/// Sound effect ids.
pub mod sfx {
    pub const HEALING: u8 = 0x0b;
    pub const ENEMY_DEFEATED: u8 = 0x0a;
    pub const DAMAGE_CONTACT: u8 = 0x18;
    pub const DIZZY: u8 = 0x1c;
    pub const SILENCE: u8 = 0x27;
    pub const MAGIC_BARRIER: u8 = 0x35;
    pub const STAT_UP: u8 = 0x3d;
    pub const STAT_DOWN: u8 = 0x3e;
    pub const MENU_OPEN: u8 = 0x01;
    pub const MENU_CLOSE: u8 = 0x02;
    pub const RESTRICTION: u8 = 0x22;
    pub const ICE_KNIFE: u8 = 0x38;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Earth,
    Water,
    Wind,
}

impl Element {
    pub const ALL: [Element; 4] = [Element::Fire, Element::Earth, Element::Water, Element::Wind];

    pub fn key(self) -> &'static str {
        match self {
            Element::Fire => "fire",
            Element::Earth => "earth",
            Element::Water => "water",
            Element::Wind => "wind",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|element| element.key() == key)
    }

    pub fn spirit(self) -> &'static Spirit {
        match self {
            Element::Fire => &SPIRITS[0],
            Element::Earth => &SPIRITS[1],
            Element::Water => &SPIRITS[2],
            Element::Wind => &SPIRITS[3],
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Spirit {
    pub element: Element,
    pub name: &'static str,
    /// Spirit count (level) of the element, 8 bits.
    pub count: Address,
    /// Level requirement of the element's first spell, 16 bits.
    pub level_req: Address,
}

pub static SPIRITS: [Spirit; 4] = [
    Spirit { element: Element::Fire, name: "Fire", count: 0x8007_baa4, level_req: 0x800c_06a0 },
    Spirit { element: Element::Earth, name: "Earth", count: 0x8007_baa5, level_req: 0x800c_0a9c },
    Spirit { element: Element::Water, name: "Water", count: 0x8007_baa6, level_req: 0x800c_0e98 },
    Spirit { element: Element::Wind, name: "Wind", count: 0x8007_baa7, level_req: 0x800c_1294 },
];

#[derive(Debug, PartialEq, Eq)]
pub struct StatusType {
    pub key: &'static str,
    pub name: &'static str,
    pub bit: u16,
    /// Rounds-left byte.
    pub duration: Address,
    /// Icon byte and the value that shows this status.
    pub icon: Option<(Address, u8)>,
    pub sfx: u8,
    /// Cannot be applied during a boss fight.
    pub blocked_in_boss_fight: bool,
}

pub static STATUS_TYPES: [StatusType; 7] = [
    StatusType {
        key: "vampire",
        name: "Vampire Touch",
        bit: 0x2,
        duration: 0x8007_bb3b,
        icon: None,
        sfx: sfx::STAT_UP,
        blocked_in_boss_fight: false,
    },
    StatusType {
        key: "powerstaf",
        name: "Power Staff",
        bit: 0x4,
        duration: 0x8007_bb3c,
        icon: Some((0x8007_bb4a, 3)),
        sfx: sfx::STAT_UP,
        blocked_in_boss_fight: false,
    },
    StatusType {
        key: "freeze",
        name: "Freeze",
        bit: 0x8,
        duration: 0x8007_bb3d,
        icon: None,
        sfx: sfx::ICE_KNIFE,
        blocked_in_boss_fight: true,
    },
    StatusType {
        key: "evade",
        name: "Evasion",
        bit: 0x20,
        // 0x8007bb3c would collide with Power Staff's rounds byte.
        duration: 0x8007_bb3f,
        icon: Some((0x8007_bb4d, 7)),
        sfx: sfx::STAT_UP,
        blocked_in_boss_fight: false,
    },
    StatusType {
        key: "silence",
        name: "Silence",
        bit: 0x40,
        duration: 0x8007_bb40,
        icon: Some((0x8007_bb50, 0xb)),
        sfx: sfx::SILENCE,
        blocked_in_boss_fight: false,
    },
    StatusType {
        key: "defup",
        name: "Def Up",
        bit: 0x400,
        duration: 0x8007_bb44,
        icon: Some((0x8007_bb4c, 5)),
        sfx: sfx::STAT_UP,
        blocked_in_boss_fight: false,
    },
    StatusType {
        key: "barrier",
        name: "Magic Barrier",
        bit: 0x100,
        duration: 0x8007_bb42,
        icon: None,
        sfx: sfx::MAGIC_BARRIER,
        blocked_in_boss_fight: false,
    },
];

#[derive(Debug, PartialEq, Eq)]
pub struct Item {
    pub key: &'static str,
    pub name: &'static str,
    pub value: u8,
}

pub static ITEMS: [Item; 13] = [
    Item { key: "spiritlight", name: "Spirit Light", value: 0x00 },
    Item { key: "freshbread", name: "Fresh Bread", value: 0x01 },
    Item { key: "honeybread", name: "Honey Bread", value: 0x02 },
    Item { key: "healingpotion", name: "Healing Potion", value: 0x03 },
    Item { key: "dragonspotion", name: "Dragon's Potion", value: 0x04 },
    Item { key: "dewdrop", name: "Dew Drop", value: 0x05 },
    Item { key: "mintleaves", name: "Mint Leaves", value: 0x06 },
    Item { key: "heroesdrink", name: "Heroes Drink", value: 0x07 },
    Item { key: "silentflute", name: "Silent Flute", value: 0x08 },
    Item { key: "celinesbell", name: "Celine's Bell", value: 0x09 },
    Item { key: "replica", name: "Replica", value: 0x0a },
    Item { key: "giantsshoes", name: "Giant's Shoes", value: 0x0b },
    Item { key: "silveramulet", name: "Silver Amulet", value: 0x0c },
];

#[derive(Debug, PartialEq, Eq)]
pub struct BgmTrack {
    pub key: &'static str,
    pub name: &'static str,
    pub index: u8,
}

pub static BGM_TRACKS: [BgmTrack; 16] = [
    BgmTrack { key: "boss", name: "Boss Battle", index: 0x00 },
    BgmTrack { key: "mines", name: "Mines", index: 0x01 },
    BgmTrack { key: "melrode", name: "Melrode", index: 0x02 },
    BgmTrack { key: "pirates", name: "Pirates", index: 0x06 },
    BgmTrack { key: "sacredvalley", name: "Sacred valley", index: 0x09 },
    BgmTrack { key: "cullhazard", name: "Cull hazard", index: 0x0a },
    BgmTrack { key: "connor", name: "Connor forest", index: 0x0c },
    BgmTrack { key: "boilhole", name: "Boil hole", index: 0x12 },
    BgmTrack { key: "dries", name: "Dries", index: 0x16 },
    BgmTrack { key: "bluecave", name: "Blue cave", index: 0x17 },
    BgmTrack { key: "normoon", name: "Normoon", index: 0x25 },
    BgmTrack { key: "darkgaol", name: "Dark gaol", index: 0x21 },
    BgmTrack { key: "brannoch", name: "Brannoch castle", index: 0x1f },
    BgmTrack { key: "battle", name: "Battle", index: 0x0d },
    BgmTrack { key: "larapool", name: "Larapool", index: 0x22 },
    BgmTrack { key: "dondoran", name: "Dondoran", index: 0x19 },
];

#[derive(Debug, PartialEq, Eq)]
pub struct CloakColor {
    pub key: &'static str,
    pub name: &'static str,
    /// 0xRRGGBB per polygon, left to right.
    pub colors: [u32; 6],
}

pub static CLOAK_COLORS: [CloakColor; 10] = [
    CloakColor { key: "red", name: "Red", colors: [0xe90000; 6] },
    CloakColor { key: "blue", name: "Blue", colors: [0x0000ff; 6] },
    CloakColor { key: "green", name: "Green", colors: [0x00ff00; 6] },
    CloakColor {
        key: "rainbow",
        name: "Rainbow",
        colors: [0xe40303, 0xff8c00, 0xffed00, 0x008026, 0x25508e, 0x732982],
    },
    CloakColor {
        key: "trans",
        name: "Trans Flag",
        colors: [0x82baff, 0xff82d1, 0xffffff, 0xffffff, 0xff82d1, 0x82baff],
    },
    CloakColor {
        key: "ace",
        name: "Ace Flag",
        colors: [0x000000, 0xa3a3a3, 0xa3a3a3, 0xffffff, 0xffffff, 0x800080],
    },
    CloakColor {
        key: "nb",
        name: "Non-Binary Flag",
        colors: [0xfcf434, 0xffffff, 0xffffff, 0x9c59d1, 0x9c59d1, 0x000000],
    },
    CloakColor {
        key: "bi",
        name: "Bisexual Flag",
        colors: [0xd60270, 0xd60270, 0x9b4f96, 0x9b4f96, 0x0038a8, 0x0038a8],
    },
    CloakColor {
        key: "aro",
        name: "Aromantic Flag",
        colors: [0x3da542, 0xa7d379, 0xffffff, 0xffffff, 0xa9a9a9, 0x000000],
    },
    CloakColor {
        key: "pan",
        name: "Pansexual Flag",
        colors: [0xff218c, 0xff218c, 0xffd800, 0xffd800, 0x21b1ff, 0x21b1ff],
    },
];

#[derive(Debug, PartialEq, Eq)]
pub struct Spell {
    pub element: Element,
    pub id: u16,
    /// Spirits of `element` needed to know the spell.
    pub level_req: u8,
    pub name: &'static str,
}

macro_rules! spells {
    ($($element:ident $id:literal $req:literal $name:literal),* $(,)?) => {
        [$(Spell { element: Element::$element, id: $id, level_req: $req, name: $name }),*]
    };
}

pub static SPELLS: [Spell; 60] = spells![
    Fire 0x0000 0x01 "Fire Ball Lv1",
    Fire 0x0001 0x04 "Fire Ball Lv2",
    Fire 0x0002 0x07 "Power Staff Lv1",
    Fire 0x0003 0x0a "Homing Arrow Lv1",
    Fire 0x0004 0x0d "Hot Steam Lv1",
    Fire 0x0005 0x10 "Fire Ball Lv3",
    Fire 0x0006 0x13 "Compression",
    Fire 0x0007 0x16 "Power Staff Lv2",
    Fire 0x0008 0x18 "Fire Pillar",
    Fire 0x0009 0x1c "Homing Arrow Lv2",
    Fire 0x000a 0x1e "Fire Bomb",
    Fire 0x000b 0x20 "Vampire's Touch",
    Fire 0x000c 0x24 "Magma Ball",
    Fire 0x000d 0x28 "Extinction",
    Fire 0x000e 0x2c "Hot Steam Lv2",
    Earth 0x0100 0x01 "Rock Lv1",
    Earth 0x0101 0x04 "Rock Lv2",
    Earth 0x0102 0x07 "Spirit Armor Lv1",
    Earth 0x0103 0x0a "Rolling Rock Lv1",
    Earth 0x0104 0x0d "Weakness Lv1",
    Earth 0x0105 0x10 "Rock Lv3",
    Earth 0x0106 0x13 "Magnet Rock",
    Earth 0x0107 0x15 "Spirit Armor Lv2",
    Earth 0x0108 0x18 "Avalanche",
    Earth 0x0109 0x1b "Confusion",
    Earth 0x010a 0x1f "Weakness Lv2",
    Earth 0x010b 0x22 "Rock Shower",
    Earth 0x010c 0x24 "Magic Barrier",
    Earth 0x010d 0x27 "Rolling Rock Lv2",
    Earth 0x010e 0x2b "Weaken All",
    Water 0x0200 0x01 "Water Pillar Lv1",
    Water 0x0201 0x04 "Water Pillar Lv2",
    Water 0x0202 0x07 "Healing Lv1",
    Water 0x0203 0x0a "Soul Searcher Lv1",
    Water 0x0204 0x0d "Water Pillar Lv3",
    Water 0x0205 0x0f "Ice Wall",
    Water 0x0206 0x11 "Ice Knife",
    Water 0x0207 0x13 "Exit",
    Water 0x0208 0x17 "Escape",
    Water 0x0209 0x18 "Return",
    Water 0x020a 0x19 "Healing Lv2",
    Water 0x020b 0x21 "Soul Searcher Lv2",
    Water 0x020c 0x23 "Walking Water",
    Water 0x020d 0x28 "Drain Magic",
    Water 0x020e 0x2e "Invalidity",
    Wind 0x0300 0x01 "Wind Cutter Lv1",
    Wind 0x0301 0x04 "Wind Cutter Lv2",
    Wind 0x0302 0x06 "Restriction Lv1",
    Wind 0x0303 0x08 "Evade Lv1",
    Wind 0x0304 0x0a "Silence Lv1",
    Wind 0x0305 0x0c "Wind Cutter Lv3",
    Wind 0x0306 0x0d "Large Cutter",
    Wind 0x0307 0x10 "Restriction Lv2",
    Wind 0x0308 0x14 "Wind Bomb",
    Wind 0x0309 0x18 "Evade Lv2",
    Wind 0x030a 0x1c "Cyclone",
    Wind 0x030b 0x20 "Slow Enemy",
    Wind 0x030c 0x25 "Wind Walk",
    Wind 0x030d 0x2a "Silence Lv2",
    Wind 0x030e 0x2f "Ultimate Wind",
];

pub fn status_type(key: &str) -> Option<&'static StatusType> {
    STATUS_TYPES.iter().find(|status| status.key == key)
}

pub fn item(key: &str) -> Option<&'static Item> {
    ITEMS.iter().find(|item| item.key == key)
}

pub fn bgm_track(key: &str) -> Option<&'static BgmTrack> {
    BGM_TRACKS.iter().find(|track| track.key == key)
}

pub fn cloak_color(key: &str) -> Option<&'static CloakColor> {
    CLOAK_COLORS.iter().find(|cloak| cloak.key == key)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn spirits_line_up_with_elements() {
        for element in Element::ALL {
            assert_eq!(element.spirit().element, element);
            assert_eq!(Element::parse(element.key()), Some(element));
        }
    }

    #[test]
    fn spell_ids_are_unique_and_grouped_by_element() {
        let ids: HashSet<u16> = SPELLS.iter().map(|spell| spell.id).collect();
        assert_eq!(ids.len(), SPELLS.len());
        for spell in &SPELLS {
            let expected_high = match spell.element {
                Element::Fire => 0,
                Element::Earth => 1,
                Element::Water => 2,
                Element::Wind => 3,
            };
            assert_eq!(spell.id >> 8, expected_high, "{}", spell.name);
        }
    }

    #[test]
    fn status_rounds_bytes_do_not_collide() {
        let bytes: HashSet<Address> = STATUS_TYPES.iter().map(|status| status.duration).collect();
        assert_eq!(bytes.len(), STATUS_TYPES.len());
    }

    #[test]
    fn lookups_by_key() {
        assert_eq!(item("replica").map(|i| i.value), Some(0x0a));
        assert_eq!(bgm_track("boss").map(|t| t.index), Some(0x00));
        assert_eq!(cloak_color("rainbow").map(|c| c.colors[5]), Some(0x732982));
        assert!(status_type("freeze").is_some_and(|s| s.blocked_in_boss_fight));
        assert!(item("whitewings").is_none());
    }
}
