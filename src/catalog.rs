use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Crafting professions with guides on the source site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Profession {
    Alchemy,
    Blacksmithing,
    Enchanting,
    Engineering,
    Inscription,
    Jewelcrafting,
    Leatherworking,
    Tailoring,
    Cooking,
}

impl Profession {
    pub const ALL: [Profession; 9] = [
        Profession::Alchemy,
        Profession::Blacksmithing,
        Profession::Enchanting,
        Profession::Engineering,
        Profession::Inscription,
        Profession::Jewelcrafting,
        Profession::Leatherworking,
        Profession::Tailoring,
        Profession::Cooking,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Profession::Alchemy => "alchemy",
            Profession::Blacksmithing => "blacksmithing",
            Profession::Enchanting => "enchanting",
            Profession::Engineering => "engineering",
            Profession::Inscription => "inscription",
            Profession::Jewelcrafting => "jewelcrafting",
            Profession::Leatherworking => "leatherworking",
            Profession::Tailoring => "tailoring",
            Profession::Cooking => "cooking",
        }
    }

    pub fn display_name(self) -> String {
        title_case(self.key())
    }
}

impl fmt::Display for Profession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Profession {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Profession::ALL
            .into_iter()
            .find(|p| p.key() == wanted)
            .ok_or_else(|| ConfigError::UnknownProfession(s.to_string()))
    }
}

/// Game expansions in release order. `Ord` follows the chronology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Expansion {
    Vanilla,
    Outland,
    Northrend,
    Cataclysm,
    Pandaria,
    Draenor,
    Legion,
    Bfa,
    Shadowlands,
    Dragonflight,
    WarWithin,
}

/// Display names that plain title-casing gets wrong.
const DISPLAY_OVERRIDES: &[(&str, &str)] = &[("bfa", "BFA"), ("war_within", "The War Within")];

/// How a guide for this expansion is laid out on the source site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideLayout {
    /// A condensed materials summary exists somewhere on the page.
    Summary,
    /// Materials are only ever mentioned inline while discovering recipes.
    Discovery,
    /// Organised by skill ranges with no summary; extraction is not attempted.
    SkillRanges,
}

impl Expansion {
    pub const ALL: [Expansion; 11] = [
        Expansion::Vanilla,
        Expansion::Outland,
        Expansion::Northrend,
        Expansion::Cataclysm,
        Expansion::Pandaria,
        Expansion::Draenor,
        Expansion::Legion,
        Expansion::Bfa,
        Expansion::Shadowlands,
        Expansion::Dragonflight,
        Expansion::WarWithin,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Expansion::Vanilla => "vanilla",
            Expansion::Outland => "outland",
            Expansion::Northrend => "northrend",
            Expansion::Cataclysm => "cataclysm",
            Expansion::Pandaria => "pandaria",
            Expansion::Draenor => "draenor",
            Expansion::Legion => "legion",
            Expansion::Bfa => "bfa",
            Expansion::Shadowlands => "shadowlands",
            Expansion::Dragonflight => "dragonflight",
            Expansion::WarWithin => "war_within",
        }
    }

    /// Slug used in guide URLs.
    pub fn slug(self) -> &'static str {
        match self {
            Expansion::Bfa => "battle-for-azeroth",
            Expansion::Dragonflight => "dragon-isles",
            Expansion::WarWithin => "the-war-within",
            other => other.key(),
        }
    }

    /// 1-based position in release order.
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn display_name(self) -> String {
        let key = self.key();
        DISPLAY_OVERRIDES
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, name)| name.to_string())
            .unwrap_or_else(|| title_case(key))
    }

    pub fn layout(self) -> GuideLayout {
        match self {
            Expansion::Draenor | Expansion::Legion => GuideLayout::SkillRanges,
            Expansion::Pandaria => GuideLayout::Discovery,
            _ => GuideLayout::Summary,
        }
    }
}

impl fmt::Display for Expansion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Expansion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(' ', "_");
        let alias = match wanted.as_str() {
            "classic" => Some(Expansion::Vanilla),
            "tbc" | "burning_crusade" => Some(Expansion::Outland),
            "wotlk" => Some(Expansion::Northrend),
            "cata" => Some(Expansion::Cataclysm),
            "mop" => Some(Expansion::Pandaria),
            "wod" => Some(Expansion::Draenor),
            "tww" | "the_war_within" | "war-within" => Some(Expansion::WarWithin),
            _ => None,
        };
        alias
            .or_else(|| {
                Expansion::ALL
                    .into_iter()
                    .find(|e| e.key() == wanted || e.slug() == wanted)
            })
            .ok_or_else(|| ConfigError::UnknownExpansion(s.to_string()))
    }
}

fn title_case(key: &str) -> String {
    key.split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
