//! Static lookup tables used by the choice resolver, the normalizer and the
//! inline-mention scanner.
//!
//! The tables are plain data. A [`Lexicon`] is built once per run (built-in
//! defaults merged with any overrides from the settings file) and handed to
//! the parser by reference; nothing here is mutated after construction.

use std::collections::HashMap;

use regex::Regex;

use super::normalize::canonical_key;
use crate::catalog::Profession;
use crate::model::Category;

/// Tier for names missing from the tier table.
pub const DEFAULT_TIER: u8 = 2;

/// Common, cheap alternatives. Preferred when a guide offers a choice.
const TIER_ONE: &[&str] = &[
    "Light Leather", "Medium Leather", "Heavy Leather", "Thick Leather", "Rugged Leather",
    "Knothide Leather", "Borean Leather", "Savage Leather", "Exotic Leather",
    "Linen Cloth", "Wool Cloth", "Silk Cloth", "Mageweave Cloth", "Runecloth",
    "Netherweave Cloth", "Frostweave Cloth", "Embersilk Cloth", "Windwool Cloth",
    "Copper Bar", "Tin Bar", "Bronze Bar", "Iron Bar", "Copper Ore", "Tin Ore", "Iron Ore",
    "Rough Stone", "Coarse Stone", "Heavy Stone", "Solid Stone", "Dense Stone",
    "Peacebloom", "Silverleaf", "Earthroot", "Mageroyal", "Briarthorn", "Bruiseweed",
    "Strange Dust", "Soul Dust", "Vision Dust", "Dream Dust", "Illusion Dust",
    "Arcane Dust", "Infinite Dust", "Hypnotic Dust", "Spirit Dust",
    "Empty Vial", "Leaded Vial", "Crystal Vial", "Imbued Vial",
    "Coarse Thread", "Fine Thread", "Silken Thread", "Heavy Silken Thread", "Rune Thread",
    "Salt", "Light Parchment",
];

/// Rare or expensive alternatives. Chosen only when nothing cheaper is offered.
const TIER_THREE: &[&str] = &[
    "Star Ruby", "Black Lotus", "Arcanite Bar", "Arcane Crystal", "Enchanted Thorium Bar",
    "Truesilver Bar", "Black Diamond", "Huge Emerald", "Azerothian Diamond",
    "Large Brilliant Shard", "Primal Might", "Primal Nether", "Frozen Orb",
    "Titansteel Bar", "Heart of Fire", "Living Steel", "Spirit of Harmony", "Sha Crystal",
    "Golden Lotus", "Blood of Sargeras", "Primal Sargerite", "Expulsom",
    "Orboreal Shard", "Awakened Order", "Spark of Ingenuity", "Spark of Omens",
];

/// Exact names whose category the keyword rules would get wrong.
const EXACT_CATEGORIES: &[(&str, Category)] = &[
    ("Rough Stone", Category::Metal),
    ("Coarse Stone", Category::Metal),
    ("Heavy Stone", Category::Metal),
    ("Solid Stone", Category::Metal),
    ("Dense Stone", Category::Metal),
    ("Essence of Fire", Category::Elemental),
    ("Essence of Earth", Category::Elemental),
    ("Essence of Water", Category::Elemental),
    ("Essence of Air", Category::Elemental),
    ("Essence of Undeath", Category::Elemental),
    ("Heart of Fire", Category::Elemental),
    ("Elemental Earth", Category::Elemental),
    ("Elemental Fire", Category::Elemental),
    ("Elemental Water", Category::Elemental),
    ("Elemental Air", Category::Elemental),
    ("Spirit of Harmony", Category::Elemental),
    ("Mote of Harmony", Category::Elemental),
    ("Frozen Orb", Category::Elemental),
    ("Bolt of Windwool Cloth", Category::Cloth),
    ("Fool's Cap", Category::Herb),
    ("Star Ruby", Category::Gem),
];

const METAL_WORDS: &[&str] = &[
    "ore", "bar", "bars", "ingot", "flux", "stone", "copper", "tin", "iron", "bronze", "silver",
    "gold", "mithril", "thorium", "truesilver", "adamantite", "khorium", "cobalt", "saronite",
    "titanium", "titansteel", "obsidium", "elementium", "pyrite", "kyparite", "trillium",
    "leystone", "felslate", "monelite", "platinum", "laestrite", "solenium", "oxxein", "phaedrum",
    "sinvyr", "elethium", "serevite", "draconium", "bismuth", "aqirite", "ironclaw", "steel",
];

const LEATHER_WORDS: &[&str] = &["leather", "hide", "hides", "skin", "pelt", "fur", "rawhide"];

const SCALE_WORDS: &[&str] = &["scale", "scales", "dragonscale"];

const CLOTH_WORDS: &[&str] = &[
    "cloth", "linen", "wool", "silk", "mageweave", "runecloth", "felcloth", "netherweave",
    "frostweave", "embersilk", "windwool", "hexweave", "tidespray", "shadowghast", "wildercloth",
    "weavercloth",
];

const THREAD_WORDS: &[&str] = &["thread", "sinew", "cord"];

const ENHANCEMENT_WORDS: &[&str] = &[
    "flux", "coal", "grindstone", "weightstone", "whetstone", "sharpening", "grinding",
];

/// Whole-token keyword rules, checked in order; the first rule with a hit wins.
const KEYWORD_RULES: &[(Category, &[&str])] = &[
    (Category::Enchanting, &["dust", "essence", "shard", "crystal", "rod"]),
    (Category::Pigment, &["pigment", "ink", "parchment"]),
    (Category::Consumable, &["vial", "vials"]),
    (Category::Potion, &["potion", "elixir", "flask", "draught", "phial", "oil"]),
    (
        Category::Component,
        &[
            "bolts", "gear", "gears", "spring", "tube", "wire", "casing", "blasting", "powder",
            "gyro", "fuse", "lens", "battery", "scope", "frame", "contact", "widget", "dynamite",
            "framework",
        ],
    ),
    (
        Category::Herb,
        &[
            "herb", "leaf", "bloom", "blossom", "weed", "root", "kelp", "grass", "rose", "lily",
            "moss", "thorn", "vine", "lotus", "thistle", "poppy", "peacebloom", "silverleaf",
            "earthroot", "mageroyal", "briarthorn", "bruiseweed", "swiftthistle", "stranglekelp",
            "kingsblood", "liferoot", "goldthorn", "wildvine", "firebloom", "sungrass",
            "dreamfoil", "felweed", "terocone", "goldclover", "deadnettle", "icethorn",
            "cinderbloom", "stormvine", "heartblossom", "whiptail",
            "silkweed", "starflower", "foxflower", "fjarnskaggl", "aethril", "dreamleaf",
            "felwort", "riverbud", "akunda's", "nightshade", "marrowroot", "widowbloom",
            "hochenblume", "saxifrage", "writhebark", "mycobloom", "luredrop", "orbinid",
        ],
    ),
    (Category::Metal, METAL_WORDS),
    (
        Category::Gem,
        &[
            "gem", "jade", "citrine", "sapphire", "ruby", "emerald", "diamond", "topaz",
            "agate", "bloodstone", "chalcedony", "moonstone", "malachite", "shadowgem",
            "tigerseye", "aquamarine", "opal", "amethyst", "zircon", "jasper", "garnet",
            "peridot", "spinel", "onyx", "pearl", "alexandrite", "sunstone", "lapis",
            "roguestone", "alicite", "hessonite", "nightstone", "carnelian",
        ],
    ),
    (Category::Leather, LEATHER_WORDS),
    (Category::Leather, SCALE_WORDS),
    (Category::Cloth, CLOTH_WORDS),
    (Category::Cloth, THREAD_WORDS),
    (
        Category::Elemental,
        &[
            "elemental", "eternal", "crystallized", "volatile", "rousing", "awakened", "primal",
            "mote", "motes", "fire", "air", "water", "earth", "life", "mana", "shadow", "frost",
            "order", "decay", "ire", "orb",
        ],
    ),
    (
        Category::Cooking,
        &[
            "meat", "flesh", "fish", "egg", "eggs", "spice", "spices", "flank", "steak", "wing",
            "wings", "leg", "tail", "sausage", "fillet", "ribs", "venison", "clam", "crab",
            "snapper", "ham", "loin", "chunk", "shank", "breast", "belly", "lungfish", "shrimp",
            "salmon", "paddlefish",
        ],
    ),
];

/// Rules a profession checks before the shared ones. A smith's flux is an
/// enhancement and a leatherworker keeps scales and thread apart.
const PROFESSION_RULES: &[(Profession, &[(Category, &[&str])])] = &[
    (
        Profession::Blacksmithing,
        &[(Category::Enhancement, ENHANCEMENT_WORDS), (Category::Metal, METAL_WORDS)],
    ),
    (
        Profession::Leatherworking,
        &[
            (Category::Leather, LEATHER_WORDS),
            (Category::Scale, SCALE_WORDS),
            (Category::Thread, THREAD_WORDS),
        ],
    ),
    (
        Profession::Tailoring,
        &[(Category::Cloth, CLOTH_WORDS), (Category::Cloth, THREAD_WORDS)],
    ),
];

/// Names scanned for in discovery-style guides, with their priority rank
/// (lower ranks are listed first).
const INLINE_MENTIONS: &[(&str, u8)] = &[
    ("Ghost Iron Ore", 1),
    ("Ghost Iron Bar", 1),
    ("Windwool Cloth", 1),
    ("Exotic Leather", 1),
    ("Green Tea Leaf", 1),
    ("Silkweed", 1),
    ("Rain Poppy", 1),
    ("Snow Lily", 1),
    ("Fool's Cap", 1),
    ("Spirit Dust", 1),
    ("Ink of Dreams", 1),
    ("Shadow Pigment", 1),
    ("Raw Tiger Steak", 1),
    ("Mushan Ribs", 1),
    ("Wildfowl Breast", 1),
    ("Raw Turtle Meat", 1),
    ("Raw Crab Meat", 1),
    ("Jade Lungfish", 1),
    ("Kyparite", 2),
    ("Trillium Bar", 2),
    ("Bolt of Windwool Cloth", 2),
    ("Prismatic Scale", 2),
    ("Mysterious Essence", 2),
    ("Ethereal Shard", 2),
    ("Misty Pigment", 2),
    ("Mote of Harmony", 2),
    ("Pandarian Garnet", 2),
    ("Alexandrite", 2),
    ("Sunstone", 2),
    ("Lapis Lazuli", 2),
    ("Tiger Opal", 2),
    ("Roguestone", 2),
    ("Giant Mantis Shrimp", 2),
    ("Emperor Salmon", 2),
    ("Sha-Touched Leather", 3),
    ("Golden Lotus", 3),
    ("Spirit of Harmony", 3),
    ("Sha Crystal", 3),
    ("Living Steel", 3),
];

/// A name scanned for in running prose, with its compiled matcher.
#[derive(Debug, Clone)]
pub struct InlineName {
    pub name: String,
    pub rank: u8,
    /// Matches the name with an optional quantity immediately before it.
    pub pattern: Regex,
}

#[derive(Debug, Clone)]
pub struct Lexicon {
    tiers: HashMap<String, u8>,
    categories: HashMap<String, Category>,
    inline: Vec<InlineName>,
}

impl Lexicon {
    pub fn builtin() -> Self {
        let mut tiers = HashMap::new();
        for name in TIER_ONE {
            tiers.insert(canonical_key(name), 1);
        }
        for name in TIER_THREE {
            tiers.insert(canonical_key(name), 3);
        }

        let categories = EXACT_CATEGORIES
            .iter()
            .map(|(name, category)| (canonical_key(name), *category))
            .collect();

        let inline = INLINE_MENTIONS
            .iter()
            .map(|(name, rank)| InlineName {
                name: name.to_string(),
                rank: *rank,
                pattern: inline_pattern(name),
            })
            .collect();

        Lexicon {
            tiers,
            categories,
            inline,
        }
    }

    /// Merge tier and category overrides from the settings file over the built-ins.
    pub fn with_overrides(
        mut self,
        tiers: &HashMap<String, u8>,
        categories: &HashMap<String, Category>,
    ) -> Self {
        for (name, tier) in tiers {
            self.tiers.insert(canonical_key(name), (*tier).clamp(1, 3));
        }
        for (name, category) in categories {
            self.categories.insert(canonical_key(name), *category);
        }
        self
    }

    pub fn tier(&self, name: &str) -> u8 {
        self.tiers
            .get(&canonical_key(name))
            .copied()
            .unwrap_or(DEFAULT_TIER)
    }

    /// Category for a name, or `None` when neither the exact table nor any
    /// keyword rule knows it. The profession's own rules go before the
    /// shared ones.
    pub fn category(&self, name: &str, profession: Profession) -> Option<Category> {
        let key = canonical_key(name);
        if let Some(category) = self.categories.get(&key) {
            return Some(*category);
        }
        let tokens: Vec<&str> = key
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|t| !t.is_empty())
            .collect();
        let own: &[(Category, &[&str])] = PROFESSION_RULES
            .iter()
            .find(|(p, _)| *p == profession)
            .map(|(_, rules)| *rules)
            .unwrap_or(&[]);
        own.iter()
            .chain(KEYWORD_RULES)
            .find(|(_, words)| tokens.iter().any(|t| words.contains(t)))
            .map(|(category, _)| *category)
    }

    pub fn inline_names(&self) -> &[InlineName] {
        &self.inline
    }
}

fn inline_pattern(name: &str) -> Regex {
    let pattern = format!(r"(?i)(?:(\d{{1,6}})\s*[x×]?\s*)?\b{}\b", regex::escape(name));
    // Escaped literal names always compile.
    Regex::new(&pattern).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_with_default() {
        let lex = Lexicon::builtin();
        assert_eq!(lex.tier("Rugged Leather"), 1);
        assert_eq!(lex.tier("star ruby"), 3);
        assert_eq!(lex.tier("Some Unheard Of Thing"), DEFAULT_TIER);
    }

    #[test]
    fn exact_table_beats_keywords() {
        let lex = Lexicon::builtin();
        assert_eq!(lex.category("Rough Stone", Profession::Blacksmithing), Some(Category::Metal));
        assert_eq!(lex.category("Essence of Fire", Profession::Alchemy), Some(Category::Elemental));
        assert_eq!(
            lex.category("Greater Eternal Essence", Profession::Enchanting),
            Some(Category::Enchanting)
        );
    }

    #[test]
    fn keyword_rules_match_whole_tokens() {
        let lex = Lexicon::builtin();
        let cat = |name| lex.category(name, Profession::Alchemy);
        assert_eq!(cat("Peacebloom"), Some(Category::Herb));
        assert_eq!(cat("Copper Bar"), Some(Category::Metal));
        assert_eq!(cat("Bronze Tube"), Some(Category::Component));
        assert_eq!(cat("Empty Vial"), Some(Category::Consumable));
        assert_eq!(cat("Khadgar's Whisker"), None);
        // "tin" must not fire inside "Tinsel"
        assert_eq!(cat("Tinsel"), None);
    }

    #[test]
    fn profession_rules_come_first() {
        let lex = Lexicon::builtin();
        assert_eq!(lex.category("Elemental Flux", Profession::Blacksmithing), Some(Category::Enhancement));
        assert_eq!(lex.category("Elemental Flux", Profession::Engineering), Some(Category::Metal));
        assert_eq!(lex.category("Heavy Silken Thread", Profession::Leatherworking), Some(Category::Thread));
        assert_eq!(lex.category("Heavy Silken Thread", Profession::Tailoring), Some(Category::Cloth));
        assert_eq!(lex.category("Wind Scales", Profession::Leatherworking), Some(Category::Scale));
        assert_eq!(lex.category("Wind Scales", Profession::Jewelcrafting), Some(Category::Leather));
    }

    #[test]
    fn overrides_merge() {
        let tiers = HashMap::from([("Star Ruby".to_string(), 1u8)]);
        let cats = HashMap::from([("Green Dye".to_string(), Category::Pigment)]);
        let lex = Lexicon::builtin().with_overrides(&tiers, &cats);
        assert_eq!(lex.tier("Star Ruby"), 1);
        assert_eq!(lex.category("green dye", Profession::Leatherworking), Some(Category::Pigment));
    }

    #[test]
    fn inline_pattern_captures_leading_quantity() {
        let lex = Lexicon::builtin();
        let bar = lex.inline_names().iter().find(|n| n.name == "Ghost Iron Bar").unwrap();
        let caps = bar.pattern.captures("Smelt 20x ghost iron bar first").unwrap();
        assert_eq!(caps.get(1).map(|m| m.as_str()), Some("20"));
        let caps = bar.pattern.captures("You need Ghost Iron Bar here").unwrap();
        assert!(caps.get(1).is_none());
    }
}
