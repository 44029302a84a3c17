use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// Material categories understood by the shopping-list importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Category {
    Herb,
    Gem,
    Elemental,
    Metal,
    Leather,
    Cloth,
    Enchanting,
    Pigment,
    Cooking,
    Component,
    Potion,
    Consumable,
    Enhancement,
    Scale,
    Thread,
    Other,
}

impl Category {
    pub const ALL: [Category; 16] = [
        Category::Herb,
        Category::Gem,
        Category::Elemental,
        Category::Metal,
        Category::Leather,
        Category::Cloth,
        Category::Enchanting,
        Category::Pigment,
        Category::Cooking,
        Category::Component,
        Category::Potion,
        Category::Consumable,
        Category::Enhancement,
        Category::Scale,
        Category::Thread,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Herb => "Herb",
            Category::Gem => "Gem",
            Category::Elemental => "Elemental",
            Category::Metal => "Metal",
            Category::Leather => "Leather",
            Category::Cloth => "Cloth",
            Category::Enchanting => "Enchanting",
            Category::Pigment => "Pigment",
            Category::Cooking => "Cooking",
            Category::Component => "Component",
            Category::Potion => "Potion",
            Category::Consumable => "Consumable",
            Category::Enhancement => "Enhancement",
            Category::Scale => "Scale",
            Category::Thread => "Thread",
            Category::Other => "Other",
        }
    }

    /// Category path as written into the shopping-list line.
    pub fn path(self) -> String {
        format!("Reagents/{}", self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches("Reagents/");
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownCategory(s.to_string()))
    }
}

impl TryFrom<String> for Category {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Identifies the alternatives extracted from one "A or B" construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChoiceGroupId(pub u32);

/// One tentative extraction from a line of guide text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    pub name: String,
    pub quantity: u32,
    pub choice_group: Option<ChoiceGroupId>,
    pub source_order: usize,
}

/// A resolved, normalized shopping-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialEntry {
    pub name: String,
    pub category: Category,
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parsing() {
        assert_eq!("metal".parse::<Category>().unwrap(), Category::Metal);
        assert_eq!("Reagents/Herb".parse::<Category>().unwrap(), Category::Herb);
        assert!("Sword".parse::<Category>().is_err());
        assert_eq!(Category::Cloth.path(), "Reagents/Cloth");
        assert_eq!("Scale".parse::<Category>().unwrap(), Category::Scale);
    }
}
