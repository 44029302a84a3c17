use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use super::blocks::Block;
use super::lexicon::Lexicon;
use super::shopping::parse_export_line;
use super::tokens::{rank_mentions, LineContext, TokenParser};
use crate::catalog::{Expansion, GuideLayout};
use crate::model::RawCandidate;

static SKILL_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{1,3}\s*[-–]\s*\d{1,3}\b").unwrap());
static WALKTHROUGH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:step[- ]by[- ]step|walkthrough|leveling steps|how to level)\b").unwrap()
});

const ANCHOR_PHRASES: &[&str] = &[
    "approximate materials required",
    "materials required",
    "shopping list",
    "materials needed",
    "reagents needed",
];

const ANCHOR_IDS: &[&str] = &[
    "materials",
    "materials-required",
    "shopping-list",
    "approximate-materials-required",
];

/// How the materials were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Heading,
    ShoppingString,
    WideNet,
    Inline,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Heading => "heading",
            Tier::ShoppingString => "shopping-string",
            Tier::WideNet => "wide-net",
            Tier::Inline => "inline",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NotFound {
    #[error("unsupported layout")]
    UnsupportedLayout,
    #[error("no materials")]
    NoMaterials,
}

#[derive(Debug)]
pub struct Located {
    pub tier: Tier,
    pub candidates: Vec<RawCandidate>,
    pub rejected: usize,
}

/// Find the materials of one guide page and turn them into raw candidates.
pub fn locate(
    blocks: &[Block],
    expansion: Expansion,
    lexicon: &Lexicon,
) -> Result<Located, NotFound> {
    match expansion.layout() {
        GuideLayout::SkillRanges => return Err(NotFound::UnsupportedLayout),
        GuideLayout::Discovery => return inline_scan(blocks, lexicon),
        GuideLayout::Summary => {}
    }

    let mut rejected = 0;
    for (idx, level) in anchors(blocks) {
        let mut parser = TokenParser::new(lexicon);
        let candidates: Vec<RawCandidate> = region(blocks, idx, level)
            .iter()
            .flat_map(|b| parser.parse_line(b.text(), LineContext::Summary))
            .collect();
        rejected += parser.rejected();
        if !candidates.is_empty() {
            return Ok(Located {
                tier: Tier::Heading,
                candidates,
                rejected,
            });
        }
        debug!(anchor = blocks[idx].text(), "anchor region yielded nothing");
    }

    let candidates = shopping_strings(blocks);
    if !candidates.is_empty() {
        return Ok(Located {
            tier: Tier::ShoppingString,
            candidates,
            rejected,
        });
    }

    let mut parser = TokenParser::new(lexicon);
    let candidates: Vec<RawCandidate> = blocks
        .iter()
        .filter(|b| matches!(b, Block::Item(_) | Block::Text(_)))
        .flat_map(|b| parser.parse_line(b.text(), LineContext::Strict))
        .collect();
    rejected += parser.rejected();
    if candidates.is_empty() {
        return Err(NotFound::NoMaterials);
    }
    Ok(Located {
        tier: Tier::WideNet,
        candidates,
        rejected,
    })
}

fn is_anchor(block: &Block) -> bool {
    if !matches!(block, Block::Heading { .. } | Block::Emphasis(_)) {
        return false;
    }
    if block.id().is_some_and(|id| ANCHOR_IDS.contains(&id.to_lowercase().as_str())) {
        return true;
    }
    let lower = block.text().to_lowercase();
    ANCHOR_PHRASES.iter().any(|p| lower.contains(p))
}

/// Anchor positions with their heading level, in document order.
fn anchors(blocks: &[Block]) -> Vec<(usize, u8)> {
    blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| is_anchor(b))
        .filter_map(|(i, b)| b.level().map(|level| (i, level)))
        .collect()
}

/// Skill-range lines and walkthrough wording mark where the leveling steps begin.
pub fn is_stop_indicator(text: &str) -> bool {
    SKILL_RANGE_RE.is_match(text) || WALKTHROUGH_RE.is_match(text)
}

/// Whether `block` closes a region opened by an anchor of `anchor_level`.
pub fn ends_region(block: &Block, anchor_level: u8) -> bool {
    block.level().is_some_and(|level| level <= anchor_level) || is_stop_indicator(block.text())
}

fn region(blocks: &[Block], anchor: usize, level: u8) -> &[Block] {
    let rest = &blocks[anchor + 1..];
    let end = rest
        .iter()
        .position(|b| ends_region(b, level))
        .unwrap_or(rest.len());
    &rest[..end]
}

fn shopping_strings(blocks: &[Block]) -> Vec<RawCandidate> {
    blocks
        .iter()
        .filter_map(|b| parse_export_line(b.text()))
        .flatten()
        .enumerate()
        .map(|(order, (name, quantity))| RawCandidate {
            name,
            quantity,
            choice_group: None,
            source_order: order,
        })
        .collect()
}

fn inline_scan(blocks: &[Block], lexicon: &Lexicon) -> Result<Located, NotFound> {
    let mut parser = TokenParser::new(lexicon);
    let mentions: Vec<RawCandidate> = blocks
        .iter()
        .flat_map(|b| parser.parse_line(b.text(), LineContext::Inline))
        .collect();
    if mentions.is_empty() {
        return Err(NotFound::NoMaterials);
    }
    Ok(Located {
        tier: Tier::Inline,
        candidates: rank_mentions(mentions, lexicon),
        rejected: parser.rejected(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::blocks::flatten_document;

    fn names(located: &Located) -> Vec<(&str, u32)> {
        located
            .candidates
            .iter()
            .map(|c| (c.name.as_str(), c.quantity))
            .collect()
    }

    #[test]
    fn stop_indicators() {
        assert!(is_stop_indicator("1 - 75"));
        assert!(is_stop_indicator("75–150 Minor Healing Potion"));
        assert!(is_stop_indicator("Step-by-step leveling"));
        assert!(!is_stop_indicator("133x Rough Stone"));
        assert!(!is_stop_indicator("Silverleaf - 45"));
    }

    #[test]
    fn region_ends_at_equal_or_higher_heading() {
        let h2 = Block::Heading { level: 2, text: "Next".into(), id: None };
        let h3 = Block::Heading { level: 3, text: "Herbs".into(), id: None };
        assert!(ends_region(&h2, 2));
        assert!(!ends_region(&h3, 2));
        assert!(ends_region(&Block::Text("1-75".into()), 2));
        assert!(!ends_region(&Block::Item("60 Peacebloom".into()), 2));
    }

    #[test]
    fn heading_tier_reads_only_the_summary() {
        let html = r#"
            <h1>Alchemy Guide</h1>
            <p>Train with 10x Copper Bar in hand.</p>
            <h2>Approximate Materials Required</h2>
            <h3>Herbs</h3>
            <ul><li>60x Peacebloom</li><li>Silverleaf - 45</li></ul>
            <h2>1 - 60</h2>
            <ul><li>60x Minor Healing Potion</li></ul>
        "#;
        let lex = Lexicon::builtin();
        let located = locate(&flatten_document(html), Expansion::Vanilla, &lex).unwrap();
        assert_eq!(located.tier, Tier::Heading);
        assert_eq!(names(&located), vec![("Peacebloom", 60), ("Silverleaf", 45)]);
    }

    #[test]
    fn empty_anchor_falls_through_to_next() {
        let html = r#"
            <p><strong>Materials Required</strong></p>
            <p>Most of this can be farmed.</p>
            <h2 id="shopping-list">Buy these</h2>
            <ul><li>20x Linen Cloth</li></ul>
        "#;
        let lex = Lexicon::builtin();
        let located = locate(&flatten_document(html), Expansion::Vanilla, &lex).unwrap();
        assert_eq!(names(&located), vec![("Linen Cloth", 20)]);
    }

    #[test]
    fn shopping_string_tier() {
        let html = r#"
            <h2>Import</h2>
            <textarea>Alchemy^"Peacebloom";Reagents/Herb;0;0;0;0;0;0;0;0;;#;0;60</textarea>
        "#;
        let lex = Lexicon::builtin();
        let located = locate(&flatten_document(html), Expansion::Outland, &lex).unwrap();
        assert_eq!(located.tier, Tier::ShoppingString);
        assert_eq!(names(&located), vec![("Peacebloom", 60)]);
    }

    #[test]
    fn wide_net_is_strict() {
        let html = r#"
            <h2>Leveling</h2>
            <p>Make 15 copies of whatever is cheap.</p>
            <ul><li>12x Wool Cloth</li></ul>
        "#;
        let lex = Lexicon::builtin();
        let located = locate(&flatten_document(html), Expansion::Vanilla, &lex).unwrap();
        assert_eq!(located.tier, Tier::WideNet);
        assert_eq!(names(&located), vec![("Wool Cloth", 12)]);
    }

    #[test]
    fn skill_range_layouts_short_circuit() {
        let html = "<h2>Materials Required</h2><ul><li>20x Leystone Ore</li></ul>";
        let lex = Lexicon::builtin();
        let blocks = flatten_document(html);
        assert_eq!(locate(&blocks, Expansion::Draenor, &lex).unwrap_err(), NotFound::UnsupportedLayout);
        assert_eq!(locate(&blocks, Expansion::Legion, &lex).unwrap_err(), NotFound::UnsupportedLayout);
    }

    #[test]
    fn nothing_found() {
        let lex = Lexicon::builtin();
        let blocks = flatten_document("<p>nothing to see here</p>");
        assert_eq!(locate(&blocks, Expansion::Vanilla, &lex).unwrap_err(), NotFound::NoMaterials);
    }

    #[test]
    fn pandaria_uses_inline_mentions() {
        let html = r#"
            <h2>Materials Required</h2>
            <ul><li>999x Copper Bar</li></ul>
            <p>Gather Golden Lotus when you see it, then smelt 30x Ghost Iron Bar.</p>
        "#;
        let lex = Lexicon::builtin();
        let located = locate(&flatten_document(html), Expansion::Pandaria, &lex).unwrap();
        assert_eq!(located.tier, Tier::Inline);
        assert_eq!(names(&located), vec![("Ghost Iron Bar", 30), ("Golden Lotus", 1)]);
    }
}
