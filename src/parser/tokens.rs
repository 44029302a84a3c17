//! Line-level quantity/name recognition.
//!
//! Each line is matched against an ordered table of patterns; the first
//! pattern that recognises the line supplies all of its candidates, so one
//! line never contributes twice.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::lexicon::Lexicon;
use super::normalize::canonical_key;
use crate::model::{ChoiceGroupId, RawCandidate};

static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\s\-–•*·>]+").unwrap());
static LEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\d+)\s*(?:[x×]\s*)?([\p{L}\["'(].*)$"#).unwrap()
});
static TRAILING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)(?:\s+[x×]|\s*[-–:])\s*(\d+)\s*$").unwrap()
});
static OR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s*\bor\b\s*").unwrap());
static PARENTHETICAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());
static PARENTHESISED_CHOICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(([^()]*\bor\b[^()]*)\)").unwrap());

/// Structural noise: page chrome and guide vocabulary that never names an item.
const DENY_TOKENS: &[&str] = &[
    "recipe", "recipes", "skill", "skills", "level", "levels", "leveling", "point", "points",
    "guide", "guides", "section", "total", "cost", "costs", "requires", "required", "trainer",
    "trainers", "step", "steps", "click", "here", "comment", "comments", "reply", "login",
    "share", "materials", "reagents", "shopping", "list", "approximate", "approximately",
    "updated", "patch", "you", "your",
];

/// Measurement units that only count as an item when qualified by a material word.
const CURRENCY_TOKENS: &[&str] = &["gold", "silver", "copper"];

const MATERIAL_QUALIFIERS: &[&str] = &[
    "bar", "bars", "ore", "rod", "wire", "powder", "tube", "contact", "bolts", "leaf", "thread",
    "ingot", "nugget", "dust", "spool", "filigree", "modulator", "core", "setting", "trigger",
];

const TIME_TOKENS: &[&str] = &[
    "sec", "second", "seconds", "min", "minute", "minutes", "hour", "hours", "day", "days",
];

const CONNECTOR_TOKENS: &[&str] = &["or", "and", "x"];

/// Where a line came from, which decides how permissive recognition is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineContext {
    /// Inside a located materials summary.
    Summary,
    /// Whole-document fallback scan: only tidy, item-like names pass.
    Strict,
    /// Discovery-style guide: known names are picked out of running prose.
    Inline,
}

/// One pattern hit before quantity parsing and name validation.
#[derive(Debug, Clone, PartialEq)]
struct Hit {
    name: String,
    quantity: String,
}

#[derive(Debug, Clone, PartialEq)]
struct LineMatch {
    hits: Vec<Hit>,
    choice: bool,
}

type Pattern = fn(&str) -> Option<LineMatch>;

/// Tried in order; the first `Some` wins.
const PATTERNS: &[(&str, Pattern)] = &[
    ("choice", choice_pattern),
    ("leading", leading_pattern),
    ("trailing", trailing_pattern),
];

/// One side of a choice, in leading or trailing form.
fn alternative(alt: &str) -> Option<Hit> {
    if let Some(caps) = LEADING_RE.captures(alt) {
        return Some(Hit {
            name: caps[2].to_string(),
            quantity: caps[1].to_string(),
        });
    }
    TRAILING_RE.captures(alt).map(|caps| Hit {
        name: caps[1].to_string(),
        quantity: caps[2].to_string(),
    })
}

/// `72x Rugged Leather or 9x Star Ruby`, `4x Iron Bar, 2x Gold Bar OR 1x Mithril Bar`,
/// `20x Mageweave or Silk Cloth` (quantity shared), `Copper Bar x 20 or Tin Bar x 20`,
/// `9x Star Ruby (or 72x Rugged Leather)`.
fn choice_pattern(line: &str) -> Option<LineMatch> {
    if !OR_RE.is_match(line) {
        return None;
    }
    let line = PARENTHESISED_CHOICE_RE.replace_all(line, " $1 ");
    let alternatives: Vec<&str> = OR_RE
        .split(&line)
        .flat_map(|part| part.split(','))
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .collect();
    if alternatives.len() < 2 {
        return None;
    }
    let shared = alternative(alternatives[0])?.quantity;
    let hits = alternatives
        .iter()
        .map(|alt| {
            alternative(alt).unwrap_or_else(|| Hit {
                name: alt.to_string(),
                quantity: shared.clone(),
            })
        })
        .collect();
    Some(LineMatch { hits, choice: true })
}

/// `133x Rough Stone`, `35 x Green Dye`, `60 Peacebloom`, or a comma-joined run
/// of those on one line.
fn leading_pattern(line: &str) -> Option<LineMatch> {
    let caps = LEADING_RE.captures(line)?;
    let segments: Vec<&str> = line.split(',').map(str::trim).collect();
    if segments.len() > 1 && segments.iter().all(|s| LEADING_RE.is_match(s)) {
        let hits = segments
            .iter()
            .filter_map(|s| LEADING_RE.captures(s))
            .map(|c| Hit {
                name: c[2].to_string(),
                quantity: c[1].to_string(),
            })
            .collect();
        return Some(LineMatch { hits, choice: false });
    }
    Some(LineMatch {
        hits: vec![Hit {
            name: caps[2].to_string(),
            quantity: caps[1].to_string(),
        }],
        choice: false,
    })
}

/// `Peacebloom x 60`, `Peacebloom - 60`, `Peacebloom: 60`.
fn trailing_pattern(line: &str) -> Option<LineMatch> {
    let caps = TRAILING_RE.captures(line)?;
    Some(LineMatch {
        hits: vec![Hit {
            name: caps[1].to_string(),
            quantity: caps[2].to_string(),
        }],
        choice: false,
    })
}

/// Tidy a raw name and decide whether it can name an item at all.
/// Checks work on whole tokens so "Copper Bar" survives the currency rule
/// and nothing is rejected for merely containing a stop-word.
pub fn validate_name(raw: &str, strict: bool) -> Option<String> {
    let without_remarks = PARENTHETICAL_RE.replace_all(raw, " ");
    let tidy = without_remarks
        .replace(['[', ']'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let tidy = tidy
        .trim_matches(|c: char| c.is_whitespace() || ".,:;-–—*•·!?".contains(c))
        .to_string();

    if tidy.chars().count() < 3 || tidy.chars().filter(|c| c.is_alphabetic()).count() < 2 {
        return None;
    }

    let lower = tidy.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.iter().all(|t| CONNECTOR_TOKENS.contains(t)) {
        return None;
    }
    if tokens.iter().any(|t| DENY_TOKENS.contains(t) || TIME_TOKENS.contains(t)) {
        return None;
    }
    if tokens.iter().any(|t| CURRENCY_TOKENS.contains(t))
        && !tokens.iter().any(|t| MATERIAL_QUALIFIERS.contains(t))
    {
        return None;
    }

    if strict {
        let starts_well = tidy
            .chars()
            .next()
            .is_some_and(|c| c.is_uppercase() || c == '\'' || c == '"');
        if !starts_well
            || tidy.chars().any(|c| c.is_ascii_digit())
            || tidy.split_whitespace().count() > 6
        {
            return None;
        }
    }

    Some(tidy)
}

/// Turns lines into [`RawCandidate`]s, numbering them in document order and
/// handing out choice-group ids. One parser is used per scope.
pub struct TokenParser<'a> {
    lexicon: &'a Lexicon,
    next_order: usize,
    next_group: u32,
    rejected: usize,
}

impl<'a> TokenParser<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        TokenParser {
            lexicon,
            next_order: 0,
            next_group: 0,
            rejected: 0,
        }
    }

    /// Candidates rejected so far (bad quantity or unusable name).
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn parse_line(
        &mut self,
        line: &str,
        context: LineContext,
    ) -> std::vec::IntoIter<RawCandidate> {
        let line = BULLET_RE.replace(line.trim(), "");
        let line = line.trim();
        if line.is_empty() {
            return Vec::new().into_iter();
        }

        if context == LineContext::Inline {
            return self.mentions(line).into_iter();
        }

        for (kind, pattern) in PATTERNS {
            if let Some(m) = pattern(line) {
                trace!(pattern = kind, line, "line matched");
                return self.emit(m, context == LineContext::Strict).into_iter();
            }
        }
        Vec::new().into_iter()
    }

    fn emit(&mut self, m: LineMatch, strict: bool) -> Vec<RawCandidate> {
        let group = if m.choice {
            let id = ChoiceGroupId(self.next_group);
            self.next_group += 1;
            Some(id)
        } else {
            None
        };

        let mut out = Vec::with_capacity(m.hits.len());
        for hit in m.hits {
            let quantity = match hit.quantity.parse::<u32>() {
                Ok(q) if q > 0 => q,
                _ => {
                    self.rejected += 1;
                    continue;
                }
            };
            let Some(name) = validate_name(&hit.name, strict) else {
                self.rejected += 1;
                continue;
            };
            out.push(RawCandidate {
                name,
                quantity,
                choice_group: group,
                source_order: self.next_order,
            });
            self.next_order += 1;
        }
        out
    }

    /// Known names mentioned anywhere in the line, with the quantity written
    /// right before them or 1 when there is none. Where two known names
    /// overlap (`Windwool Cloth` inside `Bolt of Windwool Cloth`) only the
    /// longer match counts.
    fn mentions(&mut self, line: &str) -> Vec<RawCandidate> {
        // (start, end, name, quantity); a `None` quantity was unparseable.
        let mut found: Vec<(usize, usize, String, Option<u32>)> = Vec::new();
        for known in self.lexicon.inline_names() {
            for caps in known.pattern.captures_iter(line) {
                let Some(whole) = caps.get(0) else {
                    continue;
                };
                let quantity = match caps.get(1) {
                    Some(q) => q.as_str().parse::<u32>().ok().filter(|n| *n > 0),
                    None => Some(1),
                };
                found.push((whole.start(), whole.end(), known.name.clone(), quantity));
            }
        }

        found.sort_by_key(|(start, end, _, _)| (Reverse(end - start), *start));
        let mut kept: Vec<(usize, usize, String, Option<u32>)> = Vec::new();
        for hit in found {
            if kept.iter().all(|k| hit.1 <= k.0 || hit.0 >= k.1) {
                kept.push(hit);
            }
        }
        kept.sort_by_key(|(start, _, _, _)| *start);

        let mut out = Vec::with_capacity(kept.len());
        for (_, _, name, quantity) in kept {
            let Some(quantity) = quantity else {
                self.rejected += 1;
                continue;
            };
            out.push(RawCandidate {
                name,
                quantity,
                choice_group: None,
                source_order: self.next_order,
            });
            self.next_order += 1;
        }
        out
    }
}

/// Collapse inline mentions to one candidate per name, ordered by the
/// lexicon's priority rank and then by first mention. The largest quantity
/// seen for a name is kept.
pub fn rank_mentions(mentions: Vec<RawCandidate>, lexicon: &Lexicon) -> Vec<RawCandidate> {
    let ranks: HashMap<String, u8> = lexicon
        .inline_names()
        .iter()
        .map(|n| (canonical_key(&n.name), n.rank))
        .collect();

    let mut firsts: Vec<RawCandidate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for mention in mentions {
        let key = canonical_key(&mention.name);
        match index.get(&key) {
            Some(&i) => {
                let kept = &mut firsts[i];
                kept.quantity = kept.quantity.max(mention.quantity);
                kept.source_order = kept.source_order.min(mention.source_order);
            }
            None => {
                index.insert(key, firsts.len());
                firsts.push(mention);
            }
        }
    }

    firsts.sort_by_key(|c| {
        let rank = ranks.get(&canonical_key(&c.name)).copied().unwrap_or(u8::MAX);
        (rank, c.source_order)
    });
    for (order, candidate) in firsts.iter_mut().enumerate() {
        candidate.source_order = order;
    }
    firsts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Vec<RawCandidate> {
        let lex = Lexicon::builtin();
        let mut parser = TokenParser::new(&lex);
        parser.parse_line(line, LineContext::Summary).collect()
    }

    fn pairs(line: &str) -> Vec<(String, u32)> {
        parse(line).into_iter().map(|c| (c.name, c.quantity)).collect()
    }

    #[test]
    fn leading_quantity_forms() {
        assert_eq!(pairs("133x Rough Stone"), vec![("Rough Stone".to_string(), 133)]);
        assert_eq!(pairs("35 x Green Dye"), vec![("Green Dye".to_string(), 35)]);
        assert_eq!(pairs("60 Peacebloom"), vec![("Peacebloom".to_string(), 60)]);
        assert_eq!(pairs("5×Silk Cloth"), vec![("Silk Cloth".to_string(), 5)]);
        assert_eq!(pairs("• 20x [Copper Bar]"), vec![("Copper Bar".to_string(), 20)]);
    }

    #[test]
    fn comma_joined_leading_items() {
        assert_eq!(
            pairs("20x Copper Bar, 10x Tin Bar"),
            vec![("Copper Bar".to_string(), 20), ("Tin Bar".to_string(), 10)]
        );
    }

    #[test]
    fn trailing_quantity_forms() {
        assert_eq!(pairs("Peacebloom x 60"), vec![("Peacebloom".to_string(), 60)]);
        assert_eq!(pairs("Silverleaf - 45"), vec![("Silverleaf".to_string(), 45)]);
        assert_eq!(pairs("Briarthorn: 30"), vec![("Briarthorn".to_string(), 30)]);
    }

    #[test]
    fn choice_group_shares_one_id() {
        let c = parse("72x Rugged Leather or 9x Star Ruby");
        assert_eq!(c.len(), 2);
        assert!(c[0].choice_group.is_some());
        assert_eq!(c[0].choice_group, c[1].choice_group);
        assert_eq!((c[0].name.as_str(), c[0].quantity), ("Rugged Leather", 72));
        assert_eq!((c[1].name.as_str(), c[1].quantity), ("Star Ruby", 9));
    }

    #[test]
    fn choice_with_shared_quantity_and_commas() {
        let c = parse("20x Mageweave Cloth or Silk Cloth");
        assert_eq!(c.iter().map(|x| x.quantity).collect::<Vec<_>>(), vec![20, 20]);

        let c = parse("4x Iron Bar, 2x Gold Bar OR 1x Mithril Bar");
        assert_eq!(c.len(), 3);
        assert!(c.iter().all(|x| x.choice_group == c[0].choice_group));
    }

    #[test]
    fn choice_inside_parentheses() {
        let c = parse("9x Star Ruby (or 72x Rugged Leather)");
        let got: Vec<(&str, u32)> = c.iter().map(|x| (x.name.as_str(), x.quantity)).collect();
        assert_eq!(got, vec![("Star Ruby", 9), ("Rugged Leather", 72)]);
        assert_eq!(c[0].choice_group, c[1].choice_group);
    }

    #[test]
    fn choice_with_trailing_quantities() {
        let c = parse("Copper Bar x 20 or Tin Bar x 20");
        let got: Vec<(&str, u32)> = c.iter().map(|x| (x.name.as_str(), x.quantity)).collect();
        assert_eq!(got, vec![("Copper Bar", 20), ("Tin Bar", 20)]);
        assert!(c[0].choice_group.is_some());

        let c = parse("Iron Bar: 4 or Mithril Bar");
        assert_eq!(c.iter().map(|x| x.quantity).collect::<Vec<_>>(), vec![4, 4]);
    }

    #[test]
    fn separate_lines_get_separate_groups() {
        let lex = Lexicon::builtin();
        let mut parser = TokenParser::new(&lex);
        let a: Vec<_> = parser.parse_line("2x Iron Bar or 2x Tin Bar", LineContext::Summary).collect();
        let b: Vec<_> = parser.parse_line("3x Iron Bar or 3x Tin Bar", LineContext::Summary).collect();
        assert_ne!(a[0].choice_group, b[0].choice_group);
        assert!(b[0].source_order > a[1].source_order);
    }

    #[test]
    fn ore_is_not_an_or_connector() {
        let c = parse("40x Copper Ore");
        assert_eq!(c.len(), 1);
        assert!(c[0].choice_group.is_none());
    }

    #[test]
    fn rejects_bad_quantities() {
        let lex = Lexicon::builtin();
        let mut parser = TokenParser::new(&lex);
        assert_eq!(parser.parse_line("0x Peacebloom", LineContext::Summary).count(), 0);
        assert_eq!(parser.parse_line("99999999999x Peacebloom", LineContext::Summary).count(), 0);
        assert_eq!(parser.rejected(), 2);
    }

    #[test]
    fn dangling_connector_line_yields_nothing() {
        assert!(parse("-300 OR").is_empty());
        assert!(parse("1 - 75").is_empty());
    }

    #[test]
    fn noise_names_rejected() {
        assert!(parse("50 gold").is_empty());
        assert!(parse("15 minutes").is_empty());
        assert!(parse("300 skill points").is_empty());
        assert!(parse("Total: 42").is_empty());
        assert!(parse("3x ..").is_empty());
    }

    #[test]
    fn currency_word_with_material_qualifier_kept() {
        assert_eq!(pairs("10x Copper Bar"), vec![("Copper Bar".to_string(), 10)]);
        assert_eq!(pairs("6x Silver Contact"), vec![("Silver Contact".to_string(), 6)]);
        assert_eq!(validate_name("Gold", false), None);
    }

    #[test]
    fn stop_words_match_whole_tokens_only() {
        // "list" and "level" are deny tokens; names containing them as substrings survive.
        assert_eq!(validate_name("Glistening Scale", false).as_deref(), Some("Glistening Scale"));
        assert_eq!(validate_name("Copperhead Venom", false).as_deref(), Some("Copperhead Venom"));
    }

    #[test]
    fn parenthetical_remarks_removed() {
        assert_eq!(
            pairs("60x Rough Stone (for Rough Grinding Stone)"),
            vec![("Rough Stone".to_string(), 60)]
        );
    }

    #[test]
    fn strict_context_is_pickier() {
        let lex = Lexicon::builtin();
        let mut parser = TokenParser::new(&lex);
        assert_eq!(parser.parse_line("5 apples and pears for the long road home", LineContext::Strict).count(), 0);
        assert_eq!(parser.parse_line("12x Wool Cloth", LineContext::Strict).count(), 1);
    }

    #[test]
    fn inline_mentions_and_ranking() {
        let lex = Lexicon::builtin();
        let mut parser = TokenParser::new(&lex);
        let mut all = Vec::new();
        all.extend(parser.parse_line("Learn it and craft it with Golden Lotus.", LineContext::Inline));
        all.extend(parser.parse_line("You will need 20x Ghost Iron Bar and some Windwool Cloth", LineContext::Inline));
        all.extend(parser.parse_line("Later, 40 Ghost Iron Bar again.", LineContext::Inline));
        let ranked = rank_mentions(all, &lex);
        let got: Vec<(&str, u32)> = ranked.iter().map(|c| (c.name.as_str(), c.quantity)).collect();
        assert_eq!(got, vec![("Ghost Iron Bar", 40), ("Windwool Cloth", 1), ("Golden Lotus", 1)]);
        assert_eq!(ranked.iter().map(|c| c.source_order).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn longer_known_name_swallows_the_shorter_one() {
        let lex = Lexicon::builtin();
        let mut parser = TokenParser::new(&lex);
        let got: Vec<(String, u32)> = parser
            .parse_line("Make 80 Bolt of Windwool Cloth.", LineContext::Inline)
            .map(|c| (c.name, c.quantity))
            .collect();
        assert_eq!(got, vec![("Bolt of Windwool Cloth".to_string(), 80)]);

        let got: Vec<(String, u32)> = parser
            .parse_line("Turn 400 Windwool Cloth into 80 Bolt of Windwool Cloth", LineContext::Inline)
            .map(|c| (c.name, c.quantity))
            .collect();
        assert_eq!(
            got,
            vec![("Windwool Cloth".to_string(), 400), ("Bolt of Windwool Cloth".to_string(), 80)]
        );
    }

    #[test]
    fn bare_mentions_only_in_inline_context() {
        let lex = Lexicon::builtin();
        let mut parser = TokenParser::new(&lex);
        assert_eq!(parser.parse_line("Some Ghost Iron Bar is needed", LineContext::Summary).count(), 0);
        assert_eq!(parser.parse_line("Some Ghost Iron Bar is needed", LineContext::Inline).count(), 1);
    }
}
