use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use super::lexicon::Lexicon;
use crate::catalog::Profession;
use crate::model::{Category, MaterialEntry, RawCandidate};

static TRAILING_CONNECTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:\s+(?:or|and)|\s*[&/+])\s*$").unwrap());
static LEADING_CONNECTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:(?:or|and)\s+|[&/+]\s*)").unwrap());
static UNCLOSED_BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[(\[][^)\]]*$").unwrap());
static NUMERIC_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-–]?\s*\d+(?:\s*[-–]\s*\d+)?\b").unwrap());
static CONNECTOR_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:or|and|x|&)$").unwrap());
static QUANTIFIED_CHOICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d\s+or\b|\bor\s+\d").unwrap());

/// What a repeated mention of the same item within one scope means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MentionPolicy {
    /// Every mention is another purchase round; quantities add up.
    #[default]
    Sum,
    /// Later mentions restate the first one and are ignored.
    FirstMention,
}

/// Deduplication key: lower-case with whitespace collapsed.
pub fn canonical_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Remove leftovers of choice-group extraction and characters the
/// shopping-list format cannot carry.
pub fn strip_fragments(name: &str) -> String {
    let mut s: String = name.replace(['"', ';', '^'], "");
    if !s.contains('(') {
        s = s.replace(')', "");
    }
    if !s.contains('[') {
        s = s.replace(']', "");
    }
    if let Some(pos) = s.find(',') {
        s.truncate(pos);
    }
    loop {
        let before = s.len();
        s = UNCLOSED_BRACKET_RE.replace(&s, "").into_owned();
        s = TRAILING_CONNECTOR_RE.replace(&s, "").into_owned();
        s = LEADING_CONNECTOR_RE.replace(s.trim(), "").into_owned();
        s = s
            .trim_matches(|c: char| c.is_whitespace() || ".:-–—*•·!?".contains(c))
            .to_string();
        if s.len() == before {
            break;
        }
    }
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Names that survived the token parser but still cannot be shopping-list items.
pub fn is_malformed(name: &str) -> bool {
    let letters = name.chars().filter(|c| c.is_alphabetic()).count();
    letters < 2
        || name.chars().count() < 3
        || NUMERIC_RANGE_RE.is_match(name)
        || CONNECTOR_ONLY_RE.is_match(name)
        || TRAILING_CONNECTOR_RE.is_match(name)
        || QUANTIFIED_CHOICE_RE.is_match(name)
}

#[derive(Debug, Default)]
pub struct Normalized {
    pub entries: Vec<MaterialEntry>,
    pub dropped: usize,
    pub category_misses: usize,
}

struct Slot {
    name: String,
    key: String,
    quantity: u32,
    first_order: usize,
}

pub struct Normalizer<'a> {
    lexicon: &'a Lexicon,
    profession: Profession,
    policy: MentionPolicy,
}

impl<'a> Normalizer<'a> {
    pub fn new(lexicon: &'a Lexicon, profession: Profession, policy: MentionPolicy) -> Self {
        Normalizer {
            lexicon,
            profession,
            policy,
        }
    }

    /// Clean, validate, merge and categorise every candidate of one scope.
    /// The returned entries have unique canonical names.
    pub fn normalize<I>(&self, candidates: I) -> Normalized
    where
        I: IntoIterator<Item = RawCandidate>,
    {
        let mut out = Normalized::default();
        let mut slots: Vec<Slot> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for candidate in candidates {
            let name = strip_fragments(&candidate.name);
            if is_malformed(&name) {
                debug!(raw = %candidate.name, "dropping malformed entry");
                out.dropped += 1;
                continue;
            }
            let key = canonical_key(&name);
            match index.get(&key) {
                Some(&i) => {
                    let slot = &mut slots[i];
                    if self.policy == MentionPolicy::Sum {
                        slot.quantity = slot.quantity.saturating_add(candidate.quantity);
                    }
                    slot.first_order = slot.first_order.min(candidate.source_order);
                }
                None => {
                    index.insert(key.clone(), slots.len());
                    slots.push(Slot {
                        name,
                        key,
                        quantity: candidate.quantity,
                        first_order: candidate.source_order,
                    });
                }
            }
        }

        slots.sort_by(|a, b| {
            a.first_order
                .cmp(&b.first_order)
                .then_with(|| a.key.cmp(&b.key))
        });

        for slot in slots {
            let category = match self.lexicon.category(&slot.name, self.profession) {
                Some(c) => c,
                None => {
                    debug!(
                        item = %slot.name,
                        profession = %self.profession,
                        "no category match, using Other"
                    );
                    out.category_misses += 1;
                    Category::Other
                }
            };
            out.entries.push(MaterialEntry {
                name: slot.name,
                category,
                quantity: slot.quantity,
            });
        }

        out
    }
}
