//! Choice-group resolution.
//!
//! Picks one alternative out of an "A or B" group using the lexicon's static
//! cost tiers. This is a fixed heuristic standing in for "the cheapest
//! option historically"; it knows nothing about live auction prices.

use std::collections::BTreeMap;

use super::lexicon::Lexicon;
use super::normalize::strip_fragments;
use crate::model::{ChoiceGroupId, RawCandidate};

/// Lowest tier wins; equal tiers go to the alternative seen first.
/// Tiers are looked up on the cleaned name, so split leftovers such as a
/// dangling bracket do not hide an item from the tier table.
/// An empty group resolves to nothing.
pub fn resolve(group: Vec<RawCandidate>, lexicon: &Lexicon) -> Option<RawCandidate> {
    group
        .into_iter()
        .min_by_key(|c| (lexicon.tier(&strip_fragments(&c.name)), c.source_order))
}

/// Replace every choice group in `candidates` by its resolved alternative,
/// keeping ungrouped candidates as they are. Returns the survivors in
/// document order and how many alternatives were discarded.
pub fn collapse_groups(candidates: Vec<RawCandidate>, lexicon: &Lexicon) -> (Vec<RawCandidate>, usize) {
    let mut plain = Vec::new();
    let mut groups: BTreeMap<ChoiceGroupId, Vec<RawCandidate>> = BTreeMap::new();
    let mut grouped = 0;

    for candidate in candidates {
        match candidate.choice_group {
            Some(id) => {
                grouped += 1;
                groups.entry(id).or_default().push(candidate);
            }
            None => plain.push(candidate),
        }
    }

    let mut kept = 0;
    for group in groups.into_values() {
        if let Some(winner) = resolve(group, lexicon) {
            kept += 1;
            plain.push(winner);
        }
    }

    plain.sort_by_key(|c| c.source_order);
    (plain, grouped - kept)
}
