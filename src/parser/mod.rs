pub mod blocks;
pub mod choice;
pub mod lexicon;
pub mod normalize;
pub mod sections;
pub mod shopping;
pub mod tokens;

use tracing::debug;

use crate::catalog::{Expansion, Profession};
use crate::model::MaterialEntry;
use lexicon::Lexicon;
use normalize::{MentionPolicy, Normalizer};
use sections::{NotFound, Tier};

/// What happened while extracting one (profession, expansion) page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    pub located: Result<Tier, NotFound>,
    pub rejected: usize,
    pub dropped: usize,
    pub discarded_alternatives: usize,
    pub category_misses: usize,
}

#[derive(Debug)]
pub struct Extraction {
    pub entries: Vec<MaterialEntry>,
    pub diagnostics: Diagnostics,
}

/// Pipeline: html → blocks → located candidates → resolved choices → entries.
/// Pure and synchronous; the same page always yields the same entries.
/// The profession only steers categorisation.
pub fn extract(
    html: &str,
    profession: Profession,
    expansion: Expansion,
    lexicon: &Lexicon,
    policy: MentionPolicy,
) -> Extraction {
    let blocks = blocks::flatten_document(html);
    let located = match sections::locate(&blocks, expansion, lexicon) {
        Ok(located) => located,
        Err(reason) => {
            return Extraction {
                entries: Vec::new(),
                diagnostics: Diagnostics {
                    located: Err(reason),
                    rejected: 0,
                    dropped: 0,
                    discarded_alternatives: 0,
                    category_misses: 0,
                },
            }
        }
    };

    let (candidates, discarded) = choice::collapse_groups(located.candidates, lexicon);
    let normalized = Normalizer::new(lexicon, profession, policy).normalize(candidates);
    debug!(
        %profession,
        %expansion,
        tier = %located.tier,
        entries = normalized.entries.len(),
        "extracted materials"
    );

    Extraction {
        entries: normalized.entries,
        diagnostics: Diagnostics {
            located: Ok(located.tier),
            rejected: located.rejected,
            dropped: normalized.dropped,
            discarded_alternatives: discarded,
            category_misses: normalized.category_misses,
        },
    }
}
