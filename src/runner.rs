use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::catalog::{Expansion, GuideLayout, Profession};
use crate::config::Settings;
use crate::error::FetchError;
use crate::fetch::GuideFetcher;
use crate::output::{self, ExpansionSection, ProfessionDocument};
use crate::parser::lexicon::Lexicon;
use crate::parser::normalize::MentionPolicy;
use crate::parser::{self, Extraction};
use crate::urls::resolve_url;

pub struct RunOptions {
    pub professions: Vec<Profession>,
    pub expansions: Vec<Expansion>,
    pub output: PathBuf,
    pub policy: MentionPolicy,
    pub rate_limit: Duration,
    pub delay: Duration,
    pub concurrency: usize,
}

#[derive(Debug, Default)]
pub struct RunStats {
    pub professions: usize,
    pub pages: usize,
    pub fetch_errors: usize,
    pub skipped: usize,
    pub not_found: usize,
    pub sections: usize,
    pub entries: usize,
}

impl RunStats {
    pub fn print(&self) {
        println!(
            "Wrote {} professions: {} sections, {} entries from {} pages ({} fetch errors, {} without materials, {} skipped).",
            self.professions,
            self.sections,
            self.entries,
            self.pages,
            self.fetch_errors,
            self.not_found,
            self.skipped,
        );
    }
}

struct Plan {
    profession: Profession,
    targets: Vec<(Expansion, String)>,
    skipped: usize,
}

/// Resolve every URL before any request goes out so configuration
/// problems fail the run up front.
fn plan(settings: &Settings, opts: &RunOptions) -> Result<Vec<Plan>> {
    let mut plans = Vec::with_capacity(opts.professions.len());
    for &profession in &opts.professions {
        let mut targets = Vec::new();
        let mut skipped = 0;
        for &expansion in &opts.expansions {
            if expansion.layout() == GuideLayout::SkillRanges {
                info!(%profession, %expansion, "skipping, guide has no materials summary");
                skipped += 1;
                continue;
            }
            targets.push((expansion, resolve_url(settings, profession, expansion)?));
        }
        plans.push(Plan {
            profession,
            targets,
            skipped,
        });
    }
    Ok(plans)
}

/// Scrape, extract and write one shopping list per profession.
pub async fn run(settings: &Settings, opts: &RunOptions, lexicon: &Lexicon) -> Result<RunStats> {
    let plans = plan(settings, opts)?;
    let fetcher = Arc::new(
        GuideFetcher::new(settings, opts.rate_limit).context("Failed to build HTTP client")?,
    );
    let single = plans.len() == 1;
    let mut stats = RunStats::default();

    for (i, plan) in plans.into_iter().enumerate() {
        if i > 0 && !opts.delay.is_zero() {
            info!("waiting {:.1}s before the next profession", opts.delay.as_secs_f64());
            tokio::time::sleep(opts.delay).await;
        }

        let profession = plan.profession;
        stats.skipped += plan.skipped;
        stats.pages += plan.targets.len();
        println!("Scraping {} ({} guides)...", profession.display_name(), plan.targets.len());

        let pages = fetch_all(&fetcher, plan.targets, opts.concurrency, &mut stats).await?;
        let extractions: Vec<(Expansion, Extraction)> = pages
            .par_iter()
            .map(|(expansion, html)| {
                (
                    *expansion,
                    parser::extract(html, profession, *expansion, lexicon, opts.policy),
                )
            })
            .collect();

        let doc = build_document(profession, extractions, &mut stats);
        let path = output::output_path(&opts.output, doc.profession, single);
        output::write_document(&doc, &path)?;
        stats.professions += 1;
        println!(
            "  -> {} sections written to {}",
            doc.rendered_sections(),
            path.display()
        );
    }

    Ok(stats)
}

async fn fetch_all(
    fetcher: &Arc<GuideFetcher>,
    targets: Vec<(Expansion, String)>,
    concurrency: usize,
    stats: &mut RunStats,
) -> Result<Vec<(Expansion, String)>> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let total = targets.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let (tx, mut rx) =
        tokio::sync::mpsc::channel::<(Expansion, String, Result<String, FetchError>)>(total.max(1));

    for (expansion, url) in targets {
        let fetcher = Arc::clone(fetcher);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            let result = fetcher.fetch(&url).await;
            let _ = tx.send((expansion, url, result)).await;
        });
    }
    drop(tx);

    let mut pages = Vec::with_capacity(total);
    while let Some((expansion, url, result)) = rx.recv().await {
        pb.set_message(expansion.display_name());
        match result {
            Ok(html) => pages.push((expansion, html)),
            Err(e) => {
                warn!(%expansion, url = %url, "{}; section omitted", e);
                stats.fetch_errors += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    pages.sort_by_key(|(expansion, _)| *expansion);
    Ok(pages)
}

fn build_document(
    profession: Profession,
    extractions: Vec<(Expansion, Extraction)>,
    stats: &mut RunStats,
) -> ProfessionDocument {
    let mut doc = ProfessionDocument::new(profession);
    for (expansion, extraction) in extractions {
        report(profession, expansion, &extraction);
        match extraction.diagnostics.located {
            Ok(_) if !extraction.entries.is_empty() => {
                stats.sections += 1;
                stats.entries += extraction.entries.len();
            }
            _ => stats.not_found += 1,
        }
        doc.insert(ExpansionSection {
            expansion,
            entries: extraction.entries,
        });
    }
    doc
}

fn report(profession: Profession, expansion: Expansion, extraction: &Extraction) {
    let d = &extraction.diagnostics;
    match &d.located {
        Ok(tier) => info!(
            %profession,
            %expansion,
            %tier,
            entries = extraction.entries.len(),
            rejected = d.rejected,
            dropped = d.dropped,
            discarded = d.discarded_alternatives,
            category_misses = d.category_misses,
            "materials extracted"
        ),
        Err(reason) => warn!(%profession, %expansion, %reason, "no materials found, section omitted"),
    }
}

/// Parse a saved guide page instead of fetching it.
pub fn parse_file(
    path: &Path,
    profession: Profession,
    expansion: Expansion,
    lexicon: &Lexicon,
    policy: MentionPolicy,
) -> Result<ProfessionDocument> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let extraction = parser::extract(&html, profession, expansion, lexicon, policy);
    report(profession, expansion, &extraction);
    let mut doc = ProfessionDocument::new(profession);
    doc.insert(ExpansionSection {
        expansion,
        entries: extraction.entries,
    });
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(expansions: Vec<Expansion>) -> RunOptions {
        RunOptions {
            professions: vec![Profession::Alchemy, Profession::Cooking],
            expansions,
            output: PathBuf::from("out"),
            policy: MentionPolicy::Sum,
            rate_limit: Duration::ZERO,
            delay: Duration::ZERO,
            concurrency: 4,
        }
    }

    #[test]
    fn plan_skips_skill_range_guides() {
        let settings = crate::config::load(None).unwrap();
        let plans = plan(
            &settings,
            &options(vec![Expansion::Vanilla, Expansion::Draenor, Expansion::Legion, Expansion::Bfa]),
        )
        .unwrap();
        assert_eq!(plans.len(), 2);
        let expansions: Vec<Expansion> = plans[0].targets.iter().map(|(e, _)| *e).collect();
        assert_eq!(expansions, vec![Expansion::Vanilla, Expansion::Bfa]);
        assert_eq!(plans[1].skipped, 2);
        assert!(plans[1].targets[0].1.ends_with("/vanilla-cooking-leveling"));
    }

    #[test]
    fn plan_fails_on_unconfigured_url() {
        let mut settings = crate::config::load(None).unwrap();
        settings.base_url.clear();
        assert!(plan(&settings, &options(vec![Expansion::Vanilla])).is_err());
    }

    #[test]
    fn offline_parse_of_fixture() {
        let doc = parse_file(
            Path::new("tests/fixtures/vanilla_alchemy.html"),
            Profession::Alchemy,
            Expansion::Vanilla,
            &Lexicon::builtin(),
            MentionPolicy::Sum,
        )
        .unwrap();
        assert_eq!(doc.profession, Profession::Alchemy);
        let text = doc.render();
        assert!(text.starts_with("Vanilla\n\"Peacebloom\";Reagents/Herb;0;0;0;0;0;0;0;0;;#;0;60^"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn failed_sections_are_omitted() {
        let mut stats = RunStats::default();
        let lexicon = Lexicon::builtin();
        let extractions = vec![
            (
                Expansion::Vanilla,
                parser::extract(
                    "<h2>Materials Required</h2><ul><li>10x Linen Cloth</li></ul>",
                    Profession::Tailoring,
                    Expansion::Vanilla,
                    &lexicon,
                    MentionPolicy::Sum,
                ),
            ),
            (
                Expansion::Outland,
                parser::extract(
                    "<p>nothing here</p>",
                    Profession::Tailoring,
                    Expansion::Outland,
                    &lexicon,
                    MentionPolicy::Sum,
                ),
            ),
        ];
        let doc = build_document(Profession::Tailoring, extractions, &mut stats);
        assert_eq!(doc.rendered_sections(), 1);
        assert_eq!(stats.sections, 1);
        assert_eq!(stats.not_found, 1);
    }
}
