mod catalog;
mod config;
mod error;
mod fetch;
mod model;
mod output;
mod parser;
mod runner;
mod urls;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use catalog::{Expansion, Profession};
use parser::lexicon::Lexicon;
use parser::normalize::MentionPolicy;

#[derive(Parser)]
#[command(
    name = "profmats",
    about = "Build Auctionator shopping lists from WoW profession leveling guides"
)]
struct Cli {
    /// Expansion(s) to scrape (default: all)
    #[arg(short, long, value_delimiter = ',')]
    expansion: Vec<String>,
    /// Profession(s) to scrape (default: all)
    #[arg(short, long, value_delimiter = ',')]
    profession: Vec<String>,
    /// Output directory, or a .txt file when a single profession is scraped
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Minimum seconds between requests
    #[arg(short, long)]
    rate_limit: Option<f64>,
    /// Seconds to wait between professions
    #[arg(short, long)]
    delay: Option<f64>,
    /// Settings file (default: profmats.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// How repeated mentions of an item are counted
    #[arg(long, value_enum)]
    duplicates: Option<MentionPolicy>,
    /// Parse a saved guide page instead of fetching (one profession and expansion)
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Print the guide URL of every selected profession/expansion and exit
    #[arg(long)]
    list: bool,
}

fn parse_all<T>(raw: &[String], all: &[T]) -> Result<Vec<T>, error::ConfigError>
where
    T: Copy + Ord + std::str::FromStr<Err = error::ConfigError>,
{
    if raw.is_empty() {
        return Ok(all.to_vec());
    }
    let mut parsed = raw
        .iter()
        .map(|s| s.parse::<T>())
        .collect::<Result<Vec<_>, _>>()?;
    parsed.sort();
    parsed.dedup();
    Ok(parsed)
}

fn seconds(value: f64, flag: &str) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("Invalid {flag}: {value}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let settings = config::load(cli.config.as_deref())?;
    info!(settings_loaded = ?settings.base_url, "settings loaded");

    let professions = parse_all(&cli.profession, &Profession::ALL)?;
    let expansions = parse_all(&cli.expansion, &Expansion::ALL)?;
    let policy = cli.duplicates.unwrap_or(settings.duplicates);
    let lexicon = Lexicon::builtin().with_overrides(&settings.tiers, &settings.categories);

    if cli.list {
        for &profession in &professions {
            for &expansion in &expansions {
                let url = urls::resolve_url(&settings, profession, expansion)?;
                println!(
                    "{:<15} {:>2} {:<13} {}",
                    profession.key(),
                    expansion.number(),
                    expansion.key(),
                    url
                );
            }
        }
        return Ok(());
    }

    if let Some(input) = &cli.input {
        let (&[profession], &[expansion]) = (professions.as_slice(), expansions.as_slice()) else {
            bail!("--input needs exactly one --profession and one --expansion");
        };
        let doc = runner::parse_file(input, profession, expansion, &lexicon, policy)?;
        match &cli.output {
            Some(target) => {
                let path = output::output_path(target, profession, true);
                output::write_document(&doc, &path)?;
                println!("Wrote {}", path.display());
            }
            None => print!("{}", doc.render()),
        }
        return Ok(());
    }

    let opts = runner::RunOptions {
        professions,
        expansions,
        output: cli.output.unwrap_or_else(|| settings.output_dir.clone()),
        policy,
        rate_limit: seconds(cli.rate_limit.unwrap_or(settings.rate_limit_secs), "--rate-limit")?,
        delay: seconds(cli.delay.unwrap_or(settings.profession_delay_secs), "--delay")?,
        concurrency: settings.concurrency,
    };
    let stats = runner::run(&settings, &opts, &lexicon).await?;
    stats.print();

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    Ok(())
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
