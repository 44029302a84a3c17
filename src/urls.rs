use crate::catalog::{Expansion, Profession};
use crate::config::Settings;
use crate::error::ConfigError;

/// Guide page path under `{base_url}/guides/`.
fn guide_path(profession: Profession, expansion: Expansion) -> String {
    let slug = expansion.slug();
    let prof = profession.key();
    match expansion {
        Expansion::Shadowlands => format!("{slug}-{prof}-leveling-guide"),
        Expansion::Dragonflight => format!("{slug}-{prof}-leveling-guide-dragonflight"),
        _ => format!("{slug}-{prof}-leveling"),
    }
}

/// Override table first, then the site's URL template.
pub fn resolve_url(
    settings: &Settings,
    profession: Profession,
    expansion: Expansion,
) -> Result<String, ConfigError> {
    let overridden = settings
        .urls
        .get(profession.key())
        .and_then(|table| {
            table
                .iter()
                .find(|(key, _)| key.parse::<Expansion>().ok() == Some(expansion))
        })
        .map(|(_, url)| url.trim())
        .filter(|url| !url.is_empty());
    if let Some(url) = overridden {
        return Ok(url.to_string());
    }

    let base = settings.base_url.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(ConfigError::NotConfigured {
            profession: profession.key().to_string(),
            expansion: expansion.key().to_string(),
        });
    }
    Ok(format!("{base}/guides/{}", guide_path(profession, expansion)))
}
