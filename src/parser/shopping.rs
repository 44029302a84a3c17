//! Embedded Auctionator shopping-list strings.
//!
//! Some guides paste a ready-made import string such as
//! `Vanilla Alchemy^"Peacebloom";Reagents/Herb;0;0;0;0;0;0;0;0;;#;0;60^"Silverleaf";...;45`.
//! Items are joined by `^`, the name is the quoted first field and the
//! quantity the last one. A leading segment without that shape is the list
//! name and is ignored.

use std::sync::LazyLock;

use regex::Regex;

static ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*"([^"]+)"((?:;[^;]*)*?;#;(?:[^;]*;)*)(\d+)\s*$"#).unwrap());

/// `(name, quantity)` pairs when the line carries an export string, `None` otherwise.
/// Items with a zero or unreadable quantity are skipped.
pub fn parse_export_line(line: &str) -> Option<Vec<(String, u32)>> {
    if !line.contains(";#;") || !line.contains('"') {
        return None;
    }
    let items: Vec<(String, u32)> = line
        .split('^')
        .filter_map(|segment| ITEM_RE.captures(segment))
        .filter_map(|caps| {
            let quantity = caps[3].parse::<u32>().ok().filter(|q| *q > 0)?;
            Some((caps[1].trim().to_string(), quantity))
        })
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
