use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::catalog::{Expansion, Profession};
use crate::model::MaterialEntry;

/// Materials of one (profession, expansion) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionSection {
    pub expansion: Expansion,
    pub entries: Vec<MaterialEntry>,
}

impl ExpansionSection {
    pub fn label(&self) -> String {
        self.expansion.display_name()
    }

    /// The `^`-joined item line of the shopping-list import format.
    pub fn item_line(&self) -> String {
        self.entries
            .iter()
            .map(|e| {
                format!(
                    "\"{}\";{};0;0;0;0;0;0;0;0;;#;0;{}",
                    e.name,
                    e.category.path(),
                    e.quantity
                )
            })
            .collect::<Vec<_>>()
            .join("^")
    }
}

/// All sections of one profession, kept in expansion chronology whatever
/// the order they were added in.
#[derive(Debug, Clone)]
pub struct ProfessionDocument {
    pub profession: Profession,
    sections: BTreeMap<Expansion, ExpansionSection>,
}

impl ProfessionDocument {
    pub fn new(profession: Profession) -> Self {
        ProfessionDocument {
            profession,
            sections: BTreeMap::new(),
        }
    }

    /// Adding an expansion twice replaces the earlier section.
    pub fn insert(&mut self, section: ExpansionSection) {
        self.sections.insert(section.expansion, section);
    }

    pub fn sections(&self) -> impl Iterator<Item = &ExpansionSection> {
        self.sections.values()
    }

    /// Sections that will actually be written.
    pub fn rendered_sections(&self) -> usize {
        self.sections().filter(|s| !s.entries.is_empty()).count()
    }

    /// Label line then item line per non-empty section, each newline-terminated.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in self.sections().filter(|s| !s.entries.is_empty()) {
            out.push_str(&section.label());
            out.push('\n');
            out.push_str(&section.item_line());
            out.push('\n');
        }
        out
    }
}

/// Where a profession's list is written. A `.txt` target is used as the file
/// itself when only one profession is produced; otherwise it is a directory.
pub fn output_path(target: &Path, profession: Profession, single: bool) -> PathBuf {
    let is_file = target
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
    if single && is_file {
        target.to_path_buf()
    } else {
        target.join(format!("{}.txt", profession.key()))
    }
}

pub fn write_document(doc: &ProfessionDocument, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, doc.render())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(
        profession = %doc.profession,
        sections = doc.rendered_sections(),
        path = %path.display(),
        "shopping list written"
    );
    Ok(())
}
