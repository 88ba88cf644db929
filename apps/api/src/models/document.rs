//! Resume document model: the editor session's single source of truth.
//!
//! The editor surface owns and mutates a `ResumeDocument`; the layout normalizer is the
//! only engine component allowed to touch it, and only to rewrite `TextBlock::flags`.
//! Everything else (profiles, reports, render trees) is derived from a read-only snapshot.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Enumerations
// ────────────────────────────────────────────────────────────────────────────

/// The closed set of section kinds an ATS parser tries to recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Summary,
    Experience,
    Education,
    Skills,
    Certifications,
    Custom,
}

impl SectionKind {
    pub fn label(&self) -> &'static str {
        match self {
            SectionKind::Summary => "Summary",
            SectionKind::Experience => "Experience",
            SectionKind::Education => "Education",
            SectionKind::Skills => "Skills",
            SectionKind::Certifications => "Certifications",
            SectionKind::Custom => "Custom",
        }
    }
}

/// A structural pattern known to break linear text extraction.
///
/// Variant order is significant: it is the iteration order of a flag set and therefore
/// the order flags appear in serialized documents and render metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutFlag {
    ImageOnly,
    TextBox,
    TableCell,
    MultiColumn,
    HeaderFooter,
}

impl LayoutFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutFlag::ImageOnly => "image-only",
            LayoutFlag::TextBox => "text-box",
            LayoutFlag::TableCell => "table-cell",
            LayoutFlag::MultiColumn => "multi-column",
            LayoutFlag::HeaderFooter => "header-footer",
        }
    }
}

/// Placement hint reported by the editor surface for a block or a whole entry.
///
/// Hints describe where content *sits*; flags are what the normalizer concludes from them.
/// Kinds this engine does not know deserialize to `Unrecognized` and are treated as safe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuralHint {
    /// Content is inside a column container with `count` columns.
    Columns { count: u8, column: u8 },
    /// Content is a table cell. `header` is the row label or column header, when known.
    TableCell {
        row: u32,
        column: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        header: Option<String>,
    },
    TextBox,
    /// Content is drawn as (or inside) an image; `text` is alt text at best.
    ImageRegion,
    PageHeader,
    PageFooter,
    #[serde(other)]
    Unrecognized,
}

// ────────────────────────────────────────────────────────────────────────────
// Document tree
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactInfo>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub kind: SectionKind,
    #[serde(default)]
    pub heading: String,
    /// Explicit user marker allowing a `Custom` section without a heading.
    #[serde(default)]
    pub untitled: bool,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub dates: Option<DateRange>,
    /// Hints that apply to every block of the entry (e.g. the whole entry is a table).
    #[serde(default)]
    pub hints: Vec<StructuralHint>,
    #[serde(default)]
    pub blocks: Vec<TextBlock>,
}

/// `end = None` means the entry is ongoing ("present").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_present(&self) -> bool {
        self.end.is_none()
    }

    pub fn is_ordered(&self) -> bool {
        self.end.map_or(true, |end| self.start <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub bullet: bool,
    #[serde(default)]
    pub hints: Vec<StructuralHint>,
    /// Owned by the normalizer; recomputed on every scan.
    #[serde(default)]
    pub flags: BTreeSet<LayoutFlag>,
}

impl TextBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            bullet: false,
            hints: Vec::new(),
            flags: BTreeSet::new(),
        }
    }

    pub fn is_flagged(&self) -> bool {
        !self.flags.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Locations
// ────────────────────────────────────────────────────────────────────────────

/// Points at a section, an entry inside it, or a block inside that entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationRef {
    pub section_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<Uuid>,
}

impl LocationRef {
    pub fn section(section_id: Uuid) -> Self {
        Self {
            section_id,
            entry_id: None,
            block_id: None,
        }
    }

    pub fn entry(section_id: Uuid, entry_id: Uuid) -> Self {
        Self {
            section_id,
            entry_id: Some(entry_id),
            block_id: None,
        }
    }

    pub fn block(section_id: Uuid, entry_id: Uuid, block_id: Uuid) -> Self {
        Self {
            section_id,
            entry_id: Some(entry_id),
            block_id: Some(block_id),
        }
    }
}

impl fmt::Display for LocationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "section {}", self.section_id)?;
        if let Some(entry_id) = self.entry_id {
            write!(f, "/entry {entry_id}")?;
        }
        if let Some(block_id) = self.block_id {
            write!(f, "/block {block_id}")?;
        }
        Ok(())
    }
}

/// `(section index, entry index + 1, block index + 1)`; zero means "the container itself",
/// so a section sorts before its first entry.
pub type DocumentPosition = (usize, usize, usize);

/// The elements a `LocationRef` resolved to.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedLocation<'a> {
    pub section: &'a Section,
    pub entry: Option<&'a Entry>,
    pub block: Option<&'a TextBlock>,
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("section {section_id} has an empty heading")]
    EmptyHeading { section_id: Uuid },

    #[error("entry {entry_id} starts on {start} but ends on {end}")]
    InvertedDateRange {
        entry_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("identifier {0} is used more than once")]
    DuplicateId(Uuid),

    #[error("{0} does not exist in the document")]
    DanglingLocation(LocationRef),
}

impl ResumeDocument {
    /// Checks the model invariants. A pass over an invalid document must not start.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        let mut claim = |id: Uuid| {
            if seen.insert(id) {
                Ok(())
            } else {
                Err(ValidationError::DuplicateId(id))
            }
        };

        for section in &self.sections {
            claim(section.id)?;
            let headless = section.heading.trim().is_empty();
            if headless && !(section.kind == SectionKind::Custom && section.untitled) {
                return Err(ValidationError::EmptyHeading {
                    section_id: section.id,
                });
            }
            for entry in &section.entries {
                claim(entry.id)?;
                if let Some(dates) = entry.dates {
                    if let (false, Some(end)) = (dates.is_ordered(), dates.end) {
                        return Err(ValidationError::InvertedDateRange {
                            entry_id: entry.id,
                            start: dates.start,
                            end,
                        });
                    }
                }
                for block in &entry.blocks {
                    claim(block.id)?;
                }
            }
        }
        Ok(())
    }

    pub fn resolve(&self, location: &LocationRef) -> Result<ResolvedLocation<'_>, ValidationError> {
        let dangling = || ValidationError::DanglingLocation(*location);

        let section = self
            .sections
            .iter()
            .find(|s| s.id == location.section_id)
            .ok_or_else(dangling)?;

        let entry = match location.entry_id {
            Some(entry_id) => Some(
                section
                    .entries
                    .iter()
                    .find(|e| e.id == entry_id)
                    .ok_or_else(dangling)?,
            ),
            None => None,
        };

        let block = match (entry, location.block_id) {
            (Some(entry), Some(block_id)) => Some(
                entry
                    .blocks
                    .iter()
                    .find(|b| b.id == block_id)
                    .ok_or_else(dangling)?,
            ),
            (None, Some(_)) => return Err(dangling()),
            _ => None,
        };

        Ok(ResolvedLocation {
            section,
            entry,
            block,
        })
    }

    pub fn position_of(&self, location: &LocationRef) -> Option<DocumentPosition> {
        let si = self
            .sections
            .iter()
            .position(|s| s.id == location.section_id)?;
        let section = &self.sections[si];

        let Some(entry_id) = location.entry_id else {
            return Some((si, 0, 0));
        };
        let ei = section.entries.iter().position(|e| e.id == entry_id)?;

        let Some(block_id) = location.block_id else {
            return Some((si, ei + 1, 0));
        };
        let bi = section.entries[ei]
            .blocks
            .iter()
            .position(|b| b.id == block_id)?;

        Some((si, ei + 1, bi + 1))
    }

    /// Every block in document order, with its location.
    pub fn blocks(&self) -> impl Iterator<Item = (LocationRef, &Entry, &TextBlock)> + '_ {
        self.sections.iter().flat_map(|section| {
            section.entries.iter().flat_map(move |entry| {
                entry.blocks.iter().map(move |block| {
                    (
                        LocationRef::block(section.id, entry.id, block.id),
                        entry,
                        block,
                    )
                })
            })
        })
    }

    pub fn first_section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn has_section(&self, kind: SectionKind) -> bool {
        self.first_section(kind).is_some()
    }

    /// True when no entry carries any text at all, flagged or not.
    pub fn is_empty(&self) -> bool {
        !self.sections.iter().flat_map(|s| &s.entries).any(|entry| {
            non_blank(entry.title.as_deref())
                || non_blank(entry.organization.as_deref())
                || entry.blocks.iter().any(|b| !b.text.trim().is_empty())
        })
    }

    /// The text an ATS parser can actually read: headings, entry fields and unflagged blocks.
    pub fn readable_text(&self) -> String {
        let mut lines: Vec<&str> = Vec::new();
        for section in &self.sections {
            if !section.heading.trim().is_empty() {
                lines.push(&section.heading);
            }
            for entry in &section.entries {
                lines.extend(entry.title.as_deref());
                lines.extend(entry.organization.as_deref());
                lines.extend(
                    entry
                        .blocks
                        .iter()
                        .filter(|b| !b.is_flagged())
                        .map(|b| b.text.as_str()),
                );
            }
        }
        lines.join("\n")
    }
}

fn non_blank(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}
