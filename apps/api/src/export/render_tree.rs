//! Export Adapter — flattens a resume into a single-column, linear `RenderTree`.
//!
//! Flagged content is rewritten where the transform is unambiguous:
//! - table cells: a two-cell row becomes "Label: Value"; a cell with a header becomes
//!   "Header: Value"
//! - multi-column content is emitted column by column
//! - header/footer content becomes an ordinary body paragraph
//!
//! Anything else (text boxes, image regions, wide tables without headers) is kept as plain
//! text and the node carries the original flag.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::export::sanitize::sanitize;
use crate::layout::normalizer::flags_for;
use crate::models::{
    ContactInfo, DateRange, Entry, LayoutFlag, LocationRef, ResumeDocument, Section,
    StructuralHint, TextBlock,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderStyle {
    pub font_family: String,
    pub font_size_pt: f32,
    pub heading_size_pt: f32,
    pub name_size_pt: f32,
    pub columns: u8,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size_pt: 11.0,
            heading_size_pt: 12.0,
            name_size_pt: 16.0,
            columns: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderNode {
    /// Candidate name, first node when a contact block exists.
    Name { text: String },
    /// Contact details joined with " | ".
    ContactLine { text: String },
    Heading {
        text: String,
        level: u8,
    },
    Paragraph {
        text: String,
        /// Entry title lines are emphasized.
        emphasis: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<LocationRef>,
        /// Flags that no transform could resolve.
        #[serde(skip_serializing_if = "BTreeSet::is_empty")]
        flags: BTreeSet<LayoutFlag>,
    },
    List { items: Vec<ListItem> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    pub text: String,
    pub source: LocationRef,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub flags: BTreeSet<LayoutFlag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderTree {
    pub style: RenderStyle,
    pub nodes: Vec<RenderNode>,
}

impl RenderTree {
    /// Every text the renderer will print, in order. Handy for previews and tests.
    pub fn plain_text(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for node in &self.nodes {
            match node {
                RenderNode::Name { text }
                | RenderNode::ContactLine { text }
                | RenderNode::Heading { text, .. }
                | RenderNode::Paragraph { text, .. } => out.push(text.as_str()),
                RenderNode::List { items } => out.extend(items.iter().map(|i| i.text.as_str())),
            }
        }
        out
    }
}

pub fn to_render_tree(document: &ResumeDocument) -> RenderTree {
    let mut nodes = Vec::new();

    if let Some(contact) = &document.contact {
        contact_nodes(contact, &mut nodes);
    }

    for section in &document.sections {
        let heading = sanitize(&section.heading);
        if !heading.is_empty() {
            nodes.push(RenderNode::Heading {
                text: heading,
                level: 1,
            });
        }

        for entry in entries_in_reading_order(section) {
            entry_nodes(section, entry, &mut nodes);
        }
    }

    debug!(nodes = nodes.len(), "render tree built");
    RenderTree {
        style: RenderStyle::default(),
        nodes,
    }
}

fn contact_nodes(contact: &ContactInfo, nodes: &mut Vec<RenderNode>) {
    let name = sanitize(&contact.name);
    if !name.is_empty() {
        nodes.push(RenderNode::Name { text: name });
    }

    let details: Vec<String> = [
        contact.email.as_deref(),
        contact.phone.as_deref(),
        contact.location.as_deref(),
    ]
    .into_iter()
    .flatten()
    .chain(contact.links.iter().map(String::as_str))
    .map(sanitize)
    .filter(|s| !s.is_empty())
    .collect();
    if !details.is_empty() {
        nodes.push(RenderNode::ContactLine {
            text: details.join(" | "),
        });
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entries
// ────────────────────────────────────────────────────────────────────────────

/// Entries laid out in columns are read column by column; order is otherwise kept.
fn entries_in_reading_order(section: &Section) -> Vec<&Entry> {
    let mut entries: Vec<&Entry> = section.entries.iter().collect();
    entries.sort_by_key(|entry| column_of(&entry.hints).unwrap_or(0));
    entries
}

fn entry_nodes(section: &Section, entry: &Entry, nodes: &mut Vec<RenderNode>) {
    let title: Vec<String> = [entry.title.as_deref(), entry.organization.as_deref()]
        .into_iter()
        .flatten()
        .map(sanitize)
        .filter(|s| !s.is_empty())
        .collect();
    if !title.is_empty() {
        nodes.push(RenderNode::Paragraph {
            text: title.join(" | "),
            emphasis: true,
            source: Some(LocationRef::entry(section.id, entry.id)),
            flags: BTreeSet::new(),
        });
    }

    let details: Vec<String> = entry
        .location
        .as_deref()
        .map(sanitize)
        .into_iter()
        .chain(entry.dates.as_ref().map(format_dates))
        .filter(|s| !s.is_empty())
        .collect();
    if !details.is_empty() {
        nodes.push(RenderNode::Paragraph {
            text: details.join(" | "),
            emphasis: false,
            source: Some(LocationRef::entry(section.id, entry.id)),
            flags: BTreeSet::new(),
        });
    }

    let lines = linearize(section, entry);
    push_lines(lines, nodes);
}

fn format_dates(dates: &DateRange) -> String {
    let month = |d: NaiveDate| d.format("%b %Y").to_string();
    match dates.end {
        Some(end) => format!("{} - {}", month(dates.start), month(end)),
        None => format!("{} - Present", month(dates.start)),
    }
}

/// One line of body text after the layout transforms.
#[derive(Debug)]
struct Line {
    text: String,
    bullet: bool,
    source: LocationRef,
    flags: BTreeSet<LayoutFlag>,
}

/// Applies the column, table and header/footer transforms to an entry's blocks.
fn linearize(section: &Section, entry: &Entry) -> Vec<Line> {
    let mut blocks: Vec<&TextBlock> = entry.blocks.iter().collect();
    blocks.sort_by_key(|block| column_of(&block.hints).unwrap_or(0));

    let mut lines = Vec::new();
    let mut i = 0;
    while i < blocks.len() {
        let block = blocks[i];
        let source = LocationRef::block(section.id, entry.id, block.id);

        if let Some(cell) = table_cell(entry, block) {
            // Gather the rest of this row.
            let mut row = vec![(cell, block)];
            let mut j = i + 1;
            while let Some(next) = blocks.get(j).and_then(|b| table_cell(entry, *b).map(|c| (c, *b))) {
                if next.0.row != cell.row {
                    break;
                }
                row.push(next);
                j += 1;
            }
            lines.extend(flatten_row(section, entry, row));
            i = j;
            continue;
        }

        let mut flags = flags_for(&entry.hints, block);
        flags.remove(&LayoutFlag::MultiColumn);
        flags.remove(&LayoutFlag::HeaderFooter);

        let text = sanitize(&block.text);
        if !text.is_empty() {
            lines.push(Line {
                text,
                bullet: block.bullet,
                source,
                flags,
            });
        }
        i += 1;
    }
    lines
}

#[derive(Debug, Clone, Copy)]
struct Cell<'a> {
    row: u32,
    column: u32,
    header: Option<&'a str>,
}

fn table_cell<'a>(entry: &'a Entry, block: &'a TextBlock) -> Option<Cell<'a>> {
    block
        .hints
        .iter()
        .chain(entry.hints.iter())
        .find_map(|hint| match hint {
            StructuralHint::TableCell {
                row,
                column,
                header,
            } => Some(Cell {
                row: *row,
                column: *column,
                header: header.as_deref().filter(|h| !h.trim().is_empty()),
            }),
            _ => None,
        })
}

fn column_of(hints: &[StructuralHint]) -> Option<u8> {
    hints.iter().find_map(|hint| match hint {
        StructuralHint::Columns { count, column } if *count >= 2 => Some(*column),
        _ => None,
    })
}

fn flatten_row(section: &Section, entry: &Entry, mut row: Vec<(Cell<'_>, &TextBlock)>) -> Vec<Line> {
    row.sort_by_key(|(cell, _)| cell.column);

    let resolved_flags = |block: &TextBlock| {
        let mut flags = flags_for(&entry.hints, block);
        flags.remove(&LayoutFlag::TableCell);
        flags.remove(&LayoutFlag::MultiColumn);
        flags.remove(&LayoutFlag::HeaderFooter);
        flags
    };
    let source = |block: &TextBlock| LocationRef::block(section.id, entry.id, block.id);

    // Every cell labelled by its column header: "Header: Value" per cell.
    if row.iter().all(|(cell, _)| cell.header.is_some()) {
        return row
            .iter()
            .filter_map(|(cell, block)| {
                let value = sanitize(&block.text);
                let label = sanitize(cell.header.unwrap_or_default());
                (!value.is_empty()).then(|| Line {
                    text: format!("{label}: {value}"),
                    bullet: block.bullet,
                    source: source(*block),
                    flags: resolved_flags(*block),
                })
            })
            .collect();
    }

    // Label/value pair.
    if let [(_, label), (_, value)] = row.as_slice() {
        let label_text = sanitize(&label.text);
        let value_text = sanitize(&value.text);
        let mut flags = resolved_flags(*label);
        flags.extend(resolved_flags(*value));
        let text = match (label_text.is_empty(), value_text.is_empty()) {
            (false, false) => format!("{}: {}", label_text.trim_end_matches(':'), value_text),
            (true, _) => value_text,
            (_, true) => label_text,
        };
        if text.is_empty() {
            return Vec::new();
        }
        return vec![Line {
            text,
            bullet: label.bullet,
            source: source(*label),
            flags,
        }];
    }

    // No unambiguous reading: keep each cell, flag retained.
    row.iter()
        .filter_map(|(_, block)| {
            let text = sanitize(&block.text);
            let mut flags = flags_for(&entry.hints, block);
            flags.remove(&LayoutFlag::MultiColumn);
            flags.remove(&LayoutFlag::HeaderFooter);
            (!text.is_empty()).then(|| Line {
                text,
                bullet: block.bullet,
                source: source(*block),
                flags,
            })
        })
        .collect()
}

/// Consecutive bullet lines become one list; everything else is a paragraph.
fn push_lines(lines: Vec<Line>, nodes: &mut Vec<RenderNode>) {
    let mut list: Vec<ListItem> = Vec::new();

    for line in lines {
        if line.bullet {
            list.push(ListItem {
                text: line.text,
                source: line.source,
                flags: line.flags,
            });
            continue;
        }
        if !list.is_empty() {
            nodes.push(RenderNode::List {
                items: std::mem::take(&mut list),
            });
        }
        nodes.push(RenderNode::Paragraph {
            text: line.text,
            emphasis: false,
            source: Some(line.source),
            flags: line.flags,
        });
    }

    if !list.is_empty() {
        nodes.push(RenderNode::List { items: list });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{block, contact, document, entry, hinted, section, standard_document};
    use crate::models::SectionKind;

    fn cell(row: u32, column: u32, header: Option<&str>) -> StructuralHint {
        StructuralHint::TableCell {
            row,
            column,
            header: header.map(str::to_string),
        }
    }

    fn columns(column: u8) -> StructuralHint {
        StructuralHint::Columns { count: 2, column }
    }

    fn bulleted(text: &str) -> TextBlock {
        TextBlock {
            bullet: true,
            ..block(text)
        }
    }

    fn paragraphs(tree: &RenderTree) -> Vec<(&str, &BTreeSet<LayoutFlag>)> {
        tree.nodes
            .iter()
            .filter_map(|node| match node {
                RenderNode::Paragraph {
                    text,
                    emphasis: false,
                    flags,
                    ..
                } => Some((text.as_str(), flags)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_header_cell_becomes_label_value_paragraph() {
        let doc = document(vec![section(
            SectionKind::Skills,
            "Skills",
            vec![entry(vec![hinted("Rust", vec![cell(0, 1, Some("Languages"))])])],
        )]);

        let tree = to_render_tree(&doc);
        let body = paragraphs(&tree);
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].0, "Languages: Rust");
        assert!(body[0].1.is_empty());
    }

    #[test]
    fn test_two_cell_row_joins_label_and_value() {
        let doc = document(vec![section(
            SectionKind::Skills,
            "Skills",
            vec![entry(vec![
                hinted("Cloud:", vec![cell(0, 0, None)]),
                hinted("AWS, GCP", vec![cell(0, 1, None)]),
                hinted("Databases", vec![cell(1, 0, None)]),
                hinted("PostgreSQL", vec![cell(1, 1, None)]),
            ])],
        )]);

        let tree = to_render_tree(&doc);
        let texts: Vec<&str> = paragraphs(&tree).into_iter().map(|(t, _)| t).collect();
        assert_eq!(texts, vec!["Cloud: AWS, GCP", "Databases: PostgreSQL"]);
    }

    #[test]
    fn test_wide_row_keeps_cells_with_flag() {
        let doc = document(vec![section(
            SectionKind::Skills,
            "Skills",
            vec![entry(vec![
                hinted("Rust", vec![cell(0, 0, None)]),
                hinted("Go", vec![cell(0, 1, None)]),
                hinted("Kotlin", vec![cell(0, 2, None)]),
            ])],
        )]);

        let tree = to_render_tree(&doc);
        let body = paragraphs(&tree);
        assert_eq!(body.len(), 3);
        assert!(body
            .iter()
            .all(|(_, flags)| flags.contains(&LayoutFlag::TableCell)));
    }

    #[test]
    fn test_columns_read_column_major() {
        let doc = document(vec![section(
            SectionKind::Skills,
            "Skills",
            vec![entry(vec![
                hinted("left 1", vec![columns(0)]),
                hinted("right 1", vec![columns(1)]),
                hinted("left 2", vec![columns(0)]),
                hinted("right 2", vec![columns(1)]),
            ])],
        )]);

        let tree = to_render_tree(&doc);
        let body = paragraphs(&tree);
        let texts: Vec<&str> = body.iter().map(|(t, _)| *t).collect();
        assert_eq!(texts, vec!["left 1", "left 2", "right 1", "right 2"]);
        assert!(body.iter().all(|(_, flags)| flags.is_empty()));
    }

    #[test]
    fn test_entries_in_columns_read_column_major() {
        let mut right = entry(vec![block("Right column entry")]);
        right.hints = vec![columns(1)];
        let mut left = entry(vec![block("Left column entry")]);
        left.hints = vec![columns(0)];
        let doc = document(vec![section(SectionKind::Experience, "Experience", vec![right, left])]);

        let tree = to_render_tree(&doc);
        let texts: Vec<&str> = paragraphs(&tree).into_iter().map(|(t, _)| t).collect();
        assert_eq!(texts, vec!["Left column entry", "Right column entry"]);
    }

    #[test]
    fn test_footer_becomes_body_paragraph() {
        let doc = document(vec![section(
            SectionKind::Summary,
            "Summary",
            vec![entry(vec![hinted("References on request", vec![StructuralHint::PageFooter])])],
        )]);
        let body = paragraphs(&to_render_tree(&doc))
            .into_iter()
            .map(|(t, f)| (t.to_string(), f.clone()))
            .collect::<Vec<_>>();
        assert_eq!(body, vec![("References on request".to_string(), BTreeSet::new())]);
    }

    #[test]
    fn test_text_box_kept_with_flag() {
        let doc = document(vec![section(
            SectionKind::Summary,
            "Summary",
            vec![entry(vec![
                hinted("Fast learner", vec![StructuralHint::TextBox]),
                hinted("", vec![StructuralHint::ImageRegion]),
            ])],
        )]);
        let tree = to_render_tree(&doc);
        let body = paragraphs(&tree);
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].0, "Fast learner");
        assert_eq!(*body[0].1, BTreeSet::from([LayoutFlag::TextBox]));
    }

    #[test]
    fn test_consecutive_bullets_grouped_into_list() {
        let doc = document(vec![section(
            SectionKind::Experience,
            "Experience",
            vec![entry(vec![
                block("Payments team"),
                bulleted("• Built the ledger"),
                bulleted("Cut latency 40%"),
                block("Stack: Rust"),
            ])],
        )]);

        let tree = to_render_tree(&doc);
        let lists: Vec<&Vec<ListItem>> = tree
            .nodes
            .iter()
            .filter_map(|n| match n {
                RenderNode::List { items } => Some(items),
                _ => None,
            })
            .collect();
        assert_eq!(lists.len(), 1);
        let items: Vec<&str> = lists[0].iter().map(|i| i.text.as_str()).collect();
        assert_eq!(items, vec!["Built the ledger", "Cut latency 40%"]);
    }

    #[test]
    fn test_contact_and_entry_header_lines() {
        let mut doc = standard_document(&["Built Rust services"]);
        doc.sections[0].entries[0].dates = Some(DateRange {
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end: None,
        });
        doc.contact = Some(contact());

        let tree = to_render_tree(&doc);
        let text = tree.plain_text();
        assert_eq!(text[0], "Ada Lovelace");
        assert_eq!(text[1], "ada@example.com | +1 555 0100 | London");
        assert_eq!(text[2], "Experience");
        assert_eq!(text[3], "Software Engineer | Analytical Engines Ltd");
        assert_eq!(text[4], "Jan 2020 - Present");
        assert_eq!(text[5], "Built Rust services");
        assert!(matches!(tree.nodes[0], RenderNode::Name { .. }));
        assert!(matches!(tree.nodes[3], RenderNode::Paragraph { emphasis: true, .. }));
    }

    #[test]
    fn test_untitled_section_has_no_heading() {
        let mut custom = section(SectionKind::Custom, "", vec![entry(vec![block("Volunteer")])]);
        custom.untitled = true;
        let tree = to_render_tree(&document(vec![custom]));
        assert!(!tree
            .nodes
            .iter()
            .any(|n| matches!(n, RenderNode::Heading { .. })));
    }

    #[test]
    fn test_style_is_ats_safe() {
        let tree = to_render_tree(&ResumeDocument::default());
        assert_eq!(tree.style.font_family, "Arial");
        assert_eq!(tree.style.font_size_pt, 11.0);
        assert_eq!(tree.style.columns, 1);
        assert!(tree.nodes.is_empty());
    }

    #[test]
    fn test_render_tree_serializes_with_node_type_tag() {
        let doc = document(vec![section(SectionKind::Skills, "Skills", vec![])]);
        let json = serde_json::to_value(to_render_tree(&doc)).unwrap();
        assert_eq!(json["nodes"][0]["type"], "heading");
        assert_eq!(json["nodes"][0]["text"], "Skills");
    }
}
