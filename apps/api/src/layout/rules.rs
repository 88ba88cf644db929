//! ATS risk rules: one declarative predicate per layout flag.
//!
//! Adding a rule means adding a row to `RULES`; the normalizer, the scorer and the
//! suggestion generator all read from this table.

use crate::models::{LayoutFlag, Severity, StructuralHint};

pub struct LayoutRule {
    pub flag: LayoutFlag,
    /// Severity of the suggestion raised for a block carrying this flag.
    pub severity: Severity,
    pub applies: fn(&StructuralHint) -> bool,
    pub advice: &'static str,
}

pub static RULES: &[LayoutRule] = &[
    LayoutRule {
        flag: LayoutFlag::ImageOnly,
        severity: Severity::Critical,
        applies: |hint| matches!(hint, StructuralHint::ImageRegion),
        advice: "is rendered as an image; ATS parsers cannot read it. Type the text out instead.",
    },
    LayoutRule {
        flag: LayoutFlag::TextBox,
        severity: Severity::Warning,
        applies: |hint| matches!(hint, StructuralHint::TextBox),
        advice: "sits in a floating text box, which most parsers skip or misplace. Move it into the main text flow.",
    },
    LayoutRule {
        flag: LayoutFlag::TableCell,
        severity: Severity::Warning,
        applies: |hint| matches!(hint, StructuralHint::TableCell { .. }),
        advice: "is inside a table cell; parsers often merge or reorder cells. Use plain \"Label: Value\" lines.",
    },
    LayoutRule {
        flag: LayoutFlag::MultiColumn,
        severity: Severity::Warning,
        applies: |hint| matches!(hint, StructuralHint::Columns { count, .. } if *count >= 2),
        advice: "is laid out in multiple columns; parsers read straight across and interleave the text. Use a single column.",
    },
    LayoutRule {
        flag: LayoutFlag::HeaderFooter,
        severity: Severity::Info,
        applies: |hint| matches!(hint, StructuralHint::PageHeader | StructuralHint::PageFooter),
        advice: "is in the page header or footer, which many parsers ignore. Move it into the document body.",
    },
];

pub fn rule_for(flag: LayoutFlag) -> Option<&'static LayoutRule> {
    RULES.iter().find(|rule| rule.flag == flag)
}
