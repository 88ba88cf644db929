//! Builders shared by unit tests across the crate.

use uuid::Uuid;

use crate::models::document::{
    ContactInfo, Entry, ResumeDocument, Section, SectionKind, StructuralHint, TextBlock,
};

pub fn block(text: &str) -> TextBlock {
    TextBlock::new(text)
}

pub fn hinted(text: &str, hints: Vec<StructuralHint>) -> TextBlock {
    TextBlock {
        hints,
        ..TextBlock::new(text)
    }
}

pub fn entry(blocks: Vec<TextBlock>) -> Entry {
    Entry {
        id: Uuid::new_v4(),
        blocks,
        ..Entry::default()
    }
}

pub fn section(kind: SectionKind, heading: &str, entries: Vec<Entry>) -> Section {
    Section {
        id: Uuid::new_v4(),
        kind,
        heading: heading.to_string(),
        untitled: false,
        entries,
    }
}

pub fn document(sections: Vec<Section>) -> ResumeDocument {
    ResumeDocument {
        contact: None,
        sections,
    }
}

pub fn contact() -> ContactInfo {
    ContactInfo {
        name: "Ada Lovelace".to_string(),
        email: Some("ada@example.com".to_string()),
        phone: Some("+1 555 0100".to_string()),
        location: Some("London".to_string()),
        links: vec![],
    }
}

/// A well-formed resume with standard headings and contact details, so structure checks
/// stay quiet and tests can isolate the signal they care about.
pub fn standard_document(experience: &[&str]) -> ResumeDocument {
    let mut job = entry(experience.iter().map(|t| block(t)).collect());
    job.title = Some("Software Engineer".to_string());
    job.organization = Some("Analytical Engines Ltd".to_string());

    let mut degree = entry(vec![]);
    degree.title = Some("BSc Mathematics".to_string());
    degree.organization = Some("University of London".to_string());

    ResumeDocument {
        contact: Some(contact()),
        sections: vec![
            section(SectionKind::Experience, "Experience", vec![job]),
            section(SectionKind::Education, "Education", vec![degree]),
            section(SectionKind::Skills, "Skills", vec![]),
        ],
    }
}
