pub mod document;
pub mod report;

#[cfg(test)]
pub mod fixtures;

pub use document::{
    ContactInfo, DateRange, Entry, LayoutFlag, LocationRef, ResumeDocument, Section,
    SectionKind, StructuralHint, TextBlock, ValidationError,
};
pub use report::{ScoreReport, Severity, SubScores, Suggestion, SuggestionCategory};
