// Layout Normalizer: declarative ATS risk rules and the scan that applies them.
// Pure and synchronous; the scan mutates flags only, never content.

pub mod normalizer;
pub mod rules;

pub use normalizer::{scan, ScanSummary};
