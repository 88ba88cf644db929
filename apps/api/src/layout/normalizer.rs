//! Layout Normalizer — annotates blocks with the ATS risk flags implied by their hints.
//!
//! Flags are recomputed from scratch on every scan, so scanning is idempotent and a
//! hint the editor removed also clears its flag. Content is never touched.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::layout::rules::RULES;
use crate::models::{LayoutFlag, ResumeDocument, StructuralHint, TextBlock};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanSummary {
    pub blocks_scanned: usize,
    pub blocks_flagged: usize,
}

/// Recomputes every block's flag set in place.
pub fn scan(document: &mut ResumeDocument) -> ScanSummary {
    let mut summary = ScanSummary::default();

    for section in &mut document.sections {
        for entry in &mut section.entries {
            for block in &mut entry.blocks {
                block.flags = flags_for(&entry.hints, block);
                summary.blocks_scanned += 1;
                if block.is_flagged() {
                    summary.blocks_flagged += 1;
                    debug!(block_id = %block.id, flags = ?block.flags, "layout risk flagged");
                }
            }
        }
    }

    info!(
        "Layout scan: {} of {} blocks flagged",
        summary.blocks_flagged, summary.blocks_scanned
    );
    summary
}

/// Flags implied by the entry-level hints plus the block's own hints.
pub fn flags_for(entry_hints: &[StructuralHint], block: &TextBlock) -> BTreeSet<LayoutFlag> {
    entry_hints
        .iter()
        .chain(block.hints.iter())
        .flat_map(|hint| RULES.iter().filter(move |rule| (rule.applies)(hint)))
        .map(|rule| rule.flag)
        .collect()
}
