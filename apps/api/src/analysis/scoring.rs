//! ATS Scorer — layout and keyword sub-scores, their weighted overall, and the report.
//!
//! Scoring is pure: it reads a snapshot of the document, never mutates it, and the same
//! (document, job profile, config) always yields an identical report.

use tracing::info;

use crate::analysis::job_description::JobProfile;
use crate::analysis::keywords::{extract, KeywordProfile, KeywordRole, KeywordStat};
use crate::analysis::suggestions::{self, PassSignals};
use crate::config::{EngineConfig, LayoutPenalties};
use crate::models::{ResumeDocument, ScoreReport, SubScores, ValidationError};

/// How many missing terms the recommendation names.
const RECOMMENDATION_TERMS: usize = 3;

pub fn score(
    document: &ResumeDocument,
    job: &JobProfile,
    config: &EngineConfig,
) -> Result<ScoreReport, ValidationError> {
    document.validate()?;

    let resume = extract(&document.readable_text(), KeywordRole::Resume, &config.tables);
    let resume_empty = document.is_empty();
    let coverage = KeywordCoverage::measure(&job.keywords, &resume);

    let layout = layout_sub_score(document, &config.penalties);
    let keywords = coverage.score;
    let overall = if resume_empty {
        0
    } else {
        weighted_overall(layout, keywords, config)
    };

    let missing_top: Vec<&KeywordStat> = job
        .keywords
        .terms()
        .iter()
        .take(config.top_keyword_count)
        .filter(|stat| !resume.contains(&stat.term))
        .collect();

    let signals = PassSignals {
        job,
        missing_top,
        resume_empty,
    };
    let suggestions = suggestions::generate(document, &signals, config);

    let recommendation = build_recommendation(overall, &coverage.missing, resume_empty);

    info!(
        "Score pass: overall={} layout={} keywords={} matched={}/{} suggestions={}",
        overall,
        layout,
        keywords,
        coverage.matched.len(),
        job.keywords.len(),
        suggestions.len()
    );

    Ok(ScoreReport {
        overall,
        sub_scores: SubScores { layout, keywords },
        suggestions,
        matched_terms: coverage.matched.iter().map(|s| s.display.clone()).collect(),
        missing_terms: coverage.missing.iter().map(|s| s.display.clone()).collect(),
        recommendation,
        tables_version: config.tables.version().to_string(),
    })
}

/// 100 minus each flagged block's worst-flag penalty, floored at 0.
pub fn layout_sub_score(document: &ResumeDocument, penalties: &LayoutPenalties) -> u32 {
    let lost: u32 = document
        .blocks()
        .filter_map(|(_, _, block)| {
            block
                .flags
                .iter()
                .map(|flag| penalties.for_flag(*flag))
                .max()
        })
        .sum();
    100u32.saturating_sub(lost)
}

fn weighted_overall(layout: u32, keywords: u32, config: &EngineConfig) -> u32 {
    let total = config.layout_weight + config.keyword_weight;
    let value =
        (config.layout_weight * layout as f64 + config.keyword_weight * keywords as f64) / total;
    value.round().clamp(0.0, 100.0) as u32
}

/// Job terms split by whether the resume mentions them, in job rank order.
struct KeywordCoverage<'a> {
    score: u32,
    matched: Vec<&'a KeywordStat>,
    missing: Vec<&'a KeywordStat>,
}

impl<'a> KeywordCoverage<'a> {
    fn measure(job: &'a KeywordProfile, resume: &KeywordProfile) -> Self {
        let (matched, missing): (Vec<&KeywordStat>, Vec<&KeywordStat>) = job
            .terms()
            .iter()
            .partition(|stat| resume.contains(&stat.term));

        let total = job.total_weight();
        // Nothing to cover counts as full coverage.
        let score = if total <= 0.0 {
            100
        } else {
            let found: f64 = matched.iter().map(|s| s.source_weight).sum();
            (100.0 * found / total).round().clamp(0.0, 100.0) as u32
        };

        Self {
            score,
            matched,
            missing,
        }
    }
}

fn build_recommendation(overall: u32, missing: &[&KeywordStat], resume_empty: bool) -> String {
    if resume_empty {
        return "The resume is empty. Add your experience before optimizing for this role."
            .to_string();
    }

    let gaps = missing
        .iter()
        .take(RECOMMENDATION_TERMS)
        .map(|s| s.display.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    if overall >= 80 {
        "Strong ATS match. The resume parses cleanly and covers the key job terms.".to_string()
    } else if overall >= 60 {
        if gaps.is_empty() {
            format!("Moderate ATS match ({overall}/100). Resolve the flagged layout issues first.")
        } else {
            format!("Moderate ATS match ({overall}/100). Consider adding: {gaps}.")
        }
    } else if gaps.is_empty() {
        format!("Low ATS match ({overall}/100). Fix the flagged layout issues before applying.")
    } else {
        format!(
            "Low ATS match ({overall}/100). Significant gaps: {gaps}. Fix layout issues and tailor keywords before applying."
        )
    }
}
