//! Job description analysis: keyword profile plus the requirement signals a recruiter
//! screen looks for (experience level, education).

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::analysis::keywords::{extract, KeywordProfile, KeywordRole};
use crate::analysis::tables::KeywordTables;
use crate::analysis::text::normalize;

/// Which part of a posting a line belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Region {
    Requirements,
    Preferred,
    #[default]
    Other,
}

/// Tracks the current region while walking a posting line by line.
///
/// A known heading ("Requirements:", "Nice to have", "About us:") switches region and
/// stays in effect until the next known heading. Unknown labels ("Languages: ...") are
/// treated as content of the current region.
#[derive(Debug, Default)]
pub struct LineRegions {
    current: Region,
}

impl LineRegions {
    /// Returns the region for this line and the part of it that is content.
    pub fn classify<'a>(&mut self, line: &'a str) -> (Region, &'a str) {
        static RE_LABELLED: OnceLock<Regex> = OnceLock::new();
        let labelled = RE_LABELLED
            .get_or_init(|| Regex::new(r"^\s*[#*\-•]*\s*([^:]{1,48}?)\s*:\s*(.*)$").unwrap());

        if let Some(caps) = labelled.captures(line) {
            if let (Some(label), Some(body)) = (caps.get(1), caps.get(2)) {
                if let Some(region) = heading_region(label.as_str()) {
                    self.current = region;
                    return (self.current, body.as_str());
                }
            }
        }

        let bare = line
            .trim()
            .trim_start_matches(|c: char| matches!(c, '#' | '*' | '-' | '•'))
            .trim();
        if let Some(region) = heading_region(bare) {
            self.current = region;
            return (self.current, "");
        }

        (self.current, line)
    }
}

fn heading_region(label: &str) -> Option<Region> {
    static RE_REQUIRED: OnceLock<Regex> = OnceLock::new();
    static RE_PREFERRED: OnceLock<Regex> = OnceLock::new();
    static RE_OTHER: OnceLock<Regex> = OnceLock::new();

    let required = RE_REQUIRED.get_or_init(|| {
        Regex::new(
            r"(?i)^(requirements?|required( skills| qualifications)?|(minimum |basic )?qualifications|must[- ]haves?|what you('ll| will)? need|what we('re| are)? looking for|you have|skills required)$",
        )
        .unwrap()
    });
    let preferred = RE_PREFERRED.get_or_init(|| {
        Regex::new(
            r"(?i)^(preferred( skills| qualifications)?|nice[- ]to[- ]haves?|bonus( points)?|pluses)$",
        )
        .unwrap()
    });
    let other = RE_OTHER.get_or_init(|| {
        Regex::new(
            r"(?i)^(about( us| the role| the team| you)?|responsibilities|what you('ll| will)? do|benefits|perks|compensation|location|the role|overview|company|who we are)$",
        )
        .unwrap()
    });

    let label = label.trim();
    if required.is_match(label) {
        Some(Region::Requirements)
    } else if preferred.is_match(label) {
        Some(Region::Preferred)
    } else if other.is_match(label) {
        Some(Region::Other)
    } else {
        None
    }
}

/// Screening signals found in a posting, deduplicated, in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobRequirements {
    /// e.g. "5+ years of experience", "senior level"
    pub experience_levels: Vec<String>,
    /// e.g. "bachelor's", "phd"
    pub education: Vec<String>,
}

impl JobRequirements {
    pub fn detect(text: &str) -> Self {
        static RE_EXPERIENCE: OnceLock<Regex> = OnceLock::new();
        static RE_EDUCATION: OnceLock<Regex> = OnceLock::new();

        let experience = RE_EXPERIENCE.get_or_init(|| {
            Regex::new(
                r"(?i)\b\d+\+?\s*(?:years?|yrs?)\s*(?:of\s+)?(?:[a-z]+\s+)?experience\b|\bexperience\s+level:\s*(?:entry|mid|senior|lead|principal)\b|\b(?:entry|mid|senior|lead|principal)[- ]level\b",
            )
            .unwrap()
        });
        let education = RE_EDUCATION.get_or_init(|| {
            Regex::new(r"(?i)\b(?:bachelor'?s|master'?s|ph\.?d|doctorate|degree)\b").unwrap()
        });

        let text = normalize(text);
        Self {
            experience_levels: collect_unique(experience, &text),
            education: collect_unique(education, &text),
        }
    }

    pub fn requires_degree(&self) -> bool {
        !self.education.is_empty()
    }
}

fn collect_unique(re: &Regex, text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in re.find_iter(text) {
        let value = m.as_str().to_lowercase();
        if !found.contains(&value) {
            found.push(value);
        }
    }
    found
}

/// Everything a scoring pass needs from the job description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobProfile {
    pub keywords: KeywordProfile,
    pub requirements: JobRequirements,
}

impl JobProfile {
    /// No extractable terms: nothing to cover.
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

pub fn analyze(text: &str, tables: &KeywordTables) -> JobProfile {
    JobProfile {
        keywords: extract(text, KeywordRole::JobDescription, tables),
        requirements: JobRequirements::detect(text),
    }
}
