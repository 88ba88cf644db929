//! Suggestion Generator — turns the signals of a scoring pass into ordered, localized
//! edit suggestions.
//!
//! Ordering: severity (Critical → Info), then category (Layout → Structure → Keyword),
//! then document position (document-level first). The sort is stable, so keyword
//! suggestions keep the job profile's rank order.

use tracing::debug;

use crate::analysis::job_description::JobProfile;
use crate::analysis::keywords::KeywordStat;
use crate::config::EngineConfig;
use crate::layout::rules::rule_for;
use crate::models::{
    LocationRef, ResumeDocument, Section, SectionKind, Severity, Suggestion, SuggestionCategory,
    TextBlock,
};

/// What the scorer measured, handed over before the report is finalized.
#[derive(Debug, Clone)]
pub struct PassSignals<'a> {
    pub job: &'a JobProfile,
    /// Top-ranked job terms (at most `top_keyword_count`) absent from the resume.
    pub missing_top: Vec<&'a KeywordStat>,
    pub resume_empty: bool,
}

pub fn generate(
    document: &ResumeDocument,
    signals: &PassSignals<'_>,
    config: &EngineConfig,
) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    if signals.resume_empty {
        suggestions.push(Suggestion {
            id: "structure:empty-resume".to_string(),
            category: SuggestionCategory::Structure,
            severity: Severity::Critical,
            location_ref: None,
            message: "The resume has no content an ATS could read. Add at least one entry with text."
                .to_string(),
            target: None,
            suggested_replacement_text: None,
        });
    }

    if signals.job.is_empty() {
        suggestions.push(Suggestion {
            id: "keyword:no-job-description".to_string(),
            category: SuggestionCategory::Keyword,
            severity: Severity::Warning,
            location_ref: None,
            message: "No job description was supplied, so keyword alignment was not checked. \
                      Paste the posting to tailor the resume."
                .to_string(),
            target: None,
            suggested_replacement_text: None,
        });
    }

    suggestions.extend(layout_suggestions(document));
    suggestions.extend(structure_suggestions(document, signals.job));
    suggestions.extend(keyword_suggestions(document, &signals.missing_top));

    order(document, &mut suggestions);
    debug!(
        count = suggestions.len(),
        top_n = config.top_keyword_count,
        "suggestions generated"
    );
    suggestions
}

/// Sorts in place; stable within equal keys.
pub fn order(document: &ResumeDocument, suggestions: &mut [Suggestion]) {
    suggestions.sort_by_key(|s| {
        (
            s.severity,
            s.category,
            s.location_ref.and_then(|loc| document.position_of(&loc)),
        )
    });
}

// ────────────────────────────────────────────────────────────────────────────
// Layout
// ────────────────────────────────────────────────────────────────────────────

/// Exactly one suggestion per flagged block, keyed to its worst flag.
fn layout_suggestions(document: &ResumeDocument) -> Vec<Suggestion> {
    document
        .blocks()
        .filter(|(_, _, block)| block.is_flagged())
        .filter_map(|(location, _, block)| {
            let worst = block
                .flags
                .iter()
                .filter_map(|flag| rule_for(*flag))
                .min_by_key(|rule| rule.severity)?;

            let others: Vec<&str> = block
                .flags
                .iter()
                .filter(|flag| **flag != worst.flag)
                .map(|flag| flag.as_str())
                .collect();
            let mut message = format!("Text \"{}\" {}", excerpt(block), worst.advice);
            if !others.is_empty() {
                message.push_str(&format!(" Also flagged: {}.", others.join(", ")));
            }

            Some(Suggestion {
                id: format!("layout:{}", block.id),
                category: SuggestionCategory::Layout,
                severity: worst.severity,
                location_ref: Some(location),
                message,
                target: Some(worst.flag.as_str().to_string()),
                suggested_replacement_text: None,
            })
        })
        .collect()
}

fn excerpt(block: &TextBlock) -> String {
    const MAX_CHARS: usize = 40;
    let text = block.text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return "(no text)".to_string();
    }
    if text.chars().count() <= MAX_CHARS {
        text
    } else {
        let cut: String = text.chars().take(MAX_CHARS).collect();
        format!("{}…", cut.trim_end())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Structure
// ────────────────────────────────────────────────────────────────────────────

fn structure_suggestions(document: &ResumeDocument, job: &JobProfile) -> Vec<Suggestion> {
    let mut out = Vec::new();

    for section in &document.sections {
        if section.kind == SectionKind::Custom {
            if section.heading.trim().is_empty() {
                out.push(structure(
                    format!("structure:untitled:{}", section.id),
                    Severity::Info,
                    Some(LocationRef::section(section.id)),
                    "This section has no heading; most parsers fold it into the section above. \
                     Give it a plain title."
                        .to_string(),
                    None,
                ));
            }
            continue;
        }
        if !is_standard_heading(section.kind, &section.heading) {
            let examples = standard_headings(section.kind);
            out.push(structure(
                format!("structure:heading:{}", section.id),
                Severity::Warning,
                Some(LocationRef::section(section.id)),
                format!(
                    "Heading \"{}\" may not be recognized as the {} section. Use a standard heading such as \"{}\".",
                    section.heading.trim(),
                    section.kind.label(),
                    title_case(examples.first().copied().unwrap_or_default())
                ),
                Some(section.heading.trim().to_string()),
            ));
        }
    }

    let requirements = &job.requirements;

    match document.first_section(SectionKind::Experience) {
        None => out.push(missing_section(SectionKind::Experience, Severity::Warning)),
        Some(section) if !requirements.experience_levels.is_empty() => {
            out.push(requirement_reminder(
                section,
                format!(
                    "The posting asks for {}. Make sure your dates and titles show it plainly.",
                    requirements.experience_levels.join(", ")
                ),
            ));
        }
        Some(_) => {}
    }

    match document.first_section(SectionKind::Education) {
        None if requirements.requires_degree() => {
            let mut s = missing_section(SectionKind::Education, Severity::Warning);
            s.message = format!(
                "The posting mentions {} but the resume has no Education section.",
                requirements.education.join(", ")
            );
            out.push(s);
        }
        None => out.push(missing_section(SectionKind::Education, Severity::Info)),
        Some(section) if requirements.requires_degree() => {
            out.push(requirement_reminder(
                section,
                format!(
                    "The posting mentions {}. State the degree name exactly as it appears on your diploma.",
                    requirements.education.join(", ")
                ),
            ));
        }
        Some(_) => {}
    }

    if !document.has_section(SectionKind::Skills) {
        out.push(missing_section(SectionKind::Skills, Severity::Info));
    }

    let contact_complete = document.contact.as_ref().is_some_and(|c| {
        c.email.as_deref().is_some_and(|e| !e.trim().is_empty())
            && c.phone.as_deref().is_some_and(|p| !p.trim().is_empty())
    });
    if !contact_complete {
        out.push(structure(
            "structure:contact".to_string(),
            Severity::Info,
            None,
            "Add an email address and phone number in the body of the resume so recruiters can reach you."
                .to_string(),
            None,
        ));
    }

    out
}

fn structure(
    id: String,
    severity: Severity,
    location_ref: Option<LocationRef>,
    message: String,
    target: Option<String>,
) -> Suggestion {
    Suggestion {
        id,
        category: SuggestionCategory::Structure,
        severity,
        location_ref,
        message,
        target,
        suggested_replacement_text: None,
    }
}

fn missing_section(kind: SectionKind, severity: Severity) -> Suggestion {
    structure(
        format!("structure:missing:{}", kind.label().to_lowercase()),
        severity,
        None,
        format!(
            "No {} section found. ATS parsers expect one under a standard heading.",
            kind.label()
        ),
        Some(kind.label().to_string()),
    )
}

fn requirement_reminder(section: &Section, message: String) -> Suggestion {
    structure(
        format!("structure:requirement:{}", section.id),
        Severity::Info,
        Some(LocationRef::section(section.id)),
        message,
        None,
    )
}

/// Headings common ATS parsers map to each section kind, lowercase.
pub fn standard_headings(kind: SectionKind) -> &'static [&'static str] {
    match kind {
        SectionKind::Summary => &[
            "summary",
            "professional summary",
            "career summary",
            "executive summary",
            "summary of qualifications",
            "profile",
            "professional profile",
            "objective",
            "career objective",
            "about me",
        ],
        SectionKind::Experience => &[
            "experience",
            "work experience",
            "professional experience",
            "relevant experience",
            "employment",
            "employment history",
            "work history",
            "career history",
        ],
        SectionKind::Education => &[
            "education",
            "education and training",
            "academic background",
            "academic history",
        ],
        SectionKind::Skills => &[
            "skills",
            "technical skills",
            "key skills",
            "core competencies",
            "competencies",
            "skills and abilities",
            "areas of expertise",
        ],
        SectionKind::Certifications => &[
            "certifications",
            "certificates",
            "licenses",
            "professional certifications",
            "licenses and certifications",
            "certifications and licenses",
        ],
        SectionKind::Custom => &[],
    }
}

pub fn is_standard_heading(kind: SectionKind, heading: &str) -> bool {
    let normalized = heading
        .trim()
        .trim_end_matches(':')
        .replace('&', " and ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    standard_headings(kind).contains(&normalized.as_str())
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ────────────────────────────────────────────────────────────────────────────
// Keywords
// ────────────────────────────────────────────────────────────────────────────

/// One suggestion per missing top term, pointed at the Skills section when there is one.
fn keyword_suggestions(document: &ResumeDocument, missing: &[&KeywordStat]) -> Vec<Suggestion> {
    let skills = document
        .first_section(SectionKind::Skills)
        .map(|s| LocationRef::section(s.id));

    missing
        .iter()
        .map(|stat| Suggestion {
            id: format!("keyword:{}", stat.term),
            category: SuggestionCategory::Keyword,
            severity: if stat.requirement_hits > 0 {
                Severity::Warning
            } else {
                Severity::Info
            },
            location_ref: skills,
            message: format!(
                "The job description mentions \"{}\" but the resume does not. Add it where it truthfully describes your experience.",
                stat.display
            ),
            target: Some(stat.display.clone()),
            suggested_replacement_text: None,
        })
        .collect()
}
