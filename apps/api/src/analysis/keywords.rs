//! Keyword Extractor — turns free text into a ranked, normalized `KeywordProfile`.
//!
//! Pipeline per clause: tokenize → fold table phrases → drop stopwords → stem →
//! fold synonyms/acronyms to their canonical term. Job descriptions additionally track
//! which occurrences sit under a requirements-like heading and boost those.
//!
//! Resumes are folded exhaustively: every phrase at every position plus each word on
//! its own. Adding words to a resume line therefore never removes a term it had.
//!
//! Deterministic: same text + same tables → identical profile, including order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analysis::job_description::{LineRegions, Region};
use crate::analysis::tables::KeywordTables;
use crate::analysis::text::{clauses, normalize, stem, tokenize, Token};

/// Extra weight for each occurrence under a requirements-like heading.
pub const REQUIREMENT_BOOST: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordRole {
    JobDescription,
    Resume,
}

/// One normalized term and its statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordStat {
    /// Canonical, normalized form, used as the matching key.
    pub term: String,
    /// First spelling seen in the source text, for messages.
    pub display: String,
    pub source_weight: f64,
    pub occurrences: u32,
    /// Occurrences under a requirements-like heading (job descriptions only).
    pub requirement_hits: u32,
    /// Index of the first occurrence among all counted terms.
    pub first_position: usize,
}

/// Ranked term statistics, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordProfile {
    pub role: KeywordRole,
    pub tables_version: String,
    terms: Vec<KeywordStat>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl KeywordProfile {
    pub fn get(&self, term: &str) -> Option<&KeywordStat> {
        self.index.get(term).map(|&i| &self.terms[i])
    }

    pub fn contains(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }

    /// Terms in rank order: weight descending, then first occurrence.
    pub fn terms(&self) -> &[KeywordStat] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.terms.iter().map(|t| t.source_weight).sum()
    }

    fn from_ranked(role: KeywordRole, tables_version: &str, terms: Vec<KeywordStat>) -> Self {
        let index = terms
            .iter()
            .enumerate()
            .map(|(i, stat)| (stat.term.clone(), i))
            .collect();
        Self {
            role,
            tables_version: tables_version.to_string(),
            terms,
            index,
        }
    }
}

/// Builds a profile from raw text. Never fails: empty or junk input yields an empty profile.
pub fn extract(text: &str, role: KeywordRole, tables: &KeywordTables) -> KeywordProfile {
    let normalized = normalize(text);
    let mut acc = Accumulator::default();
    let mut regions = LineRegions::default();

    let folding = match role {
        KeywordRole::JobDescription => Folding::Greedy,
        KeywordRole::Resume => Folding::Exhaustive,
    };

    for line in normalized.lines() {
        let (region, body) = match role {
            KeywordRole::JobDescription => regions.classify(line),
            KeywordRole::Resume => (Region::Other, line),
        };
        for clause in clauses(body) {
            let tokens = tokenize(clause);
            fold_terms(&tokens, tables, folding, |term, surface| {
                acc.record(term, surface, region == Region::Requirements)
            });
        }
    }

    let total = acc.counted.max(1) as f64;
    let mut terms: Vec<KeywordStat> = acc
        .stats
        .into_iter()
        .map(|mut stat| {
            stat.source_weight = match role {
                KeywordRole::JobDescription => {
                    stat.occurrences as f64 + REQUIREMENT_BOOST * stat.requirement_hits as f64
                }
                KeywordRole::Resume => stat.occurrences as f64 / total,
            };
            stat
        })
        .collect();

    terms.sort_by(|a, b| {
        b.source_weight
            .total_cmp(&a.source_weight)
            .then(a.first_position.cmp(&b.first_position))
    });

    KeywordProfile::from_ranked(role, tables.version(), terms)
}

/// Canonical form of a single word or phrase, using the same pipeline as `extract`.
/// Returns `None` when the input reduces to nothing (e.g. a stopword).
pub fn canonical_term(text: &str, tables: &KeywordTables) -> Option<String> {
    let tokens = tokenize(&normalize(text));
    let mut first = None;
    fold_terms(&tokens, tables, Folding::Greedy, |term, _| {
        if first.is_none() {
            first = Some(term.to_string());
        }
    });
    first
}

/// How table phrases are counted within a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Folding {
    /// The longest phrase wins and consumes its words.
    Greedy,
    /// Every phrase at every position, and every word as well.
    Exhaustive,
}

/// Walks a clause, emitting `(canonical term, surface spelling)` for every counted term.
fn fold_terms(
    tokens: &[Token],
    tables: &KeywordTables,
    folding: Folding,
    mut emit: impl FnMut(&str, &str),
) {
    let stems: Vec<String> = tokens.iter().map(|t| stem(&t.lower)).collect();
    let mut i = 0;

    while i < tokens.len() {
        match folding {
            Folding::Greedy => {
                if let Some((len, canonical)) = tables.match_phrase(&stems[i..]) {
                    emit(canonical, &surface_of(&tokens[i..i + len]));
                    i += len;
                    continue;
                }
            }
            Folding::Exhaustive => {
                for (len, canonical) in tables.match_phrases(&stems[i..]) {
                    emit(canonical, &surface_of(&tokens[i..i + len]));
                }
            }
        }

        let token = &tokens[i];
        if let Some(canonical) = tables.canonical_single(&token.lower, &stems[i]) {
            emit(canonical, &token.surface);
        } else if is_countable(token, tables) {
            emit(&stems[i], &token.surface);
        }
        i += 1;
    }
}

fn surface_of(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.surface.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Plain tokens count when they carry a letter, are not stopwords and are longer
/// than one character. Table terms bypass this check.
fn is_countable(token: &Token, tables: &KeywordTables) -> bool {
    token.lower.chars().count() > 1
        && token.lower.chars().any(char::is_alphabetic)
        && !tables.is_stopword(&token.lower)
}

#[derive(Default)]
struct Accumulator {
    stats: Vec<KeywordStat>,
    index: HashMap<String, usize>,
    counted: u32,
}

impl Accumulator {
    fn record(&mut self, term: &str, surface: &str, in_requirements: bool) {
        let position = self.counted as usize;
        self.counted += 1;

        let slot = match self.index.get(term) {
            Some(&i) => i,
            None => {
                self.stats.push(KeywordStat {
                    term: term.to_string(),
                    display: surface.to_string(),
                    source_weight: 0.0,
                    occurrences: 0,
                    requirement_hits: 0,
                    first_position: position,
                });
                self.index.insert(term.to_string(), self.stats.len() - 1);
                self.stats.len() - 1
            }
        };

        let stat = &mut self.stats[slot];
        stat.occurrences += 1;
        if in_requirements {
            stat.requirement_hits += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jd(text: &str) -> KeywordProfile {
        extract(text, KeywordRole::JobDescription, &KeywordTables::builtin())
    }

    fn resume(text: &str) -> KeywordProfile {
        extract(text, KeywordRole::Resume, &KeywordTables::builtin())
    }

    fn ranked_terms(profile: &KeywordProfile) -> Vec<&str> {
        profile.terms().iter().map(|t| t.term.as_str()).collect()
    }

    #[test]
    fn test_equal_weights_keep_first_occurrence_order() {
        let profile = jd("Python, AWS, Docker");
        assert_eq!(ranked_terms(&profile), vec!["python", "aws", "docker"]);
        assert!(profile
            .terms()
            .iter()
            .all(|t| (t.source_weight - 1.0).abs() < f64::EPSILON));
    }

    #[test]
    fn test_display_keeps_original_spelling() {
        let profile = jd("Python, AWS, Docker");
        assert_eq!(profile.get("aws").unwrap().display, "AWS");
    }

    #[test]
    fn test_frequency_drives_rank() {
        let profile = jd("Docker and Kubernetes. Kubernetes operators. Kubernetes at scale.");
        assert_eq!(profile.terms()[0].term, "kubernetes");
        assert_eq!(profile.get("kubernetes").unwrap().occurrences, 3);
    }

    #[test]
    fn test_stopwords_removed() {
        let profile = jd("The candidate will have the ability to work with Rust");
        assert_eq!(ranked_terms(&profile), vec!["rust"]);
    }

    #[test]
    fn test_synonyms_fold_to_one_term() {
        let profile = jd("JS or JavaScript or ECMAScript");
        assert_eq!(profile.len(), 1);
        assert_eq!(profile.get("javascript").unwrap().occurrences, 3);
    }

    #[test]
    fn test_acronym_folds_both_directions() {
        let long = jd("Amazon Web Services");
        let short = jd("AWS");
        assert!(long.contains("aws"));
        assert!(short.contains("aws"));
        assert_eq!(long.len(), 1);
    }

    #[test]
    fn test_phrases_stop_at_punctuation() {
        let profile = jd("Python, R, language models");
        assert_eq!(ranked_terms(&profile), vec!["python", "r", "languag", "model"]);
    }

    #[test]
    fn test_phrase_inside_one_clause_still_folds() {
        let profile = jd("R language; Amazon Web Services");
        assert_eq!(ranked_terms(&profile), vec!["r", "aws"]);
    }

    #[test]
    fn test_resume_keeps_phrase_and_its_words() {
        let profile = resume("Amazon Web Services");
        for term in ["aws", "amazon", "web", "servic"] {
            assert!(profile.contains(term), "missing {term}");
        }
    }

    #[test]
    fn test_resume_terms_only_grow_when_words_are_added() {
        let before = resume("Web services");
        let after = resume("Amazon Web services");
        assert!(before.terms().iter().all(|t| after.contains(&t.term)));
    }

    #[test]
    fn test_stemming_matches_inflections() {
        let profile = resume("Deployed services; deploying service meshes");
        assert_eq!(profile.get("deploy").unwrap().occurrences, 2);
        assert_eq!(profile.get("servic").unwrap().occurrences, 2);
    }

    #[test]
    fn test_requirements_heading_boosts_weight() {
        let profile = jd("We use Go and Terraform.\nRequirements:\n- Terraform\n");
        let terraform = profile.get("terraform").unwrap();
        assert_eq!(terraform.occurrences, 2);
        assert_eq!(terraform.requirement_hits, 1);
        assert!((terraform.source_weight - 2.5).abs() < 1e-9);
        assert_eq!(profile.terms()[0].term, "terraform");
    }

    #[test]
    fn test_inline_requirements_label() {
        let profile = jd("Requirements: Kafka\nAbout us: Kafka fans");
        let kafka = profile.get("kafka").unwrap();
        assert_eq!(kafka.occurrences, 2);
        assert_eq!(kafka.requirement_hits, 1);
    }

    #[test]
    fn test_resume_weight_is_normalized_frequency() {
        let profile = resume("Rust Rust Go Kafka");
        assert!((profile.get("rust").unwrap().source_weight - 0.5).abs() < 1e-9);
        assert!((profile.total_weight() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_resume_role_ignores_requirement_headings() {
        let profile = resume("Requirements: Kafka");
        assert_eq!(profile.get("kafka").unwrap().requirement_hits, 0);
    }

    #[test]
    fn test_empty_and_junk_input() {
        assert!(jd("").is_empty());
        assert!(jd("   \n\t ").is_empty());
        assert!(jd("!!! ### 2024 5+").is_empty());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let text = "Senior Rust engineer. Requirements: Rust, Kafka, AWS, k8s.\nNice to have: Go";
        let a = serde_json::to_string(&jd(text)).unwrap();
        let b = serde_json::to_string(&jd(text)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_canonical_term_uses_same_pipeline() {
        let tables = KeywordTables::builtin();
        assert_eq!(canonical_term("K8s", &tables).as_deref(), Some("kubernetes"));
        assert_eq!(canonical_term("Deployments", &tables).as_deref(), Some("deployment"));
        assert_eq!(canonical_term("the", &tables), None);
    }
}
