//! Keyword tables: stopwords, synonym clusters and acronyms as versioned data.
//!
//! The built-in set is compiled in; a JSON file with the same shape (`TableData`) can
//! replace it at startup via `ATS_TABLES_PATH`. A pass records the table version it ran
//! with, so fixtures stay reproducible when the tables change.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::text::{normalize, stem, tokenize};

pub const BUILTIN_VERSION: &str = "builtin-1";

/// Serialized form of the tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableData {
    pub version: String,
    #[serde(default)]
    pub stopwords: Vec<String>,
    #[serde(default)]
    pub synonyms: Vec<SynonymCluster>,
    #[serde(default)]
    pub acronyms: Vec<Acronym>,
}

/// Every variant folds into `canonical`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynonymCluster {
    pub canonical: String,
    pub variants: Vec<String>,
}

/// `short` and `expansion` fold into one term, spelled as `short`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acronym {
    pub short: String,
    pub expansion: String,
}

/// Lookup-ready tables. Built once, shared read-only across passes.
#[derive(Debug, Clone)]
pub struct KeywordTables {
    version: String,
    stopwords: HashSet<String>,
    /// Single-token spelling (lowercase or stemmed) → canonical term.
    singles: HashMap<String, String>,
    /// Stemmed token sequence (two or more tokens) → canonical term.
    phrases: HashMap<Vec<String>, String>,
    max_phrase_len: usize,
}

impl KeywordTables {
    pub fn builtin() -> Self {
        Self::from_data(builtin_data())
    }

    pub fn from_data(data: TableData) -> Self {
        let mut tables = KeywordTables {
            version: data.version,
            stopwords: data
                .stopwords
                .iter()
                .map(|w| normalize(w).to_lowercase())
                .collect(),
            singles: HashMap::new(),
            phrases: HashMap::new(),
            max_phrase_len: 1,
        };

        for cluster in &data.synonyms {
            let canonical = normalize(&cluster.canonical).to_lowercase();
            tables.register(&cluster.canonical, &canonical);
            for variant in &cluster.variants {
                tables.register(variant, &canonical);
            }
        }
        for acronym in &data.acronyms {
            let canonical = normalize(&acronym.short).to_lowercase();
            tables.register(&acronym.short, &canonical);
            tables.register(&acronym.expansion, &canonical);
        }

        tables
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let data: TableData = serde_json::from_str(json).context("Invalid keyword table JSON")?;
        Ok(Self::from_data(data))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read keyword tables at {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_stopword(&self, lower: &str) -> bool {
        self.stopwords.contains(lower)
    }

    /// Canonical term for a single token, checked by spelling first, then by stem.
    pub fn canonical_single(&self, lower: &str, stemmed: &str) -> Option<&str> {
        self.singles
            .get(lower)
            .or_else(|| self.singles.get(stemmed))
            .map(String::as_str)
    }

    /// Longest known phrase at the start of `stems`, as `(token count, canonical)`.
    pub fn match_phrase(&self, stems: &[String]) -> Option<(usize, &str)> {
        let longest = self.max_phrase_len.min(stems.len());
        (2..=longest).rev().find_map(|len| {
            self.phrases
                .get(&stems[..len])
                .map(|canonical| (len, canonical.as_str()))
        })
    }

    /// Every known phrase at the start of `stems`, longest first.
    pub fn match_phrases(&self, stems: &[String]) -> Vec<(usize, &str)> {
        let longest = self.max_phrase_len.min(stems.len());
        (2..=longest)
            .rev()
            .filter_map(|len| {
                self.phrases
                    .get(&stems[..len])
                    .map(|canonical| (len, canonical.as_str()))
            })
            .collect()
    }

    fn register(&mut self, spelling: &str, canonical: &str) {
        let tokens = tokenize(&normalize(spelling));
        match tokens.as_slice() {
            [] => {}
            [single] => {
                self.singles
                    .insert(single.lower.clone(), canonical.to_string());
                self.singles
                    .insert(stem(&single.lower), canonical.to_string());
            }
            many => {
                let key: Vec<String> = many.iter().map(|t| stem(&t.lower)).collect();
                self.max_phrase_len = self.max_phrase_len.max(key.len());
                self.phrases.insert(key, canonical.to_string());
            }
        }
    }
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self::builtin()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in data
// ────────────────────────────────────────────────────────────────────────────

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "again", "against", "all", "also", "am", "an",
    "and", "any", "are", "as", "at", "be", "because", "been", "before", "being", "below",
    "between", "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down",
    "during", "each", "etc", "few", "for", "from", "further", "had", "has", "have", "having",
    "he", "her", "here", "hers", "him", "his", "how", "i", "if", "in", "into", "is", "it",
    "its", "itself", "just", "may", "me", "more", "most", "must", "my", "no", "nor", "not",
    "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out", "over", "own",
    "per", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "them", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "us", "very", "via", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "whom", "why", "will", "with", "within", "would", "you", "your",
    "yours", "ll", "re", "ve",
    // job-posting boilerplate
    "ability", "able", "candidate", "candidates", "excellent", "experience", "experienced",
    "familiarity", "good", "including", "join", "knowledge", "looking", "plus", "preferred",
    "required", "requirement", "requirements", "responsibilities", "role", "strong", "team",
    "understanding", "work", "working", "year", "years",
];

const SYNONYMS: &[(&str, &[&str])] = &[
    ("javascript", &["js", "ecmascript"]),
    ("typescript", &["ts"]),
    ("postgresql", &["postgres", "psql"]),
    ("kubernetes", &["k8s", "kube"]),
    ("go", &["golang"]),
    ("node.js", &["node", "nodejs"]),
    ("react", &["react.js", "reactjs"]),
    ("vue", &["vue.js", "vuejs"]),
    ("c#", &["csharp", "c sharp"]),
    ("c++", &["cpp"]),
    ("c", &["c language", "ansi c"]),
    ("r", &["r language", "rstats"]),
    ("python", &["python3", "py"]),
    ("rest api", &["restful", "restful api", "restful apis", "rest apis"]),
    ("cd", &["continuous deployment"]),
    ("microservices", &["micro services", "microservice architecture"]),
    ("terraform", &["hcl"]),
    ("mongodb", &["mongo"]),
    ("elasticsearch", &["elastic search", "opensearch"]),
];

const ACRONYMS: &[(&str, &str)] = &[
    ("aws", "amazon web services"),
    ("gcp", "google cloud platform"),
    ("ml", "machine learning"),
    ("ai", "artificial intelligence"),
    ("nlp", "natural language processing"),
    ("ci", "continuous integration"),
    ("cd", "continuous delivery"),
    ("api", "application programming interface"),
    ("ui", "user interface"),
    ("ux", "user experience"),
    ("qa", "quality assurance"),
    ("sre", "site reliability engineering"),
    ("oop", "object oriented programming"),
    ("etl", "extract transform load"),
    ("saas", "software as a service"),
    ("crm", "customer relationship management"),
    ("kpi", "key performance indicator"),
    ("seo", "search engine optimization"),
];

fn builtin_data() -> TableData {
    TableData {
        version: BUILTIN_VERSION.to_string(),
        stopwords: STOPWORDS.iter().map(|w| w.to_string()).collect(),
        synonyms: SYNONYMS
            .iter()
            .map(|(canonical, variants)| SynonymCluster {
                canonical: canonical.to_string(),
                variants: variants.iter().map(|v| v.to_string()).collect(),
            })
            .collect(),
        acronyms: ACRONYMS
            .iter()
            .map(|(short, expansion)| Acronym {
                short: short.to_string(),
                expansion: expansion.to_string(),
            })
            .collect(),
    }
}
