use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::analysis::tables::KeywordTables;
use crate::models::LayoutFlag;

/// Application configuration loaded from environment variables.
/// Fails at startup if a value is present but malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Rewrites are unavailable (ServiceError) when unset.
    pub anthropic_api_key: Option<String>,
    /// Base URL of the document renderer; export to DOCX/PDF is unavailable when unset.
    pub renderer_url: Option<String>,
    pub snapshot_dir: PathBuf,
    pub rewrite_timeout: Duration,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let tables = match optional_env("ATS_TABLES_PATH") {
            Some(path) => KeywordTables::load(path.as_ref())?,
            None => KeywordTables::builtin(),
        };

        let engine = EngineConfig {
            top_keyword_count: parse_env("ATS_TOP_KEYWORDS", 10)?,
            layout_weight: parse_env("ATS_LAYOUT_WEIGHT", 0.4)?,
            keyword_weight: parse_env("ATS_KEYWORD_WEIGHT", 0.6)?,
            penalties: LayoutPenalties::from_vars(optional_env)?,
            tables: Arc::new(tables),
        };
        engine.validate()?;

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            renderer_url: optional_env("RENDERER_URL"),
            snapshot_dir: optional_env("SNAPSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./snapshots")),
            rewrite_timeout: Duration::from_secs(parse_env("REWRITE_TIMEOUT_SECS", 30)?),
            engine,
        })
    }
}

/// Tunables of a scoring pass. Cheap to clone; the tables are shared.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How many top-ranked job keywords are checked for missing-keyword suggestions.
    pub top_keyword_count: usize,
    pub layout_weight: f64,
    pub keyword_weight: f64,
    pub penalties: LayoutPenalties,
    /// Stopword, synonym and acronym tables.
    pub tables: Arc<KeywordTables>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_keyword_count: 10,
            layout_weight: 0.4,
            keyword_weight: 0.6,
            penalties: LayoutPenalties::default(),
            tables: Arc::new(KeywordTables::builtin()),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        let weights = [self.layout_weight, self.keyword_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            bail!("Score weights must be finite and non-negative, got {weights:?}");
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            bail!("At least one score weight must be positive");
        }
        Ok(())
    }
}

/// Layout sub-score points lost per flagged block, by the block's worst flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutPenalties {
    pub image_only: u32,
    pub text_box: u32,
    pub table_cell: u32,
    pub multi_column: u32,
    pub header_footer: u32,
}

impl Default for LayoutPenalties {
    fn default() -> Self {
        Self {
            image_only: 35,
            text_box: 25,
            table_cell: 20,
            multi_column: 15,
            header_footer: 10,
        }
    }
}

impl LayoutPenalties {
    /// Reads `ATS_PENALTY_*` overrides through `lookup`; unset keys keep their default.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let read = |key: &str, default: u32| parse_value(key, lookup(key), default);
        Ok(Self {
            image_only: read("ATS_PENALTY_IMAGE_ONLY", defaults.image_only)?,
            text_box: read("ATS_PENALTY_TEXT_BOX", defaults.text_box)?,
            table_cell: read("ATS_PENALTY_TABLE_CELL", defaults.table_cell)?,
            multi_column: read("ATS_PENALTY_MULTI_COLUMN", defaults.multi_column)?,
            header_footer: read("ATS_PENALTY_HEADER_FOOTER", defaults.header_footer)?,
        })
    }

    pub fn for_flag(&self, flag: LayoutFlag) -> u32 {
        match flag {
            LayoutFlag::ImageOnly => self.image_only,
            LayoutFlag::TextBox => self.text_box,
            LayoutFlag::TableCell => self.table_cell,
            LayoutFlag::MultiColumn => self.multi_column,
            LayoutFlag::HeaderFooter => self.header_footer,
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_value(key, optional_env(key), default)
}

fn parse_value<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_engine_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.top_keyword_count, 10);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let config = EngineConfig {
            layout_weight: -0.1,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_weights_rejected() {
        let config = EngineConfig {
            layout_weight: 0.0,
            keyword_weight: 0.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_penalty_overrides_from_vars() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("ATS_PENALTY_TABLE_CELL", "5"), ("ATS_PENALTY_IMAGE_ONLY", " 50 ")]);
        let penalties =
            LayoutPenalties::from_vars(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(penalties.table_cell, 5);
        assert_eq!(penalties.image_only, 50);
        assert_eq!(penalties.text_box, LayoutPenalties::default().text_box);
    }

    #[test]
    fn test_malformed_penalty_rejected() {
        let result = LayoutPenalties::from_vars(|key| {
            (key == "ATS_PENALTY_TEXT_BOX").then(|| "-3".to_string())
        });
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("ATS_PENALTY_TEXT_BOX"));
    }

    #[test]
    fn test_penalty_ordering_follows_severity() {
        let p = LayoutPenalties::default();
        assert!(p.for_flag(LayoutFlag::ImageOnly) > p.for_flag(LayoutFlag::TableCell));
        assert!(p.for_flag(LayoutFlag::TableCell) > p.for_flag(LayoutFlag::MultiColumn));
        assert_eq!(p.for_flag(LayoutFlag::TableCell), 20);
    }
}
