use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// How a collection transformer decides that a list is transformable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionPolicy {
    /// Every element must be supported on its own and is dispatched on its own.
    #[default]
    Strict,
    /// The first non-null element decides; its transformer handles all elements.
    Representative,
}

/// Which registration wins when several exact-pair transformers declare the same pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairTieBreak {
    /// Higher priority wins, earlier registration on equal priority.
    #[default]
    HighestPriority,
    /// Lower priority number wins, earlier registration on equal priority.
    LowestPriority,
}

/// Registry configuration. Every field has a default, an empty file is valid.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub collection_policy: CollectionPolicy,

    pub pair_tie_break: PairTieBreak,

    /// Priority of the collection transformer added by `TransformerRegistry::shared`.
    pub collection_priority: i32,

    /// Priority overrides by transformer name. Replace the priority passed at registration.
    pub priorities: HashMap<String, i32>,
}

/// Parser for one config file format.
pub trait ConfigParser {
    /// File extensions handled by this parser, without the dot.
    fn extensions(&self) -> &[&str];

    fn parse(&self, content: &str) -> Result<RegistryConfig, ConfigError>;
}

pub struct TomlParser;

impl ConfigParser for TomlParser {
    fn extensions(&self) -> &[&str] {
        &["toml"]
    }

    fn parse(&self, content: &str) -> Result<RegistryConfig, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            format: "toml",
            message: e.to_string(),
        })
    }
}

pub struct JsonParser;

impl ConfigParser for JsonParser {
    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn parse(&self, content: &str) -> Result<RegistryConfig, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse {
            format: "json",
            message: e.to_string(),
        })
    }
}

impl RegistryConfig {
    /// Load configuration from a file, picking the parser by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, &[&TomlParser, &JsonParser])
    }

    /// Load configuration from a file with an explicit parser set.
    pub fn load_with(
        path: impl AsRef<Path>,
        parsers: &[&dyn ConfigParser],
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let parser = parsers
            .iter()
            .find(|p| p.extensions().contains(&ext))
            .ok_or_else(|| ConfigError::UnsupportedFormat {
                path: shown.clone(),
                expected: parsers
                    .iter()
                    .flat_map(|p| p.extensions().iter().copied())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: shown.clone(),
            source,
        })?;

        let config = parser.parse(&content).map_err(|e| e.with_context(&shown))?;
        tracing::debug!(
            path = %shown,
            policy = ?config.collection_policy,
            tie_break = ?config.pair_tie_break,
            overrides = config.priorities.len(),
            "loaded registry config"
        );
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        TomlParser.parse(content)
    }

    /// Parse configuration from a JSON string.
    pub fn parse_json(content: &str) -> Result<Self, ConfigError> {
        JsonParser.parse(content)
    }

    /// Priority override for a transformer name, if configured.
    pub fn priority_for(&self, name: &str) -> Option<i32> {
        self.priorities.get(name).copied()
    }
}
