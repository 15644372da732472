//! Configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env
//! vars. Typed sections (`engine`, `embedding`) carry defaults so the engine
//! runs with no config file at all.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_"));

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract the `engine` section, falling back to defaults when absent.
    pub fn engine(&self) -> EngineSettings {
        self.figment.extract_inner("engine").unwrap_or_default()
    }

    /// Extract the `embedding` section, falling back to defaults when absent.
    pub fn embedding(&self) -> EmbeddingSettings {
        self.figment.extract_inner("embedding").unwrap_or_default()
    }
}

/// Tuning knobs for the retrieval orchestrator. The weights and thresholds
/// are empirical defaults, not invariants.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Signal weights used when merging per-source scores.
    pub vector_weight: f32,
    pub graph_weight: f32,
    pub fuzzy_weight: f32,
    /// Smart score may exceed the best single signal by at most this factor.
    pub combination_cap: f32,
    /// Matches scoring at or above this are "primary".
    pub primary_threshold: f32,
    /// Matches scoring at or above this (but below primary) are "secondary".
    pub secondary_threshold: f32,
    /// Cosine similarity floor for the vector signal.
    pub min_similarity: f32,
    /// Candidates requested per sub-query.
    pub top_k: usize,
    /// Total query strings searched, original included.
    pub max_expansions: usize,
    /// A vector/graph hit at or above this covers a key term for the fuzzy pass.
    pub fuzzy_trigger_confidence: f32,
    pub cache_ttl_secs: u64,
    pub sub_query_timeout_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            vector_weight: 0.5,
            graph_weight: 0.3,
            fuzzy_weight: 0.2,
            combination_cap: 1.3,
            primary_threshold: 0.65,
            secondary_threshold: 0.35,
            min_similarity: 0.25,
            top_k: 20,
            max_expansions: 6,
            fuzzy_trigger_confidence: 0.5,
            cache_ttl_secs: 300,
            sub_query_timeout_ms: 2000,
        }
    }
}

/// Embedding provider selection. `provider` is either `model` (transformer
/// weights under `model_dir`) or `hash` (always-available fallback).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: String,
    pub model_dir: Option<String>,
    /// Dimensionality of the hash fallback; model providers report their own.
    pub dim: usize,
    pub max_len: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "model".to_string(),
            model_dir: None,
            dim: 384,
            max_len: 256,
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after
/// expansion. If `p` is absolute, it's returned as-is.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() {
        p
    } else {
        base.join(p)
    }
}
