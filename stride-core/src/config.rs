//! Environment-driven configuration.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::info;

use crate::generator::{PlanGenerator, PlanRequest};
use crate::llm::LlmInterface;
use crate::models::Difficulty;
use crate::storage::{SqliteStorage, Storage};

pub const DEFAULT_DB_PATH: &str = "stride.db";
pub const DEFAULT_NAMESPACE: &str = "workout-storage";
pub const DEFAULT_CATALOG_DELAY_MS: u64 = 800;
pub const DEFAULT_CALORIES_PER_MINUTE: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    Catalog,
    OpenAi,
    Ollama,
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorKind::Catalog => write!(f, "catalog"),
            GeneratorKind::OpenAi => write!(f, "openai"),
            GeneratorKind::Ollama => write!(f, "ollama"),
        }
    }
}

impl FromStr for GeneratorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "catalog" | "mock" => Ok(GeneratorKind::Catalog),
            "openai" => Ok(GeneratorKind::OpenAi),
            "ollama" => Ok(GeneratorKind::Ollama),
            _ => Err(anyhow!("Unknown plan generator: {}", s)),
        }
    }
}

/// Settings the workout store itself reads.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub namespace: String,
    pub calories_per_minute: f64,
    /// Used by `start_active_plan` when no plan has been chosen yet.
    pub default_request: PlanRequest,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            calories_per_minute: DEFAULT_CALORIES_PER_MINUTE,
            default_request: PlanRequest {
                goals: vec!["general fitness".to_string()],
                equipment: vec![],
                duration_minutes: 30,
                difficulty: Difficulty::Beginner,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct StrideConfig {
    pub db_path: String,
    pub generator: GeneratorKind,
    pub llm_model: Option<String>,
    pub openai_key: Option<String>,
    pub catalog_delay: Duration,
    pub store: StoreConfig,
}

impl Default for StrideConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            generator: GeneratorKind::Catalog,
            llm_model: None,
            openai_key: None,
            catalog_delay: Duration::from_millis(DEFAULT_CATALOG_DELAY_MS),
            store: StoreConfig::default(),
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Invalid value for {}: {:?} ({})", key, raw, e)),
        _ => Ok(default),
    }
}

impl StrideConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = StrideConfig::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let calories_per_minute = parse_var(
            &lookup,
            "STRIDE_CALORIES_PER_MINUTE",
            DEFAULT_CALORIES_PER_MINUTE,
        )?;
        if !calories_per_minute.is_finite() || calories_per_minute < 0.0 {
            return Err(anyhow!(
                "STRIDE_CALORIES_PER_MINUTE must be a non-negative number"
            ));
        }

        Ok(Self {
            db_path: non_empty("STRIDE_DB_PATH").unwrap_or(defaults.db_path),
            generator: parse_var(&lookup, "STRIDE_GENERATOR", defaults.generator)?,
            llm_model: non_empty("STRIDE_LLM_MODEL"),
            openai_key: non_empty("OPENAI_KEY"),
            catalog_delay: Duration::from_millis(parse_var(
                &lookup,
                "STRIDE_CATALOG_DELAY_MS",
                DEFAULT_CATALOG_DELAY_MS,
            )?),
            store: StoreConfig {
                namespace: non_empty("STRIDE_STORAGE_NAMESPACE")
                    .unwrap_or(defaults.store.namespace),
                calories_per_minute,
                default_request: defaults.store.default_request,
            },
        })
    }

    pub fn build_generator(&self) -> Result<PlanGenerator> {
        info!("Using plan generator backend={}", self.generator);
        let generator = match self.generator {
            GeneratorKind::Catalog => PlanGenerator::catalog(self.catalog_delay),
            GeneratorKind::OpenAi => PlanGenerator::llm(LlmInterface::new_openai(
                self.openai_key.clone(),
                self.llm_model.clone(),
            )),
            GeneratorKind::Ollama => {
                PlanGenerator::llm(LlmInterface::new_ollama(self.llm_model.clone()))
            }
        };
        Ok(generator)
    }

    pub fn build_storage(&self) -> Result<Arc<dyn Storage>> {
        let storage = SqliteStorage::open(&self.db_path)
            .with_context(|| format!("Failed to open storage at {}", self.db_path))?;
        Ok(Arc::new(storage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = StrideConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.db_path, DEFAULT_DB_PATH);
        assert_eq!(cfg.generator, GeneratorKind::Catalog);
        assert_eq!(cfg.store.namespace, DEFAULT_NAMESPACE);
        assert_eq!(cfg.catalog_delay, Duration::from_millis(800));
        assert_eq!(cfg.store.calories_per_minute, 8.0);
        assert!(cfg.openai_key.is_none());
    }

    #[test]
    fn reads_overrides() {
        let cfg = StrideConfig::from_lookup(lookup(&[
            ("STRIDE_DB_PATH", "/tmp/x.db"),
            ("STRIDE_GENERATOR", "Ollama"),
            ("STRIDE_LLM_MODEL", "llama3.2:3b"),
            ("STRIDE_CATALOG_DELAY_MS", "0"),
            ("STRIDE_CALORIES_PER_MINUTE", "6.5"),
            ("STRIDE_STORAGE_NAMESPACE", "test-ns"),
            ("OPENAI_KEY", "  "),
        ]))
        .unwrap();
        assert_eq!(cfg.db_path, "/tmp/x.db");
        assert_eq!(cfg.generator, GeneratorKind::Ollama);
        assert_eq!(cfg.llm_model.as_deref(), Some("llama3.2:3b"));
        assert_eq!(cfg.catalog_delay, Duration::ZERO);
        assert_eq!(cfg.store.calories_per_minute, 6.5);
        assert_eq!(cfg.store.namespace, "test-ns");
        assert!(cfg.openai_key.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(StrideConfig::from_lookup(lookup(&[("STRIDE_GENERATOR", "gpt")])).is_err());
        assert!(
            StrideConfig::from_lookup(lookup(&[("STRIDE_CATALOG_DELAY_MS", "soon")])).is_err()
        );
        assert!(
            StrideConfig::from_lookup(lookup(&[("STRIDE_CALORIES_PER_MINUTE", "-1")])).is_err()
        );
    }
}
