//! Generator configuration.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// YAML config for the generation pipeline. Every field has a default; an
/// absent file means all defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            data_dir: default_data_dir(),
        }
    }
}

impl GeneratorConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    /// A present-but-broken file is an error, not a silent default.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = GeneratorConfig::load(&dir.path().join("caseforge.yaml")).unwrap();
        assert_eq!(cfg.model, "gpt-4o");
        assert_eq!(cfg.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caseforge.yaml");
        std::fs::write(&path, "model: gpt-4o-mini\ntemperature: 0.2\n").unwrap();
        let cfg = GeneratorConfig::load(&path).unwrap();
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.max_tokens, 2048);
    }

    #[test]
    fn unknown_field_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caseforge.yaml");
        std::fs::write(&path, "modle: typo\n").unwrap();
        assert!(GeneratorConfig::load(&path).is_err());
    }
}
