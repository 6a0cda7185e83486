// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{GenMediaError, Result};
use config::{Config, ConfigError, Environment, File, Map, Source, Value, ValueKind};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (`GENMEDIA__SECTION__KEY`, highest)
    /// 2. Config file
    /// 3. Google's own variables (`GOOGLE_CLOUD_PROJECT`, ...)
    /// 4. Defaults (lowest)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Like [`AppConfig::load`], reading Google's variables through `lookup`.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // Google conventions sit just above the built-in defaults
            .add_source(GoogleEnv::from_lookup(lookup))
            // Load from config file if it exists
            .add_source(File::from(file).required(path.is_some()))
            // Override with environment variables (prefix: GENMEDIA__)
            .add_source(Environment::with_prefix("GENMEDIA").separator("__"))
            .build()
            .map_err(|e| GenMediaError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| GenMediaError::Config(e.to_string()))
    }

    fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".genmedia")
            .join("config.toml")
    }
}

/// Client defaults taken from `GOOGLE_CLOUD_PROJECT`, `GOOGLE_CLOUD_LOCATION`
/// and `GOOGLE_GENAI_USE_VERTEXAI`.
#[derive(Debug, Clone, Default)]
pub struct GoogleEnv {
    values: Map<String, Value>,
}

impl GoogleEnv {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let origin = "google environment".to_string();
        let mut values = Map::new();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(project) = non_empty("GOOGLE_CLOUD_PROJECT") {
            values.insert(
                "defaults.project_id".to_string(),
                Value::new(Some(&origin), ValueKind::String(project)),
            );
        }

        if let Some(location) = non_empty("GOOGLE_CLOUD_LOCATION") {
            values.insert(
                "defaults.location".to_string(),
                Value::new(Some(&origin), ValueKind::String(location)),
            );
        }

        if let Some(flag) = non_empty("GOOGLE_GENAI_USE_VERTEXAI") {
            values.insert(
                "defaults.use_vertexai".to_string(),
                Value::new(Some(&origin), ValueKind::Boolean(parse_flag(&flag))),
            );
        }

        Self { values }
    }
}

impl Source for GoogleEnv {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> std::result::Result<Map<String, Value>, ConfigError> {
        Ok(self.values.clone())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn defaults_with(vars: &[(&str, &str)]) -> ClientDefaults {
        Config::builder()
            .add_source(Config::try_from(&AppConfig::default()).unwrap())
            .add_source(GoogleEnv::from_lookup(lookup_from(vars)))
            .build()
            .unwrap()
            .try_deserialize::<AppConfig>()
            .unwrap()
            .defaults
    }

    #[test]
    fn test_google_env_replaces_builtin_defaults() {
        let defaults = defaults_with(&[
            ("GOOGLE_CLOUD_PROJECT", "media-studio"),
            ("GOOGLE_CLOUD_LOCATION", "europe-west4"),
            ("GOOGLE_GENAI_USE_VERTEXAI", "False"),
        ]);

        assert_eq!(defaults.project_id, "media-studio");
        assert_eq!(defaults.location, "europe-west4");
        assert!(!defaults.use_vertexai);
    }

    #[test]
    fn test_without_google_env_builtin_defaults_stand() {
        let defaults = defaults_with(&[]);

        assert!(defaults.project_id.is_empty());
        assert_eq!(defaults.location, "us-central1");
        assert!(defaults.use_vertexai);
    }

    #[test]
    fn test_blank_google_values_are_ignored() {
        let env = GoogleEnv::from_lookup(lookup_from(&[("GOOGLE_CLOUD_LOCATION", "  ")]));
        assert!(env.collect().unwrap().is_empty());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" yes "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("nope"));
    }
}
