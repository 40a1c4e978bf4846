use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use finq_pipeline::PipelineConfig;

/// Environment variables with this prefix override the file, `__` nesting
/// into sections: `FINQ_PROVIDER__API_KEY`, `FINQ_PIPELINE__MAX_RETRIES`.
const ENV_PREFIX: &str = "FINQ_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderSection,
    pub google: GoogleSection,
    pub bing: BingSection,
    pub reddit: RedditSection,
    pub pipeline: PipelineConfig,
}

/// OpenAI-compatible reasoning service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSection {
    pub api_key: Option<String>,
    /// Programmable Search Engine id (`cx`)
    pub engine_id: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BingSection {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditSection {
    pub user_agent: Option<String>,
    pub limit: Option<u32>,
}

/// Expand environment variables in a path string
/// Supports: $VAR, ${VAR}, ~
pub fn expand_path(path: &str) -> PathBuf {
    let mut result = path.to_string();

    if result.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            result = format!("{}{}", home.display(), &result[1..]);
        }
    } else if result == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }

    let re = regex::Regex::new(r"\$\{?([A-Za-z_][A-Za-z0-9_]*)\}?").unwrap();
    let expanded = re.replace_all(&result, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    });

    PathBuf::from(expanded.to_string())
}

impl Config {
    /// Load from `path` (or the default location) and the environment.
    ///
    /// An explicit path must exist; a missing default file is fine, since
    /// everything can come from `FINQ_*` variables.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let path = match path {
            Some(p) => {
                let path = expand_path(p);
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                path
            }
            None => Self::config_path()?,
        };
        Self::from_figment(Self::figment(&path))
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        figment.extract().context("Invalid configuration")
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("finq").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [provider]
            api_key = "sk-test"
            model = "gpt-4o-mini"

            [google]
            api_key = "g-key"
            engine_id = "cx-1"

            [bing]
            api_key = "b-key"

            [pipeline]
            max_retries = 3
            reddit_triage = false
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.google.engine_id.as_deref(), Some("cx-1"));
        assert_eq!(config.bing.api_key.as_deref(), Some("b-key"));
        assert!(config.reddit.user_agent.is_none());
        assert_eq!(config.pipeline.max_retries, 3);
        assert!(!config.pipeline.reddit_triage);
        // Unset pipeline fields keep their defaults
        assert_eq!(config.pipeline.call_timeout_secs, 60);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.provider.api_key.is_none());
        assert_eq!(config.pipeline, PipelineConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[provider]\nbase_url = \"http://localhost:8080/v1\"\n\n[reddit]\nlimit = 25"
        )
        .unwrap();

        let config = Config::from_figment(Config::figment(file.path())).unwrap();
        assert_eq!(
            config.provider.base_url.as_deref(),
            Some("http://localhost:8080/v1")
        );
        assert_eq!(config.reddit.limit, Some(25));
    }

    #[test]
    fn test_missing_default_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config::from_figment(Config::figment(&path)).unwrap();
        assert_eq!(config.pipeline, PipelineConfig::default());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let err = Config::load(Some(path.to_str().unwrap())).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline]\nmax_retries = \"lots\"").unwrap();
        assert!(Config::from_figment(Config::figment(file.path())).is_err());
    }

    #[test]
    fn test_expand_path() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_path("~"), home);
        assert_eq!(expand_path("~/finq.toml"), home.join("finq.toml"));
        assert_eq!(
            expand_path("$FINQ_SURELY_UNSET_VAR/x"),
            PathBuf::from("$FINQ_SURELY_UNSET_VAR/x")
        );
    }
}
