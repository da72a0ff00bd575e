//! Collaborator configuration and factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use critica_core::traits::{ClaimVerifier, TextGenerator};
use critica_core::verification::VerificationSettings;
use critica_core::Engine;

use crate::factcheck::{self, FactCheckClient};
use crate::openai::{self, OpenAiGenerator};

/// Fact-check API settings.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct FactCheckConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Language used when a request carries no hint.
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_factcheck_timeout")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for FactCheckConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactCheckConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for FactCheckConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            language: default_language(),
            timeout_secs: default_factcheck_timeout(),
        }
    }
}

/// Text generation backend.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GeneratorConfig {
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default = "default_model")]
        model: String,
        #[serde(default = "default_generator_timeout")]
        timeout_secs: u64,
    },
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorConfig::OpenAI {
                api_key: _,
                base_url,
                model,
                timeout_secs,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("model", model)
                .field("timeout_secs", timeout_secs)
                .finish(),
        }
    }
}

fn default_language() -> String {
    "es".to_string()
}
fn default_factcheck_timeout() -> u64 {
    factcheck::DEFAULT_TIMEOUT_SECS
}
fn default_model() -> String {
    openai::DEFAULT_MODEL.to_string()
}
fn default_generator_timeout() -> u64 {
    openai::DEFAULT_TIMEOUT_SECS
}

/// Top-level critica configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CriticaConfig {
    #[serde(default)]
    pub fact_check: Option<FactCheckConfig>,
    #[serde(default)]
    pub generator: Option<GeneratorConfig>,
    #[serde(default)]
    pub verification: VerificationSettings,
}

/// Written by `critica init`.
pub const SAMPLE_CONFIG: &str = r#"# critica configuration

[fact_check]
api_key = "${GOOGLE_FACTCHECK_API_KEY}"
language = "es"
timeout_secs = 8

[generator]
type = "openai"
api_key = "${OPENAI_API_KEY}"
model = "gpt-4.1-mini"

[verification]
max_sentences = 5
min_words = 5
concurrency = 3
rate_limit_backoff_ms = 1000
"#;

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Inserted values are not scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_generator_config(config: &GeneratorConfig) -> GeneratorConfig {
    match config {
        GeneratorConfig::OpenAI {
            api_key,
            base_url,
            model,
            timeout_secs,
        } => GeneratorConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            model: resolve_env_vars(model),
            timeout_secs: *timeout_secs,
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `critica.toml` in the current directory
/// 2. `~/.config/critica/config.toml`
///
/// Environment variable overrides: `CRITICA_FACTCHECK_KEY`, `CRITICA_OPENAI_KEY`.
pub fn load_config() -> Result<CriticaConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<CriticaConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("critica.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loading config");
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => CriticaConfig::default(),
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse TOML and resolve `${VAR}` references.
pub fn parse_config(content: &str) -> Result<CriticaConfig> {
    let mut config: CriticaConfig = toml::from_str(content)?;
    if let Some(fc) = config.fact_check.as_mut() {
        fc.api_key = resolve_env_vars(&fc.api_key);
        fc.base_url = fc.base_url.as_ref().map(|u| resolve_env_vars(u));
    }
    config.generator = config.generator.as_ref().map(resolve_generator_config);
    Ok(config)
}

fn apply_env_overrides(config: &mut CriticaConfig) {
    if let Ok(key) = std::env::var("CRITICA_FACTCHECK_KEY") {
        config.fact_check.get_or_insert_with(FactCheckConfig::default).api_key = key;
    }

    if let Ok(key) = std::env::var("CRITICA_OPENAI_KEY") {
        match config.generator.as_mut() {
            Some(GeneratorConfig::OpenAI { api_key, .. }) => *api_key = key,
            None => {
                config.generator = Some(GeneratorConfig::OpenAI {
                    api_key: key,
                    base_url: None,
                    model: default_model(),
                    timeout_secs: default_generator_timeout(),
                })
            }
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("critica"))
}

/// Create the claim verifier described by `config`.
pub fn create_verifier(config: &FactCheckConfig) -> Result<Arc<dyn ClaimVerifier>> {
    let client = FactCheckClient::new(
        &config.api_key,
        config.base_url.clone(),
        &config.language,
        config.timeout_secs,
    )?;
    Ok(Arc::new(client))
}

/// Create the text generator described by `config`.
pub fn create_generator(config: &GeneratorConfig) -> Result<Arc<dyn TextGenerator>> {
    match config {
        GeneratorConfig::OpenAI {
            api_key,
            base_url,
            model,
            timeout_secs,
        } => Ok(Arc::new(OpenAiGenerator::new(
            api_key,
            base_url.clone(),
            model,
            *timeout_secs,
        )?)),
    }
}

/// Build an [`Engine`] with every collaborator the configuration can supply.
///
/// A collaborator whose credentials are missing is left out with a warning;
/// the engine then reports it as unavailable when a caller needs it.
pub fn engine_from_config(config: &CriticaConfig) -> Engine {
    let mut builder = Engine::builder();

    if let Some(fc) = &config.fact_check {
        match create_verifier(fc) {
            Ok(verifier) => builder = builder.verifier(verifier, config.verification.clone()),
            Err(e) => tracing::warn!("fact-check verifier disabled: {e:#}"),
        }
    }

    if let Some(generator_config) = &config.generator {
        match create_generator(generator_config) {
            Ok(generator) => builder = builder.generator(generator),
            Err(e) => tracing::warn!("text generator disabled: {e:#}"),
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_CRITICA_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_CRITICA_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_CRITICA_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        std::env::remove_var("_CRITICA_TEST_VAR");
    }

    #[test]
    fn unterminated_reference_is_left_alone() {
        assert_eq!(resolve_env_vars("abc${OPEN"), "abc${OPEN");
    }

    #[test]
    fn resolved_values_are_not_expanded_again() {
        std::env::set_var("_CRITICA_TEST_NESTED", "x${_CRITICA_TEST_NESTED}y");
        assert_eq!(
            resolve_env_vars("a-${_CRITICA_TEST_NESTED}-b"),
            "a-x${_CRITICA_TEST_NESTED}y-b"
        );
    }

    #[test]
    fn default_config_has_no_collaborators() {
        let config = CriticaConfig::default();
        assert!(config.fact_check.is_none());
        assert!(config.generator.is_none());
        assert_eq!(config.verification.max_sentences, 5);

        let engine = engine_from_config(&config);
        assert!(!engine.has_verifier());
        assert!(!engine.has_generator());
    }

    #[test]
    fn parse_full_config() {
        std::env::set_var("_CRITICA_TEST_OPENAI", "sk-from-env");
        let config = parse_config(
            r#"
[fact_check]
api_key = "fc-key"
language = "en"

[generator]
type = "openai"
api_key = "${_CRITICA_TEST_OPENAI}"
base_url = "http://localhost:9999"

[verification]
max_sentences = 2
concurrency = 1
"#,
        )
        .unwrap();
        std::env::remove_var("_CRITICA_TEST_OPENAI");

        let fc = config.fact_check.as_ref().unwrap();
        assert_eq!(fc.language, "en");
        assert_eq!(fc.timeout_secs, 8);
        match config.generator.as_ref().unwrap() {
            GeneratorConfig::OpenAI { api_key, model, .. } => {
                assert_eq!(api_key, "sk-from-env");
                assert_eq!(model, "gpt-4.1-mini");
            }
        }
        assert_eq!(config.verification.max_sentences, 2);
        assert_eq!(config.verification.min_words, 5);

        let engine = engine_from_config(&config);
        assert!(engine.has_verifier());
        assert!(engine.has_generator());
    }

    #[test]
    fn sample_config_parses() {
        let config: CriticaConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert!(config.fact_check.is_some());
        assert!(config.generator.is_some());
    }

    #[test]
    fn blank_key_disables_collaborator() {
        let config = CriticaConfig {
            fact_check: Some(FactCheckConfig::default()),
            ..Default::default()
        };
        assert!(create_verifier(config.fact_check.as_ref().unwrap()).is_err());
        assert!(!engine_from_config(&config).has_verifier());
    }

    #[test]
    fn debug_masks_keys() {
        let fc = FactCheckConfig {
            api_key: "super-secret".into(),
            ..Default::default()
        };
        let generator = GeneratorConfig::OpenAI {
            api_key: "sk-secret".into(),
            base_url: None,
            model: default_model(),
            timeout_secs: 60,
        };
        assert!(!format!("{fc:?}").contains("super-secret"));
        assert!(!format!("{generator:?}").contains("sk-secret"));
    }

    #[test]
    fn explicit_path_must_exist() {
        let err = load_config_from(Some(Path::new("/nonexistent/critica.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("critica.toml");
        std::fs::write(&path, "[verification]\nmax_sentences = 3\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.verification.max_sentences, 3);
    }
}
