use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub cart: CartConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct CartConfig {
    pub directory: PathBuf,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub max_selection_retries: u32,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
    pub cart_directory: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434".to_string()),
                model: "llama3.1".to_string(),
                timeout_secs: 30,
                max_retries: 2,
            },
            cart: CartConfig { directory: PathBuf::from("shopping_cart") },
            session: SessionConfig { max_selection_retries: 5 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|anthropic|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Defaults, then the optional `martley.toml` patch, then `MARTLEY_*`
    /// environment overrides, then programmatic overrides, then validation.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("martley.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
        }

        if let Some(cart) = patch.cart {
            if let Some(directory) = cart.directory {
                self.cart.directory = PathBuf::from(directory);
            }
        }

        if let Some(session) = patch.session {
            if let Some(max_selection_retries) = session.max_selection_retries {
                self.session.max_selection_retries = max_selection_retries;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("MARTLEY_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("MARTLEY_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("MARTLEY_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("MARTLEY_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("MARTLEY_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("MARTLEY_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("MARTLEY_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("MARTLEY_LLM_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("MARTLEY_CART_DIRECTORY") {
            self.cart.directory = PathBuf::from(value);
        }

        if let Some(value) = read_env("MARTLEY_SESSION_MAX_SELECTION_RETRIES") {
            self.session.max_selection_retries =
                parse_u32("MARTLEY_SESSION_MAX_SELECTION_RETRIES", &value)?;
        }

        let log_level = read_env("MARTLEY_LOGGING_LEVEL").or_else(|| read_env("MARTLEY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("MARTLEY_LOGGING_FORMAT").or_else(|| read_env("MARTLEY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(cart_directory) = overrides.cart_directory {
            self.cart.directory = cart_directory;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Validation("llm.timeout_secs must be positive".to_string()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
        }
        if matches!(self.llm.provider, LlmProvider::OpenAi | LlmProvider::Anthropic)
            && self.llm.api_key.is_none()
        {
            return Err(ConfigError::Validation(format!(
                "llm.api_key is required for provider {:?}",
                self.llm.provider
            )));
        }
        if self.cart.directory.as_os_str().is_empty() {
            return Err(ConfigError::Validation("cart.directory must not be empty".to_string()));
        }
        if self.session.max_selection_retries == 0 {
            return Err(ConfigError::Validation(
                "session.max_selection_retries must be at least 1".to_string(),
            ));
        }
        match self.logging.level.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::Validation(format!(
                "unsupported logging level `{other}` (expected trace|debug|info|warn|error)"
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    cart: Option<CartPatch>,
    session: Option<SessionPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct CartPatch {
    directory: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    max_selection_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    let default = PathBuf::from("martley.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::{AppConfig, ConfigError, ConfigOverrides, LlmProvider, LoadOptions, LogFormat};

    fn load_from_toml(contents: &str) -> Result<AppConfig, ConfigError> {
        let mut file = tempfile::NamedTempFile::new().expect("temp config file");
        file.write_all(contents.as_bytes()).expect("write config");
        AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
    }

    #[test]
    fn defaults_use_local_ollama_without_credentials() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, LlmProvider::Ollama);
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.cart.directory.to_str(), Some("shopping_cart"));
        assert_eq!(config.session.max_selection_retries, 5);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn file_patch_overrides_defaults() {
        let config = load_from_toml(
            r#"
            [llm]
            provider = "openai"
            api_key = "sk-test"
            model = "gpt-4o-mini"
            timeout_secs = 10

            [cart]
            directory = "orders"

            [session]
            max_selection_retries = 3

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .expect("patched config loads");

        assert_eq!(config.llm.provider, LlmProvider::OpenAi);
        assert_eq!(
            config.llm.api_key.as_ref().map(|key| key.expose_secret().to_string()),
            Some("sk-test".to_string())
        );
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.timeout_secs, 10);
        assert_eq!(config.cart.directory.to_str(), Some("orders"));
        assert_eq!(config.session.max_selection_retries, 3);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn hosted_provider_without_key_fails_validation() {
        let result = load_from_toml("[llm]\nprovider = \"openai\"\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let result = load_from_toml("[llm]\ntimeout_secs = 0\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some("does-not-exist.toml".into()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        });
        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn programmatic_overrides_win_over_file_values() {
        let mut file = tempfile::NamedTempFile::new().expect("temp config file");
        file.write_all(b"[logging]\nlevel = \"warn\"\n").expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides {
                log_level: Some("error".to_string()),
                cart_directory: Some("elsewhere".into()),
                ..ConfigOverrides::default()
            },
        })
        .expect("config with overrides loads");

        assert_eq!(config.logging.level, "error");
        assert_eq!(config.cart.directory.to_str(), Some("elsewhere"));
    }

    #[test]
    fn unknown_provider_string_is_rejected() {
        let error = "groq".parse::<LlmProvider>().expect_err("unsupported provider");
        assert!(error.to_string().contains("unsupported llm provider"));
    }
}
