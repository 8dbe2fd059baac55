use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use martley_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "llm.provider",
        &format!("{:?}", config.llm.provider),
        field_source(
            "llm.provider",
            Some("MARTLEY_LLM_PROVIDER"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "llm.model",
        &config.llm.model,
        field_source(
            "llm.model",
            Some("MARTLEY_LLM_MODEL"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "llm.base_url",
        config.llm.base_url.as_deref().unwrap_or("<unset>"),
        field_source(
            "llm.base_url",
            Some("MARTLEY_LLM_BASE_URL"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    let llm_api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "llm.api_key",
        llm_api_key,
        field_source(
            "llm.api_key",
            Some("MARTLEY_LLM_API_KEY"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "llm.timeout_secs",
        &config.llm.timeout_secs.to_string(),
        field_source(
            "llm.timeout_secs",
            Some("MARTLEY_LLM_TIMEOUT_SECS"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "llm.max_retries",
        &config.llm.max_retries.to_string(),
        field_source(
            "llm.max_retries",
            Some("MARTLEY_LLM_MAX_RETRIES"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "cart.directory",
        &config.cart.directory.display().to_string(),
        field_source(
            "cart.directory",
            Some("MARTLEY_CART_DIRECTORY"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "session.max_selection_retries",
        &config.session.max_selection_retries.to_string(),
        field_source(
            "session.max_selection_retries",
            Some("MARTLEY_SESSION_MAX_SELECTION_RETRIES"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source(
            "logging.level",
            Some("MARTLEY_LOGGING_LEVEL"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        field_source(
            "logging.format",
            Some("MARTLEY_LOGGING_FORMAT"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("martley.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/martley.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
