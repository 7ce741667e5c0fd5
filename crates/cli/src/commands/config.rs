use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use autostream_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_secret(key.expose_secret()))
        .unwrap_or_else(|| "(unset)".to_string());

    let entries: Vec<(&str, String, Option<&str>)> = vec![
        ("llm.api_key", api_key, Some("AUTOSTREAM_LLM_API_KEY")),
        ("llm.model", config.llm.model.clone(), Some("AUTOSTREAM_LLM_MODEL")),
        ("llm.base_url", config.llm.base_url.clone(), Some("AUTOSTREAM_LLM_BASE_URL")),
        (
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            Some("AUTOSTREAM_LLM_TIMEOUT_SECS"),
        ),
        (
            "storage.knowledge_path",
            config.storage.knowledge_path.display().to_string(),
            Some("AUTOSTREAM_KNOWLEDGE_PATH"),
        ),
        (
            "storage.leads_path",
            config.storage.leads_path.display().to_string(),
            Some("AUTOSTREAM_LEADS_PATH"),
        ),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            Some("AUTOSTREAM_SERVER_BIND_ADDRESS"),
        ),
        ("server.port", config.server.port.to_string(), Some("AUTOSTREAM_SERVER_PORT")),
        ("logging.level", config.logging.level.clone(), Some("AUTOSTREAM_LOGGING_LEVEL")),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            Some("AUTOSTREAM_LOGGING_FORMAT"),
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_var) in entries {
        let source =
            field_source(key, env_var, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(format!("  {key} = {value}  [{source}]"));
    }
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("autostream.toml"), PathBuf::from("config/autostream.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key: &str,
    env_var: Option<&str>,
    file_doc: Option<&Value>,
    file_path: Option<&Path>,
) -> String {
    // The credential has legacy aliases on top of the project-prefixed
    // variable.
    let mut env_candidates: Vec<&str> = env_var.into_iter().collect();
    if key == "llm.api_key" {
        env_candidates.extend(["GEMINI_API_KEY", "GOOGLE_API_KEY"]);
    }
    for candidate in env_candidates {
        if env::var(candidate).map(|value| !value.trim().is_empty()).unwrap_or(false) {
            return format!("env:{candidate}");
        }
    }

    if let (Some(doc), Some(path)) = (file_doc, file_path) {
        let mut cursor = Some(doc);
        for part in key.split('.') {
            cursor = cursor.and_then(|value| value.get(part));
        }
        if cursor.is_some() {
            return format!("file:{}", path.display());
        }
    }

    "default".to_string()
}

fn redact_secret(value: &str) -> String {
    if value.len() <= 4 {
        return "****".to_string();
    }
    format!("{}****", &value[..4])
}
