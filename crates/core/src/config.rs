use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub knowledge_path: PathBuf,
    pub leads_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
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
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub knowledge_path: Option<PathBuf>,
    pub leads_path: Option<PathBuf>,
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
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                api_key: None,
                model: "gemini-2.0-flash".to_string(),
                base_url: "https://generativelanguage.googleapis.com".to_string(),
                timeout_secs: 30,
            },
            storage: StorageConfig {
                knowledge_path: PathBuf::from("data/knowledge_base.json"),
                leads_path: PathBuf::from("data/leads.jsonl"),
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8080 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
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
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("autostream.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(storage) = patch.storage {
            if let Some(knowledge_path) = storage.knowledge_path {
                self.storage.knowledge_path = knowledge_path;
            }
            if let Some(leads_path) = storage.leads_path {
                self.storage.leads_path = leads_path;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
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
        // The original deployment reads the credential from GEMINI_API_KEY
        // or GOOGLE_API_KEY, so both stay accepted alongside the
        // project-prefixed variable.
        let api_key = read_env("AUTOSTREAM_LLM_API_KEY")
            .or_else(|| read_env("GEMINI_API_KEY"))
            .or_else(|| read_env("GOOGLE_API_KEY"));
        if let Some(value) = api_key {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("AUTOSTREAM_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("AUTOSTREAM_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("AUTOSTREAM_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("AUTOSTREAM_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("AUTOSTREAM_KNOWLEDGE_PATH") {
            self.storage.knowledge_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("AUTOSTREAM_LEADS_PATH") {
            self.storage.leads_path = PathBuf::from(value);
        }

        if let Some(value) = read_env("AUTOSTREAM_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("AUTOSTREAM_SERVER_PORT") {
            self.server.port = parse_u16("AUTOSTREAM_SERVER_PORT", &value)?;
        }

        if let Some(value) = read_env("AUTOSTREAM_LOGGING_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("AUTOSTREAM_LOGGING_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(api_key) = overrides.api_key {
            self.llm.api_key = Some(secret_value(api_key));
        }
        if let Some(model) = overrides.model {
            self.llm.model = model;
        }
        if let Some(knowledge_path) = overrides.knowledge_path {
            self.storage.knowledge_path = knowledge_path;
        }
        if let Some(leads_path) = overrides.leads_path {
            self.storage.leads_path = leads_path;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_storage(&self.storage)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("autostream.toml"), PathBuf::from("config/autostream.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    // Fatal startup condition: the classifier cannot run without the
    // credential, and a silent degraded mode is not part of the contract.
    let missing =
        llm.api_key.as_ref().map(|value| value.expose_secret().trim().is_empty()).unwrap_or(true);
    if missing {
        return Err(ConfigError::Validation(
            "llm.api_key is required. Set AUTOSTREAM_LLM_API_KEY (or GEMINI_API_KEY / GOOGLE_API_KEY)"
                .to_string(),
        ));
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if !llm.base_url.starts_with("http://") && !llm.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    Ok(())
}

fn validate_storage(storage: &StorageConfig) -> Result<(), ConfigError> {
    if storage.knowledge_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "storage.knowledge_path must not be empty".to_string(),
        ));
    }
    if storage.leads_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("storage.leads_path must not be empty".to_string()));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation(
            "server.bind_address must not be empty".to_string(),
        ));
    }
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    storage: Option<StoragePatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct StoragePatch {
    knowledge_path: Option<PathBuf>,
    leads_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const AGENT_VARS: &[&str] = &[
        "AUTOSTREAM_LLM_API_KEY",
        "GEMINI_API_KEY",
        "GOOGLE_API_KEY",
        "AUTOSTREAM_LLM_MODEL",
        "AUTOSTREAM_LLM_BASE_URL",
        "AUTOSTREAM_LLM_TIMEOUT_SECS",
        "AUTOSTREAM_KNOWLEDGE_PATH",
        "AUTOSTREAM_LEADS_PATH",
        "AUTOSTREAM_SERVER_BIND_ADDRESS",
        "AUTOSTREAM_SERVER_PORT",
        "AUTOSTREAM_LOGGING_LEVEL",
        "AUTOSTREAM_LOGGING_FORMAT",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars() {
        for var in AGENT_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let _guard = env_lock().lock().expect("env lock");
        clear_vars();

        let result = AppConfig::load(LoadOptions::default());
        let error = result.err().expect("load should fail without a credential");
        assert!(matches!(error, ConfigError::Validation(_)));
        assert!(error.to_string().contains("llm.api_key"));
    }

    #[test]
    fn gemini_env_var_satisfies_the_credential() {
        let _guard = env_lock().lock().expect("env lock");
        clear_vars();
        env::set_var("GEMINI_API_KEY", "test-key");

        let config = AppConfig::load(LoadOptions::default()).expect("load should succeed");
        assert_eq!(config.llm.api_key.expect("api key").expose_secret(), "test-key");

        clear_vars();
    }

    #[test]
    fn env_overrides_take_precedence_over_file() {
        let _guard = env_lock().lock().expect("env lock");
        clear_vars();

        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("autostream.toml");
        fs::write(
            &path,
            r#"
[llm]
api_key = "file-key"
model = "gemini-1.5-flash"

[logging]
level = "debug"
format = "json"
"#,
        )
        .expect("write config file");

        env::set_var("AUTOSTREAM_LLM_MODEL", "gemini-2.0-flash");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(path),
            ..LoadOptions::default()
        })
        .expect("load should succeed");

        assert_eq!(config.llm.model, "gemini-2.0-flash");
        assert_eq!(config.llm.api_key.as_ref().expect("api key").expose_secret(), "file-key");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);

        clear_vars();
    }

    #[test]
    fn file_load_supports_env_interpolation() {
        let _guard = env_lock().lock().expect("env lock");
        clear_vars();
        env::set_var("TEST_AUTOSTREAM_KEY", "interpolated-key");

        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("autostream.toml");
        fs::write(
            &path,
            r#"
[llm]
api_key = "${TEST_AUTOSTREAM_KEY}"
"#,
        )
        .expect("write config file");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(path),
            ..LoadOptions::default()
        })
        .expect("load should succeed");

        assert_eq!(
            config.llm.api_key.as_ref().expect("api key").expose_secret(),
            "interpolated-key"
        );

        env::remove_var("TEST_AUTOSTREAM_KEY");
        clear_vars();
    }

    #[test]
    fn require_file_fails_when_config_is_absent() {
        let _guard = env_lock().lock().expect("env lock");
        clear_vars();

        let missing = PathBuf::from("/nonexistent/autostream.toml");
        let result = AppConfig::load(LoadOptions {
            config_path: Some(missing),
            require_file: true,
            ..LoadOptions::default()
        });

        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn invalid_env_port_is_rejected() {
        let _guard = env_lock().lock().expect("env lock");
        clear_vars();
        env::set_var("GEMINI_API_KEY", "test-key");
        env::set_var("AUTOSTREAM_SERVER_PORT", "not-a-port");

        let result = AppConfig::load(LoadOptions::default());
        assert!(matches!(result, Err(ConfigError::InvalidEnvOverride { .. })));

        clear_vars();
    }

    #[test]
    fn programmatic_overrides_win_over_env() {
        let _guard = env_lock().lock().expect("env lock");
        clear_vars();
        env::set_var("GEMINI_API_KEY", "env-key");

        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                api_key: Some("override-key".to_string()),
                leads_path: Some(PathBuf::from("/tmp/leads.jsonl")),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("load should succeed");

        assert_eq!(config.llm.api_key.as_ref().expect("api key").expose_secret(), "override-key");
        assert_eq!(config.storage.leads_path, PathBuf::from("/tmp/leads.jsonl"));

        clear_vars();
    }
}
