use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Effective runtime configuration.
///
/// Layering, lowest precedence first: built-in defaults, optional TOML
/// file (`triage.toml` or `config/triage.toml`, with `${ENV}`
/// interpolation), `TRIAGE_*` environment variables, programmatic
/// [`ConfigOverrides`]. Validation runs once over the merged result.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub chat: ChatConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

/// Knobs for the orchestration loop and context window.
#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// Hard cap on generate/tool rounds per request.
    pub max_rounds: u32,
    /// Trailing slice of the transcript sent to the model.
    pub context_window: usize,
    /// Fallback user when the request omits `user_id`.
    pub default_user_id: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub log_level: Option<String>,
    pub max_rounds: Option<u32>,
    pub context_window: Option<usize>,
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

/// Seeded demo user the chat endpoint falls back to when the request
/// carries no `user_id`.
pub const DEFAULT_DEMO_USER_ID: &str = "a7b50481-1089-49a0-97b0-5939536d53d1";

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://triage.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            llm: LlmConfig {
                base_url: "http://localhost:11434".to_string(),
                api_key: None,
                model: "llama3.1".to_string(),
                timeout_secs: 120,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 3001,
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            chat: ChatConfig {
                max_rounds: 5,
                context_window: 10,
                default_user_id: DEFAULT_DEMO_USER_ID.to_string(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
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
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("triage.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(api_key_value) = llm.api_key {
                self.llm.api_key = Some(api_key_value.into());
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(chat) = patch.chat {
            if let Some(max_rounds) = chat.max_rounds {
                self.chat.max_rounds = max_rounds;
            }
            if let Some(context_window) = chat.context_window {
                self.chat.context_window = context_window;
            }
            if let Some(default_user_id) = chat.default_user_id {
                self.chat.default_user_id = default_user_id;
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
        if let Some(value) = read_env("TRIAGE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("TRIAGE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("TRIAGE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("TRIAGE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("TRIAGE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TRIAGE_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("TRIAGE_LLM_API_KEY") {
            self.llm.api_key = Some(value.into());
        }
        if let Some(value) = read_env("TRIAGE_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("TRIAGE_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("TRIAGE_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TRIAGE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("TRIAGE_SERVER_PORT") {
            self.server.port = parse_u16("TRIAGE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("TRIAGE_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port = parse_u16("TRIAGE_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("TRIAGE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("TRIAGE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("TRIAGE_CHAT_MAX_ROUNDS") {
            self.chat.max_rounds = parse_u32("TRIAGE_CHAT_MAX_ROUNDS", &value)?;
        }
        if let Some(value) = read_env("TRIAGE_CHAT_CONTEXT_WINDOW") {
            self.chat.context_window =
                parse_u32("TRIAGE_CHAT_CONTEXT_WINDOW", &value)? as usize;
        }
        if let Some(value) = read_env("TRIAGE_CHAT_DEFAULT_USER_ID") {
            self.chat.default_user_id = value;
        }

        let log_level = read_env("TRIAGE_LOGGING_LEVEL").or_else(|| read_env("TRIAGE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TRIAGE_LOGGING_FORMAT").or_else(|| read_env("TRIAGE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = llm_base_url;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(max_rounds) = overrides.max_rounds {
            self.chat.max_rounds = max_rounds;
        }
        if let Some(context_window) = overrides.context_window {
            self.chat.context_window = context_window;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_llm(&self.llm)?;
        validate_server(&self.server)?;
        validate_chat(&self.chat)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("triage.toml"), PathBuf::from("config/triage.toml")]
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

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url = url.starts_with("sqlite:") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...` or `:memory:`)".to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.base_url.trim().is_empty() {
        return Err(ConfigError::Validation("llm.base_url must not be empty".to_string()));
    }
    if !llm.base_url.starts_with("http://") && !llm.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }
    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }
    if llm.timeout_secs == 0 || llm.timeout_secs > 600 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=600".to_string(),
        ));
    }
    if let Some(api_key) = &llm.api_key {
        if api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "llm.api_key must not be blank when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.health_check_port == server.port {
        return Err(ConfigError::Validation(
            "server.health_check_port must differ from server.port".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_chat(chat: &ChatConfig) -> Result<(), ConfigError> {
    if chat.max_rounds == 0 || chat.max_rounds > 25 {
        return Err(ConfigError::Validation(
            "chat.max_rounds must be in range 1..=25".to_string(),
        ));
    }

    if chat.context_window == 0 || chat.context_window > 200 {
        return Err(ConfigError::Validation(
            "chat.context_window must be in range 1..=200".to_string(),
        ));
    }

    if chat.default_user_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "chat.default_user_id must not be empty".to_string(),
        ));
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

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
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
    database: Option<DatabasePatch>,
    llm: Option<LlmPatch>,
    server: Option<ServerPatch>,
    chat: Option<ChatPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatPatch {
    max_rounds: Option<u32>,
    context_window: Option<usize>,
    default_user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{AppConfig, ConfigOverrides, LoadOptions, LogFormat, DEFAULT_DEMO_USER_ID};

    fn options_with_db(url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[test]
    fn defaults_validate_and_carry_seeded_user() {
        let config = AppConfig::load(LoadOptions::default()).expect("defaults should load");
        assert_eq!(config.chat.max_rounds, 5);
        assert_eq!(config.chat.context_window, 10);
        assert_eq!(config.chat.default_user_id, DEFAULT_DEMO_USER_ID);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn overrides_take_precedence_over_defaults() {
        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                llm_model: Some("qwen2.5".to_string()),
                max_rounds: Some(3),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("load");

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.llm.model, "qwen2.5");
        assert_eq!(config.chat.max_rounds, 3);
    }

    #[test]
    fn toml_file_patches_individual_sections() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(
            file,
            "[chat]\nmax_rounds = 7\n\n[llm]\nmodel = \"mistral\"\n\n[database]\nurl = \"sqlite::memory:\"\n"
        )
        .expect("write");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            ..LoadOptions::default()
        })
        .expect("load");

        assert_eq!(config.chat.max_rounds, 7);
        assert_eq!(config.llm.model, "mistral");
        // unpatched sections keep defaults
        assert_eq!(config.chat.context_window, 10);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some("does-not-exist.toml".into()),
            require_file: true,
            ..LoadOptions::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn rejects_non_sqlite_database_url() {
        let result = AppConfig::load(options_with_db("postgres://localhost/triage"));
        let message = result.err().expect("validation error").to_string();
        assert!(message.contains("database.url"));
    }

    #[test]
    fn rejects_zero_round_cap() {
        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides { max_rounds: Some(0), ..ConfigOverrides::default() },
            ..LoadOptions::default()
        });
        let message = result.err().expect("validation error").to_string();
        assert!(message.contains("chat.max_rounds"));
    }
}
