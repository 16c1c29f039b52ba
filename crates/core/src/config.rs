use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::DomainError;
use crate::suggestions::{
    CategoryPriorityTable, RankingSettings, DEFAULT_CATEGORY_LEVEL, DEFAULT_FETCH_LIMIT,
    DEFAULT_NOT_PRIORITY_RANK, DEFAULT_PRIORITY_CATEGORIES,
};

const MAX_FETCH_LIMIT: u32 = 10_000;
const MAX_CATEGORY_LEVEL: usize = 16;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub suggestions: SuggestionsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct SuggestionsConfig {
    pub fetch_limit: u32,
    pub category_level: usize,
    pub not_priority_rank: u32,
    pub mock_candidates: bool,
    pub priority_categories: BTreeMap<String, u32>,
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
    pub fetch_limit: Option<u32>,
    pub category_level: Option<usize>,
    pub mock_candidates: Option<bool>,
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
            suggestions: SuggestionsConfig {
                fetch_limit: DEFAULT_FETCH_LIMIT,
                category_level: DEFAULT_CATEGORY_LEVEL,
                not_priority_rank: DEFAULT_NOT_PRIORITY_RANK,
                mock_candidates: false,
                priority_categories: DEFAULT_PRIORITY_CATEGORIES
                    .iter()
                    .map(|(category, rank)| ((*category).to_owned(), *rank))
                    .collect(),
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

impl SuggestionsConfig {
    pub fn ranking_settings(&self) -> RankingSettings {
        RankingSettings {
            fetch_limit: self.fetch_limit,
            category_level: self.category_level,
            not_priority_rank: self.not_priority_rank,
        }
    }

    pub fn priority_table(&self) -> Result<CategoryPriorityTable, DomainError> {
        CategoryPriorityTable::new(
            self.priority_categories.iter().map(|(category, rank)| (category.clone(), *rank)),
        )
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
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("cartfill.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(suggestions) = patch.suggestions {
            if let Some(fetch_limit) = suggestions.fetch_limit {
                self.suggestions.fetch_limit = fetch_limit;
            }
            if let Some(category_level) = suggestions.category_level {
                self.suggestions.category_level = category_level;
            }
            if let Some(not_priority_rank) = suggestions.not_priority_rank {
                self.suggestions.not_priority_rank = not_priority_rank;
            }
            if let Some(mock_candidates) = suggestions.mock_candidates {
                self.suggestions.mock_candidates = mock_candidates;
            }
            // A file table replaces the built-in one wholesale.
            if let Some(priority_categories) = suggestions.priority_categories {
                self.suggestions.priority_categories = priority_categories;
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
        if let Some(value) = read_env("CARTFILL_SUGGESTIONS_FETCH_LIMIT") {
            self.suggestions.fetch_limit = parse_u32("CARTFILL_SUGGESTIONS_FETCH_LIMIT", &value)?;
        }
        if let Some(value) = read_env("CARTFILL_SUGGESTIONS_CATEGORY_LEVEL") {
            self.suggestions.category_level =
                parse_usize("CARTFILL_SUGGESTIONS_CATEGORY_LEVEL", &value)?;
        }
        if let Some(value) = read_env("CARTFILL_SUGGESTIONS_NOT_PRIORITY_RANK") {
            self.suggestions.not_priority_rank =
                parse_u32("CARTFILL_SUGGESTIONS_NOT_PRIORITY_RANK", &value)?;
        }

        let mock_flag = ["CARTFILL_SUGGESTIONS_MOCK", "CARTFILL_CART_SUGGEST_MOCK"]
            .into_iter()
            .find_map(|key| read_env(key).map(|value| (key, value)));
        if let Some((key, value)) = mock_flag {
            self.suggestions.mock_candidates = parse_bool(key, &value)?;
        }

        let log_level =
            read_env("CARTFILL_LOGGING_LEVEL").or_else(|| read_env("CARTFILL_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CARTFILL_LOGGING_FORMAT").or_else(|| read_env("CARTFILL_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(fetch_limit) = overrides.fetch_limit {
            self.suggestions.fetch_limit = fetch_limit;
        }
        if let Some(category_level) = overrides.category_level {
            self.suggestions.category_level = category_level;
        }
        if let Some(mock_candidates) = overrides.mock_candidates {
            self.suggestions.mock_candidates = mock_candidates;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_suggestions(&self.suggestions)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("cartfill.toml"), PathBuf::from("config/cartfill.toml")]
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

fn validate_suggestions(suggestions: &SuggestionsConfig) -> Result<(), ConfigError> {
    if suggestions.fetch_limit == 0 || suggestions.fetch_limit > MAX_FETCH_LIMIT {
        return Err(ConfigError::Validation(format!(
            "suggestions.fetch_limit must be in range 1..={MAX_FETCH_LIMIT}"
        )));
    }

    if suggestions.category_level > MAX_CATEGORY_LEVEL {
        return Err(ConfigError::Validation(format!(
            "suggestions.category_level must be in range 0..={MAX_CATEGORY_LEVEL}"
        )));
    }

    let invalid_entry = suggestions
        .priority_categories
        .iter()
        .find(|(category, rank)| category.is_empty() || **rank == 0);
    if let Some((category, _)) = invalid_entry {
        return Err(ConfigError::Validation(format!(
            "suggestions.priority_categories entry `{category}` needs a non-empty id and a rank of at least 1"
        )));
    }

    let max_rank = suggestions.priority_categories.values().copied().max().unwrap_or(0);
    if suggestions.not_priority_rank <= max_rank {
        return Err(ConfigError::Validation(format!(
            "suggestions.not_priority_rank must be greater than the highest priority rank ({max_rank})"
        )));
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

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    suggestions: Option<SuggestionsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SuggestionsPatch {
    fetch_limit: Option<u32>,
    category_level: Option<usize>,
    not_priority_rank: Option<u32>,
    mock_candidates: Option<bool>,
    priority_categories: Option<BTreeMap<String, u32>>,
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
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_built_in_ranking() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;
        let table =
            config.suggestions.priority_table().map_err(|err| format!("table failed: {err}"))?;

        ensure(config.suggestions.fetch_limit == 1000, "default fetch limit should be 1000")?;
        ensure(config.suggestions.category_level == 2, "default category level should be 2")?;
        ensure(config.suggestions.not_priority_rank == 100, "default fallback rank should be 100")?;
        ensure(!config.suggestions.mock_candidates, "mock mode should be off by default")?;
        ensure(table.rank_of("54276") == Some(1), "built-in table should rank 54276 first")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_CARTFILL_FETCH_LIMIT", "250");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("cartfill.toml");
            fs::write(
                &path,
                r#"
[suggestions]
fetch_limit = ${TEST_CARTFILL_FETCH_LIMIT}
not_priority_rank = 50

[suggestions.priority_categories]
"1001" = 1
"1002" = 2
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;
            let table = config
                .suggestions
                .priority_table()
                .map_err(|err| format!("table failed: {err}"))?;

            ensure(config.suggestions.fetch_limit == 250, "fetch limit should be interpolated")?;
            ensure(table.len() == 2, "file table should replace the built-in table")?;
            ensure(table.rank_of("54276").is_none(), "built-in categories should be gone")?;
            Ok(())
        })();

        clear_vars(&["TEST_CARTFILL_FETCH_LIMIT"]);
        result
    }

    #[test]
    fn mock_flag_alias_is_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CARTFILL_CART_SUGGEST_MOCK", "1");
        env::set_var("CARTFILL_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.suggestions.mock_candidates, "mock alias should enable fixture mode")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )
        })();

        clear_vars(&["CARTFILL_CART_SUGGEST_MOCK", "CARTFILL_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CARTFILL_SUGGESTIONS_FETCH_LIMIT", "300");
        env::set_var("CARTFILL_SUGGESTIONS_CATEGORY_LEVEL", "3");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("cartfill.toml");
            fs::write(
                &path,
                r#"
[suggestions]
fetch_limit = 200
category_level = 1
mock_candidates = true

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    fetch_limit: Some(400),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.suggestions.fetch_limit == 400, "override fetch limit should win")?;
            ensure(config.suggestions.category_level == 3, "env category level should win")?;
            ensure(config.suggestions.mock_candidates, "file mock flag should apply")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            Ok(())
        })();

        clear_vars(&["CARTFILL_SUGGESTIONS_FETCH_LIMIT", "CARTFILL_SUGGESTIONS_CATEGORY_LEVEL"]);
        result
    }

    #[test]
    fn fallback_rank_must_exceed_table_ranks() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CARTFILL_SUGGESTIONS_NOT_PRIORITY_RANK", "11");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("not_priority_rank")
            );
            ensure(has_message, "validation failure should mention not_priority_rank")
        })();

        clear_vars(&["CARTFILL_SUGGESTIONS_NOT_PRIORITY_RANK"]);
        result
    }

    #[test]
    fn invalid_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CARTFILL_SUGGESTIONS_MOCK", "sometimes");

        let result = (|| -> Result<(), String> {
            let is_invalid = matches!(
                AppConfig::load(LoadOptions::default()),
                Err(ConfigError::InvalidEnvOverride { ref key, .. })
                    if key == "CARTFILL_SUGGESTIONS_MOCK"
            );
            ensure(is_invalid, "non-boolean mock flag should be rejected")
        })();

        clear_vars(&["CARTFILL_SUGGESTIONS_MOCK"]);
        result
    }

    #[test]
    fn zero_rank_in_file_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("cartfill.toml");
        fs::write(&path, "[suggestions.priority_categories]\n\"54276\" = 0\n")
            .map_err(|err| err.to_string())?;

        let result =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() });

        let rejected = matches!(
            result,
            Err(ConfigError::Validation(ref message)) if message.contains("54276")
        );
        ensure(rejected, "zero rank should fail validation")
    }

    #[test]
    fn missing_required_file_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("absent.toml");

        let result = AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "missing required file should be reported",
        )
    }
}
