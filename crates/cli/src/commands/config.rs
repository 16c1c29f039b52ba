use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use cartfill_core::config::{AppConfig, LoadOptions};
use toml::Value;

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("config", "config_validation", error.to_string(), 2)
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let priority_categories = config
        .suggestions
        .priority_categories
        .iter()
        .map(|(category, rank)| format!("{category}:{rank}"))
        .collect::<Vec<_>>()
        .join(",");

    let lines = vec![
        "effective config (source precedence: env > file > default):".to_string(),
        render_line(
            "suggestions.fetch_limit",
            &config.suggestions.fetch_limit.to_string(),
            source("suggestions.fetch_limit", &["CARTFILL_SUGGESTIONS_FETCH_LIMIT"]),
        ),
        render_line(
            "suggestions.category_level",
            &config.suggestions.category_level.to_string(),
            source("suggestions.category_level", &["CARTFILL_SUGGESTIONS_CATEGORY_LEVEL"]),
        ),
        render_line(
            "suggestions.not_priority_rank",
            &config.suggestions.not_priority_rank.to_string(),
            source("suggestions.not_priority_rank", &["CARTFILL_SUGGESTIONS_NOT_PRIORITY_RANK"]),
        ),
        render_line(
            "suggestions.mock_candidates",
            &config.suggestions.mock_candidates.to_string(),
            source(
                "suggestions.mock_candidates",
                &["CARTFILL_SUGGESTIONS_MOCK", "CARTFILL_CART_SUGGEST_MOCK"],
            ),
        ),
        render_line(
            "suggestions.priority_categories",
            &priority_categories,
            source("suggestions.priority_categories", &[]),
        ),
        render_line(
            "logging.level",
            &config.logging.level,
            source("logging.level", &["CARTFILL_LOGGING_LEVEL", "CARTFILL_LOG_LEVEL"]),
        ),
        render_line(
            "logging.format",
            &format!("{:?}", config.logging.format),
            source("logging.format", &["CARTFILL_LOGGING_FORMAT", "CARTFILL_LOG_FORMAT"]),
        ),
    ];

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("cartfill.toml"), PathBuf::from("config/cartfill.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env_is_set(key)) {
        return format!("env ({env_key})");
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

/// Blank values are not overrides.
fn env_is_set(key: &str) -> bool {
    env::var(key).is_ok_and(|value| !value.trim().is_empty())
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
