use cartfill_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

use crate::commands::CommandResult;

const COMMAND: &str = "categories";

#[derive(Debug, Serialize)]
struct CategoryRank<'a> {
    category: &'a str,
    rank: u32,
}

#[derive(Debug, Serialize)]
struct CategoriesOutput<'a> {
    command: &'static str,
    status: &'static str,
    category_level: usize,
    not_priority_rank: u32,
    categories: Vec<CategoryRank<'a>>,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2)
        }
    };
    let table = match config.suggestions.priority_table() {
        Ok(table) => table,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2)
        }
    };

    let categories = table
        .entries()
        .into_iter()
        .map(|(category, rank)| CategoryRank { category, rank })
        .collect();

    CommandResult::json(
        COMMAND,
        &CategoriesOutput {
            command: COMMAND,
            status: "ok",
            category_level: config.suggestions.category_level,
            not_priority_rank: config.suggestions.not_priority_rank,
            categories,
        },
    )
}
