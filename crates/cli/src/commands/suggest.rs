use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use cartfill_core::config::{AppConfig, LoadOptions};
use cartfill_core::suggestions::{
    BlockInfo, CandidateProvider, CategoryPriorityTable, FixtureCandidateProvider,
    InMemoryCandidateProvider, ModelRequest, RankingSettings, SuggestionEngine, SuggestionRequest,
    SuggestionResult, DEFAULT_MAX_SUGGESTIONS,
};
use cartfill_core::{ApplicationError, ProductCandidate};
use clap::Args;
use serde::Serialize;
use tokio::runtime::Runtime;
use tracing::info;
use uuid::Uuid;

use crate::commands::CommandResult;

const COMMAND: &str = "suggest";

#[derive(Debug, Clone, Args)]
pub struct SuggestArgs {
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Order value still missing to reach the threshold"
    )]
    pub gap: f64,
    #[arg(long, default_value = "", help = "Comma-delimited product ids already in the cart")]
    pub cart: String,
    #[arg(long, default_value_t = DEFAULT_MAX_SUGGESTIONS, help = "Maximum suggestions")]
    pub limit: usize,
    #[arg(long, default_value = "", help = "Pagination cursor forwarded to the provider")]
    pub cursor: String,
    #[arg(long, default_value = "cart_suggest", help = "Placement block code")]
    pub block_code: String,
    #[arg(long, default_value_t = 0, help = "Placement block id")]
    pub block_id: u64,
    #[arg(long, default_value = "rule_base", help = "Recommendation model name")]
    pub model: String,
    #[arg(
        long = "query",
        value_parser = parse_key_value,
        help = "Query parameter as key=value (repeatable)"
    )]
    pub query: Vec<(String, String)>,
    #[arg(long, help = "JSON candidate list (required unless mock mode is enabled)")]
    pub candidates: Option<PathBuf>,
}

impl SuggestArgs {
    pub fn new(gap: f64) -> Self {
        Self {
            gap,
            cart: String::new(),
            limit: DEFAULT_MAX_SUGGESTIONS,
            cursor: String::new(),
            block_code: "cart_suggest".to_string(),
            block_id: 0,
            model: "rule_base".to_string(),
            query: Vec::new(),
            candidates: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct SuggestOutput<'a> {
    command: &'static str,
    status: &'static str,
    correlation_id: &'a str,
    count: usize,
    products: &'a [ProductCandidate],
    model_debug: Option<&'a serde_json::Value>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got `{raw}`")),
    }
}

pub fn run(args: SuggestArgs) -> CommandResult {
    let correlation_id = Uuid::new_v4().to_string();

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            let error = ApplicationError::Configuration(error.to_string());
            return application_failure(error, &correlation_id);
        }
    };
    let table = match config.suggestions.priority_table() {
        Ok(table) => Arc::new(table),
        Err(error) => return application_failure(error.into(), &correlation_id),
    };
    let settings = config.suggestions.ranking_settings();

    let request = build_request(&correlation_id, &args);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure(COMMAND, "runtime", error.to_string(), 5),
    };

    if config.suggestions.mock_candidates {
        info!(
            event_name = "cli.suggest.source_selected",
            correlation_id = %correlation_id,
            source = "fixture",
            "using canned candidate fixture"
        );
        return execute(&runtime, FixtureCandidateProvider::default(), table, settings, &request);
    }

    let Some(path) = args.candidates.as_deref() else {
        return CommandResult::failure(
            COMMAND,
            "input",
            "--candidates is required unless mock mode is enabled",
            3,
        );
    };
    let provider = match load_candidates(path) {
        Ok(provider) => provider,
        Err(error) => return CommandResult::failure(COMMAND, "input", format!("{error:#}"), 3),
    };
    info!(
        event_name = "cli.suggest.source_selected",
        correlation_id = %correlation_id,
        source = "file",
        path = %path.display(),
        candidates = provider.len(),
        "loaded candidate file"
    );

    execute(&runtime, provider, table, settings, &request)
}

fn build_request(correlation_id: &str, args: &SuggestArgs) -> SuggestionRequest {
    let query: BTreeMap<String, String> = args.query.iter().cloned().collect();

    SuggestionRequest::new(correlation_id, args.gap)
        .with_cart_product_ids(args.cart.clone())
        .with_limit(args.limit)
        .with_cursor(args.cursor.clone())
        .with_block(BlockInfo { id: args.block_id, code: args.block_code.clone() })
        .with_model_request(ModelRequest { model: args.model.clone(), params: BTreeMap::new() })
        .with_query(query)
}

fn load_candidates(path: &Path) -> Result<InMemoryCandidateProvider> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read candidate file `{}`", path.display()))?;
    let provider = InMemoryCandidateProvider::from_json_str(&raw)
        .with_context(|| format!("could not decode candidate file `{}`", path.display()))?;
    Ok(provider)
}

fn execute<P: CandidateProvider>(
    runtime: &Runtime,
    provider: P,
    table: Arc<CategoryPriorityTable>,
    settings: RankingSettings,
    request: &SuggestionRequest,
) -> CommandResult {
    match runtime.block_on(suggest_with(provider, table, settings, request)) {
        Ok(result) => CommandResult::json(
            COMMAND,
            &SuggestOutput {
                command: COMMAND,
                status: "ok",
                correlation_id: &request.correlation_id,
                count: result.products.len(),
                products: &result.products,
                model_debug: result.model_debug.as_ref(),
            },
        ),
        Err(error) => application_failure(error, &request.correlation_id),
    }
}

async fn suggest_with<P: CandidateProvider>(
    provider: P,
    table: Arc<CategoryPriorityTable>,
    settings: RankingSettings,
    request: &SuggestionRequest,
) -> Result<SuggestionResult, ApplicationError> {
    let engine = SuggestionEngine::new(provider, table, settings)?;
    engine.get_suggestions(request).await
}

/// Exit codes: 2 config, 3 bad request, 4 upstream fetch, 5 anything else.
fn application_failure(error: ApplicationError, correlation_id: &str) -> CommandResult {
    if matches!(error, ApplicationError::Configuration(_) | ApplicationError::Domain(_)) {
        return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2);
    }

    let interface = error.into_interface(correlation_id);
    let exit_code = match interface.error_class() {
        "bad_request" => 3,
        "upstream_fetch" => 4,
        _ => 5,
    };
    CommandResult::failure(COMMAND, interface.error_class(), interface.to_string(), exit_code)
}
