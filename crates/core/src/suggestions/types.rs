//! Types for the cart suggestion pipeline

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::product::ProductCandidate;

/// Placement the suggestions are rendered into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub id: u64,
    pub code: String,
}

impl Default for BlockInfo {
    fn default() -> Self {
        Self { id: 0, code: "cart_suggest".to_owned() }
    }
}

/// Descriptor forwarded verbatim to the recommendation model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub model: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl Default for ModelRequest {
    fn default() -> Self {
        Self { model: "rule_base".to_owned(), params: BTreeMap::new() }
    }
}

/// Opaque pagination cursor; the provider decides how to interpret it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(pub String);

impl Cursor {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request for cart add-on suggestions
#[derive(Debug, Clone)]
pub struct SuggestionRequest {
    /// Correlates log events for one request
    pub correlation_id: String,
    /// Shopper query parameters, forwarded to the provider
    pub query: BTreeMap<String, String>,
    pub block: BlockInfo,
    pub model_request: ModelRequest,
    /// Maximum number of suggestions to return
    pub limit: usize,
    pub cursor: Cursor,
    /// Amount still missing to reach the order-value threshold; may be zero
    /// or negative.
    pub order_value_gap: f64,
    /// Comma-delimited product ids currently in the cart
    pub cart_product_ids: String,
}

impl SuggestionRequest {
    /// Create a new suggestion request
    pub fn new(correlation_id: impl Into<String>, order_value_gap: f64) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            query: BTreeMap::new(),
            block: BlockInfo::default(),
            model_request: ModelRequest::default(),
            limit: super::DEFAULT_MAX_SUGGESTIONS,
            cursor: Cursor::default(),
            order_value_gap,
            cart_product_ids: String::new(),
        }
    }

    pub fn with_cart_product_ids(mut self, cart_product_ids: impl Into<String>) -> Self {
        self.cart_product_ids = cart_product_ids.into();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Cursor(cursor.into());
        self
    }

    pub fn with_block(mut self, block: BlockInfo) -> Self {
        self.block = block;
        self
    }

    pub fn with_model_request(mut self, model_request: ModelRequest) -> Self {
        self.model_request = model_request;
        self
    }

    pub fn with_query(mut self, query: BTreeMap<String, String>) -> Self {
        self.query = query;
        self
    }
}

/// Ordered, bounded suggestions plus the provider's debug metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionResult {
    pub products: Vec<ProductCandidate>,
    pub model_debug: Option<serde_json::Value>,
}
