//! Candidate provider seam
//!
//! The recommendation provider is an external collaborator. The pipeline only
//! sees this trait, so the fixture list used in mock mode and a real model
//! client go through the same filter/score/sort path.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{BlockInfo, Cursor, ModelRequest};
use crate::domain::product::{ProductCandidate, ProductId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("candidate provider unavailable: {0}")]
    Unavailable(String),
    #[error("candidate provider rejected cursor `{0}`")]
    InvalidCursor(String),
    #[error("candidate provider returned an undecodable payload: {0}")]
    Decode(String),
}

/// Parameters of one provider call.
#[derive(Clone, Copy, Debug)]
pub struct CandidateFetch<'a> {
    pub block: &'a BlockInfo,
    pub model_request: &'a ModelRequest,
    pub limit: u32,
    pub offset: &'a Cursor,
    pub query: &'a BTreeMap<String, String>,
    pub block_code: &'a str,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateBatch {
    pub products: Vec<ProductCandidate>,
    #[serde(default)]
    pub model_debug: Option<serde_json::Value>,
}

#[async_trait]
pub trait CandidateProvider: Send + Sync {
    async fn fetch_candidates(
        &self,
        fetch: CandidateFetch<'_>,
    ) -> Result<CandidateBatch, ProviderError>;
}

/// Serves a fixed candidate list, paging it by a decimal offset cursor.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCandidateProvider {
    batch: CandidateBatch,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CandidatePayload {
    List(Vec<ProductCandidate>),
    Batch(CandidateBatch),
}

impl InMemoryCandidateProvider {
    pub fn new(products: Vec<ProductCandidate>) -> Self {
        Self { batch: CandidateBatch { products, model_debug: None } }
    }

    pub fn with_model_debug(mut self, model_debug: serde_json::Value) -> Self {
        self.batch.model_debug = Some(model_debug);
        self
    }

    /// Accepts either a bare JSON array of candidates or an object with
    /// `products` and optional `model_debug`.
    pub fn from_json_str(raw: &str) -> Result<Self, ProviderError> {
        let payload: CandidatePayload =
            serde_json::from_str(raw).map_err(|error| ProviderError::Decode(error.to_string()))?;

        let batch = match payload {
            CandidatePayload::List(products) => CandidateBatch { products, model_debug: None },
            CandidatePayload::Batch(batch) => batch,
        };
        Ok(Self { batch })
    }

    pub fn len(&self) -> usize {
        self.batch.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.products.is_empty()
    }
}

fn parse_offset(cursor: &Cursor) -> Result<usize, ProviderError> {
    if cursor.is_empty() {
        return Ok(0);
    }
    cursor.as_str().parse::<usize>().map_err(|_| ProviderError::InvalidCursor(cursor.to_string()))
}

#[async_trait]
impl CandidateProvider for InMemoryCandidateProvider {
    async fn fetch_candidates(
        &self,
        fetch: CandidateFetch<'_>,
    ) -> Result<CandidateBatch, ProviderError> {
        let offset = parse_offset(fetch.offset)?;
        let products = self
            .batch
            .products
            .iter()
            .skip(offset)
            .take(fetch.limit as usize)
            .cloned()
            .collect();

        Ok(CandidateBatch { products, model_debug: self.batch.model_debug.clone() })
    }
}

#[derive(Debug, Clone, Copy)]
struct CandidateSeed {
    id: u64,
    name: &'static str,
    price: f64,
    primary_category_path: &'static str,
}

const FIXTURE_SEEDS: &[CandidateSeed] = &[
    CandidateSeed {
        id: 271_001,
        name: "Fresh Milk 1L",
        price: 32_000.0,
        primary_category_path: "1/2/44792/54276/54280",
    },
    CandidateSeed {
        id: 271_002,
        name: "Greek Yogurt 4-pack",
        price: 48_500.0,
        primary_category_path: "1/2/44792/54276/54282",
    },
    CandidateSeed {
        id: 271_003,
        name: "Free-range Eggs x10",
        price: 39_000.0,
        primary_category_path: "1/2/44792/54302/54306",
    },
    CandidateSeed {
        id: 271_004,
        name: "Jasmine Rice 5kg",
        price: 125_000.0,
        primary_category_path: "1/2/44792/44824/44830",
    },
    CandidateSeed {
        id: 271_005,
        name: "Cooking Oil 1L",
        price: 54_000.0,
        primary_category_path: "1/2/44792/54330/54334",
    },
    CandidateSeed {
        id: 271_006,
        name: "Instant Noodles x30",
        price: 115_000.0,
        primary_category_path: "1/2/44792/54290/54296",
    },
    CandidateSeed {
        id: 271_007,
        name: "Dish Soap 750ml",
        price: 27_500.0,
        primary_category_path: "1/2/44792/54344/54350",
    },
    CandidateSeed {
        id: 271_008,
        name: "Sparkling Water x6",
        price: 61_000.0,
        primary_category_path: "1/2/44792/54412/54418",
    },
    CandidateSeed {
        id: 271_009,
        name: "Paper Towels x4",
        price: 45_000.0,
        primary_category_path: "1/2/50000/60010/60011",
    },
    CandidateSeed {
        id: 271_010,
        name: "Frozen Dumplings 500g",
        price: 72_000.0,
        primary_category_path: "1/2/44792/54500/54504",
    },
];

/// Canned candidates used when the provider is mocked out.
#[derive(Clone, Debug)]
pub struct FixtureCandidateProvider {
    batch: CandidateBatch,
}

impl Default for FixtureCandidateProvider {
    fn default() -> Self {
        let products = FIXTURE_SEEDS
            .iter()
            .map(|seed| ProductCandidate {
                id: ProductId(seed.id),
                name: seed.name.to_owned(),
                price: seed.price,
                primary_category_path: seed.primary_category_path.to_owned(),
                score: 0.0,
            })
            .collect();

        Self {
            batch: CandidateBatch {
                products,
                model_debug: Some(serde_json::json!({ "o": 0, "ro": 0, "ao": 0 })),
            },
        }
    }
}

#[async_trait]
impl CandidateProvider for FixtureCandidateProvider {
    async fn fetch_candidates(
        &self,
        _fetch: CandidateFetch<'_>,
    ) -> Result<CandidateBatch, ProviderError> {
        Ok(self.batch.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{
        CandidateFetch, CandidateProvider, FixtureCandidateProvider, InMemoryCandidateProvider,
        ProviderError,
    };
    use crate::domain::product::{ProductCandidate, ProductId};
    use crate::suggestions::{BlockInfo, Cursor, ModelRequest};

    fn fetch<'a>(
        block: &'a BlockInfo,
        model_request: &'a ModelRequest,
        cursor: &'a Cursor,
        query: &'a BTreeMap<String, String>,
        limit: u32,
    ) -> CandidateFetch<'a> {
        CandidateFetch {
            block,
            model_request,
            limit,
            offset: cursor,
            query,
            block_code: &block.code,
        }
    }

    fn candidates(count: u64) -> Vec<ProductCandidate> {
        (1..=count).map(|id| ProductCandidate::new(id, 1_000.0, "1/2/8000/54276")).collect()
    }

    #[tokio::test]
    async fn in_memory_provider_pages_by_offset_and_limit() {
        let provider = InMemoryCandidateProvider::new(candidates(5));
        let (block, model, query) =
            (BlockInfo::default(), ModelRequest::default(), BTreeMap::new());
        let cursor = Cursor("2".to_owned());

        let batch = provider
            .fetch_candidates(fetch(&block, &model, &cursor, &query, 2))
            .await
            .expect("fetch should succeed");

        let ids: Vec<ProductId> = batch.products.iter().map(|product| product.id).collect();
        assert_eq!(ids, vec![ProductId(3), ProductId(4)]);
    }

    #[tokio::test]
    async fn in_memory_provider_rejects_non_numeric_cursor() {
        let provider = InMemoryCandidateProvider::new(candidates(1));
        let (block, model, query) =
            (BlockInfo::default(), ModelRequest::default(), BTreeMap::new());
        let cursor = Cursor("next-page".to_owned());

        let error = provider
            .fetch_candidates(fetch(&block, &model, &cursor, &query, 10))
            .await
            .expect_err("cursor should be rejected");

        assert_eq!(error, ProviderError::InvalidCursor("next-page".to_owned()));
    }

    #[test]
    fn json_payload_accepts_array_and_object_forms() {
        let list = InMemoryCandidateProvider::from_json_str(
            r#"[{"id": 1, "price": 10.0, "primary_category_path": "1/2/3/54276"}]"#,
        )
        .expect("array form should parse");
        assert_eq!(list.len(), 1);

        let object = InMemoryCandidateProvider::from_json_str(
            r#"{"products": [], "model_debug": {"o": 1}}"#,
        )
        .expect("object form should parse");
        assert!(object.is_empty());
        assert_eq!(object.batch.model_debug, Some(serde_json::json!({ "o": 1 })));
    }

    #[test]
    fn json_payload_reports_decode_errors() {
        let result = InMemoryCandidateProvider::from_json_str("{\"products\": 3}");

        assert!(matches!(result, Err(ProviderError::Decode(_))));
    }

    #[tokio::test]
    async fn fixture_provider_returns_canned_list_with_debug() {
        let provider = FixtureCandidateProvider::default();
        let (block, model, query) =
            (BlockInfo::default(), ModelRequest::default(), BTreeMap::new());
        let cursor = Cursor::default();

        let batch = provider
            .fetch_candidates(fetch(&block, &model, &cursor, &query, 1))
            .await
            .expect("fixture fetch should succeed");

        assert_eq!(batch.products.len(), 10);
        assert_eq!(batch.model_debug, Some(serde_json::json!({ "o": 0, "ro": 0, "ao": 0 })));
    }
}
