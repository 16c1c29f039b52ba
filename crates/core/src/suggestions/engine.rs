//! Suggestion Engine implementation

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::cart::CartMembership;
use super::category::CategoryPriorityTable;
use super::eligibility::{Eligibility, EligibilityFilter};
use super::provider::{CandidateFetch, CandidateProvider};
use super::scoring::ScoreCalculator;
use super::types::{SuggestionRequest, SuggestionResult};
use crate::domain::product::ProductCandidate;
use crate::errors::{ApplicationError, DomainError};

/// Knobs of the ranking pipeline that stay fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingSettings {
    /// Raw candidates requested from the provider per call
    pub fetch_limit: u32,
    /// Category tree level used for gating and ranking
    pub category_level: usize,
    /// Rank applied to categories outside the priority table
    pub not_priority_rank: u32,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            fetch_limit: super::DEFAULT_FETCH_LIMIT,
            category_level: super::DEFAULT_CATEGORY_LEVEL,
            not_priority_rank: super::DEFAULT_NOT_PRIORITY_RANK,
        }
    }
}

#[derive(Debug, Default)]
struct RejectionTally {
    below_gap: usize,
    already_in_cart: usize,
    not_priority_category: usize,
    malformed_category_path: usize,
}

impl RejectionTally {
    fn record(&mut self, outcome: Eligibility) {
        match outcome {
            Eligibility::Qualified => {}
            Eligibility::BelowGap => self.below_gap += 1,
            Eligibility::AlreadyInCart => self.already_in_cart += 1,
            Eligibility::NotPriorityCategory => self.not_priority_category += 1,
            Eligibility::MalformedCategoryPath => self.malformed_category_path += 1,
        }
    }
}

/// Fetches candidates from a provider and turns them into a bounded,
/// ordered list of cart add-ons.
#[derive(Debug, Clone)]
pub struct SuggestionEngine<P> {
    provider: P,
    table: Arc<CategoryPriorityTable>,
    settings: RankingSettings,
}

impl<P> SuggestionEngine<P> {
    pub fn new(
        provider: P,
        table: Arc<CategoryPriorityTable>,
        settings: RankingSettings,
    ) -> Result<Self, DomainError> {
        if settings.fetch_limit == 0 {
            return Err(DomainError::InvariantViolation(
                "fetch limit must be greater than zero".to_owned(),
            ));
        }
        if settings.not_priority_rank <= table.max_rank() {
            return Err(DomainError::InvariantViolation(format!(
                "not-priority rank {} must exceed the highest priority rank {}",
                settings.not_priority_rank,
                table.max_rank()
            )));
        }

        Ok(Self { provider, table, settings })
    }

    pub fn table(&self) -> &CategoryPriorityTable {
        &self.table
    }

    pub fn settings(&self) -> RankingSettings {
        self.settings
    }

    /// Filter, score, sort and truncate one request's candidates.
    ///
    /// The sort is stable, so candidates with equal scores keep their input
    /// order. The result holds exactly `min(limit, qualified)` items.
    pub fn rank(
        &self,
        candidates: Vec<ProductCandidate>,
        request: &SuggestionRequest,
    ) -> Vec<ProductCandidate> {
        let cart = CartMembership::parse(&request.cart_product_ids);
        let filter = EligibilityFilter::new(&self.table, self.settings.category_level);
        let calculator = ScoreCalculator::new(
            &self.table,
            self.settings.category_level,
            self.settings.not_priority_rank,
        );

        let fetched = candidates.len();
        let mut tally = RejectionTally::default();
        let mut qualified = Vec::new();

        for mut candidate in candidates {
            let outcome = filter.evaluate(&candidate, request.order_value_gap, &cart);
            if !outcome.is_qualified() {
                debug!(
                    event_name = "suggestions.rank.rejected",
                    correlation_id = %request.correlation_id,
                    product_id = candidate.id.0,
                    reason = outcome.as_str(),
                    "candidate rejected"
                );
                tally.record(outcome);
                continue;
            }

            candidate.score = calculator.score(&candidate, request.order_value_gap);
            qualified.push(candidate);
        }

        qualified.sort_by(|a, b| a.score.total_cmp(&b.score));
        let qualified_count = qualified.len();
        qualified.truncate(request.limit);

        info!(
            event_name = "suggestions.rank.completed",
            correlation_id = %request.correlation_id,
            order_value_gap = request.order_value_gap,
            limit = request.limit,
            fetched,
            qualified = qualified_count,
            returned = qualified.len(),
            rejected_below_gap = tally.below_gap,
            rejected_in_cart = tally.already_in_cart,
            rejected_not_priority = tally.not_priority_category,
            rejected_malformed_path = tally.malformed_category_path,
            "cart suggestions ranked"
        );

        qualified
    }
}

impl<P: CandidateProvider> SuggestionEngine<P> {
    /// Get cart add-on suggestions for a shopper
    pub async fn get_suggestions(
        &self,
        request: &SuggestionRequest,
    ) -> Result<SuggestionResult, ApplicationError> {
        let fetch = CandidateFetch {
            block: &request.block,
            model_request: &request.model_request,
            limit: self.settings.fetch_limit,
            offset: &request.cursor,
            query: &request.query,
            block_code: &request.block.code,
        };

        let batch = match self.provider.fetch_candidates(fetch).await {
            Ok(batch) => batch,
            Err(error) => {
                warn!(
                    event_name = "suggestions.fetch.failed",
                    correlation_id = %request.correlation_id,
                    block_code = %request.block.code,
                    error = %error,
                    "candidate provider call failed"
                );
                return Err(error.into());
            }
        };

        let products = self.rank(batch.products, request);
        Ok(SuggestionResult { products, model_debug: batch.model_debug })
    }
}
