//! Cart add-on suggestions
//!
//! Ranks provider candidates so that the shopper can clear the remaining
//! order-value gap with the cheapest add-on from a curated set of categories.

mod cart;
mod category;
mod eligibility;
mod engine;
mod provider;
mod scoring;
mod types;

pub use cart::CartMembership;
pub use category::{category_id, CategoryPriorityTable, DEFAULT_PRIORITY_CATEGORIES};
pub use eligibility::{Eligibility, EligibilityFilter};
pub use engine::{RankingSettings, SuggestionEngine};
pub use provider::{
    CandidateBatch, CandidateFetch, CandidateProvider, FixtureCandidateProvider,
    InMemoryCandidateProvider, ProviderError,
};
pub use scoring::ScoreCalculator;
pub use types::*;

/// Number of raw candidates requested from the provider, independent of the
/// caller's display limit.
pub const DEFAULT_FETCH_LIMIT: u32 = 1000;

/// Tree depth of the category that gates and ranks candidates.
pub const DEFAULT_CATEGORY_LEVEL: usize = 2;

/// Rank applied to categories missing from the priority table.
pub const DEFAULT_NOT_PRIORITY_RANK: u32 = 100;

/// Display limit used when the caller does not set one.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 10;
