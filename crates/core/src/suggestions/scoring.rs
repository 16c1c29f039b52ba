//! Scoring for qualified add-on candidates

use super::category::{category_id, CategoryPriorityTable};
use crate::domain::product::ProductCandidate;

/// Blends price-over-gap distance with category priority. Lower is better.
#[derive(Clone, Copy, Debug)]
pub struct ScoreCalculator<'a> {
    table: &'a CategoryPriorityTable,
    category_level: usize,
    not_priority_rank: u32,
}

impl<'a> ScoreCalculator<'a> {
    pub fn new(
        table: &'a CategoryPriorityTable,
        category_level: usize,
        not_priority_rank: u32,
    ) -> Self {
        Self { table, category_level, not_priority_rank }
    }

    /// Priority rank of the candidate's gating category, falling back to the
    /// not-priority rank for unknown categories and malformed paths.
    pub fn priority_rank(&self, candidate: &ProductCandidate) -> u32 {
        category_id(&candidate.primary_category_path, self.category_level)
            .ok()
            .and_then(|category| self.table.rank_of(category))
            .unwrap_or(self.not_priority_rank)
    }

    pub fn score(&self, candidate: &ProductCandidate, order_value_gap: f64) -> f64 {
        (candidate.price - order_value_gap) + f64::from(self.priority_rank(candidate))
    }
}
