//! Hard gates a candidate must pass before it is scored

use serde::Serialize;

use super::cart::CartMembership;
use super::category::{category_id, CategoryPriorityTable};
use crate::domain::product::ProductCandidate;

/// Outcome of the eligibility gates, in evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    Qualified,
    /// Priced below the remaining order-value gap.
    BelowGap,
    AlreadyInCart,
    NotPriorityCategory,
    /// Category path too short to hold the gating level.
    MalformedCategoryPath,
}

impl Eligibility {
    pub fn is_qualified(self) -> bool {
        matches!(self, Self::Qualified)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Qualified => "qualified",
            Self::BelowGap => "below_gap",
            Self::AlreadyInCart => "already_in_cart",
            Self::NotPriorityCategory => "not_priority_category",
            Self::MalformedCategoryPath => "malformed_category_path",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct EligibilityFilter<'a> {
    table: &'a CategoryPriorityTable,
    category_level: usize,
}

impl<'a> EligibilityFilter<'a> {
    pub fn new(table: &'a CategoryPriorityTable, category_level: usize) -> Self {
        Self { table, category_level }
    }

    pub fn qualifies(
        &self,
        candidate: &ProductCandidate,
        order_value_gap: f64,
        cart: &CartMembership,
    ) -> bool {
        self.evaluate(candidate, order_value_gap, cart).is_qualified()
    }

    pub fn evaluate(
        &self,
        candidate: &ProductCandidate,
        order_value_gap: f64,
        cart: &CartMembership,
    ) -> Eligibility {
        let price = candidate.price;
        if price.is_nan() || order_value_gap.is_nan() || price < order_value_gap {
            return Eligibility::BelowGap;
        }
        if cart.contains(candidate.id) {
            return Eligibility::AlreadyInCart;
        }

        match category_id(&candidate.primary_category_path, self.category_level) {
            Ok(category) if self.table.contains(category) => Eligibility::Qualified,
            Ok(_) => Eligibility::NotPriorityCategory,
            Err(_) => Eligibility::MalformedCategoryPath,
        }
    }
}
