use std::collections::HashMap;

use crate::domain::product::ProductId;

/// Multiset of product ids already in the shopper's cart.
///
/// Keys are kept exactly as they appear in the comma-delimited input. An
/// empty segment becomes an empty-string key, which never matches a product
/// id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CartMembership {
    counts: HashMap<String, u32>,
}

impl CartMembership {
    pub fn parse(cart_product_ids: &str) -> Self {
        let mut counts = HashMap::new();
        for segment in cart_product_ids.split(',') {
            *counts.entry(segment.to_owned()).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn contains(&self, product_id: ProductId) -> bool {
        self.counts.contains_key(&product_id.to_string())
    }

    /// Occurrences of a raw cart key; 0 when absent.
    pub fn count(&self, key: &str) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn distinct_len(&self) -> usize {
        self.counts.len()
    }
}
