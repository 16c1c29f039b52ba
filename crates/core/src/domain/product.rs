use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A listing returned by the candidate provider.
///
/// `score` is only meaningful after the candidate has been through the
/// ranking pipeline; providers leave it at zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductCandidate {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    pub price: f64,
    pub primary_category_path: String,
    #[serde(default)]
    pub score: f64,
}

impl ProductCandidate {
    pub fn new(id: u64, price: f64, primary_category_path: impl Into<String>) -> Self {
        Self {
            id: ProductId(id),
            name: String::new(),
            price,
            primary_category_path: primary_category_path.into(),
            score: 0.0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{ProductCandidate, ProductId};

    #[test]
    fn product_id_displays_as_decimal() {
        assert_eq!(ProductId(54_276).to_string(), "54276");
    }

    #[test]
    fn candidate_deserializes_without_optional_fields() {
        let candidate: ProductCandidate = serde_json::from_str(
            r#"{"id": 42, "price": 65000.0, "primary_category_path": "1/2/8000/54276/60001"}"#,
        )
        .expect("candidate json should parse");

        assert_eq!(candidate.id, ProductId(42));
        assert!(candidate.name.is_empty());
        assert_eq!(candidate.score, 0.0);
    }
}
