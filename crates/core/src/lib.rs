pub mod config;
pub mod domain;
pub mod errors;
pub mod suggestions;

pub use domain::product::{ProductCandidate, ProductId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use suggestions::{
    CandidateProvider, CartMembership, CategoryPriorityTable, RankingSettings, SuggestionEngine,
    SuggestionRequest, SuggestionResult,
};
