use thiserror::Error;

use crate::suggestions::ProviderError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("category path `{path}` has no segment for level {level}")]
    MalformedCategoryPath { path: String, level: usize },
    #[error("priority rank for category `{category}` must be at least 1 (got {rank})")]
    InvalidPriorityRank { category: String, rank: u32 },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    UpstreamFetch(#[from] ProviderError),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "Suggestions are temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::ServiceUnavailable { .. } => "upstream_fetch",
            Self::Internal { .. } => "internal",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::UpstreamFetch(ProviderError::InvalidCursor(cursor)) => {
                Self::BadRequest {
                    message: format!("invalid pagination cursor `{cursor}`"),
                    correlation_id: "unassigned".to_owned(),
                }
            }
            ApplicationError::UpstreamFetch(error) => Self::ServiceUnavailable {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, InterfaceError};
    use crate::suggestions::ProviderError;

    #[test]
    fn upstream_fetch_error_keeps_provider_message() {
        let error = ApplicationError::from(ProviderError::Unavailable("timeout".to_owned()));

        assert_eq!(error.to_string(), ProviderError::Unavailable("timeout".to_owned()).to_string());
    }

    #[test]
    fn upstream_fetch_maps_to_service_unavailable() {
        let interface = ApplicationError::from(ProviderError::Unavailable("timeout".to_owned()))
            .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::ServiceUnavailable {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(interface.error_class(), "upstream_fetch");
        assert_eq!(
            interface.user_message(),
            "Suggestions are temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn invalid_cursor_maps_to_bad_request() {
        let interface = ApplicationError::from(ProviderError::InvalidCursor("abc".to_owned()))
            .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::BadRequest { ref message, .. }
            if message.contains("abc")));
    }

    #[test]
    fn domain_error_maps_to_bad_request() {
        let interface = ApplicationError::from(DomainError::InvalidPriorityRank {
            category: "54276".to_owned(),
            rank: 0,
        })
        .into_interface("req-3");

        assert_eq!(interface.error_class(), "bad_request");
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface = ApplicationError::Configuration("fallback rank too low".to_owned())
            .into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
