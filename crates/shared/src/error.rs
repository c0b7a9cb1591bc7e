use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    NoSelection,
    Validation,
    Persistence,
    Resource,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("no car with mark '{mark}'")]
    NotFound { mark: String },
    #[error("no car is selected")]
    NoSelection,
    #[error("invalid rating '{input}': {reason}")]
    Validation { input: String, reason: String },
    #[error("store failure: {0}")]
    Persistence(String),
    #[error("seed resource unavailable: {0}")]
    Resource(String),
}

impl CatalogError {
    pub fn not_found(mark: impl Into<String>) -> Self {
        Self::NotFound { mark: mark.into() }
    }

    pub fn validation(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::NoSelection => ErrorCode::NoSelection,
            Self::Validation { .. } => ErrorCode::Validation,
            Self::Persistence(_) => ErrorCode::Persistence,
            Self::Resource(_) => ErrorCode::Resource,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_in_snake_case() {
        let code = CatalogError::not_found("Lada").code();
        assert_eq!(code, ErrorCode::NotFound);
        assert_eq!(serde_json::to_string(&code).expect("json"), "\"not_found\"");
        assert_eq!(
            CatalogError::validation("x", "not a number").code(),
            ErrorCode::Validation
        );
    }
}
