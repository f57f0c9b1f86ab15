//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent structural and usage violations on the page tree.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("a page cannot have itself as a parent: {label}")]
    SelfParent { label: String },

    #[error("invalid page '{label}': {reason}")]
    InvalidPage { label: String, reason: String },

    #[error("page must be normalized and have a valid uid: {label}")]
    NotNormalized { label: String },

    #[error("parent container must be the navigation root or one of its pages")]
    ForeignContainer,

    #[error("page is not part of this navigation")]
    UnknownNode,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
