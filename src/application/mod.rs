//! Application layer: filters and navigation services
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod filters;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use filters::{ContributedPages, FilterRegistry, PageFilter, PUBLIC_NAVIGATION_MAIN};
