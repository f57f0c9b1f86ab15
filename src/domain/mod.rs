//! Domain layer: page model and the navigation tree
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod navigation;
pub mod normalize;
pub mod tree_view;

pub use arena::{Container, Navigation, NodeId, PageNode};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use normalize::Normalizer;
pub use tree_view::TreeNodeConvert;
