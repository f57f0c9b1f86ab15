//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (OptionStore, FileSystem)
//! but are themselves concrete structs, not traits.

mod navigation;

pub use navigation::{NavigationService, SyncReport};
