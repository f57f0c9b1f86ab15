//! navtree: plugin-contributed navigation menus
//!
//! A navigation is an ordered tree of pages keyed by their href. Plugins
//! contribute pages through named filters; the stored tree is kept in sync
//! with them by merging new pages and pruning the ones no plugin provides
//! any more, while pages added by hand stay untouched.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
