//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

/// Plugin-contributed navigation menus: merge, deduplicate and prune a persisted page tree
#[derive(Parser, Debug)]
#[command(name = "navtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Turn debugging information on (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Config file (default: ./navtree.toml if present)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Option holding the navigation (default: from config)
    #[arg(short, long, global = true)]
    pub option: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the stored navigation as a tree
    Show,

    /// Prune expired plugin pages and merge in the current ones
    Sync {
        /// Filter to consult (default: from config)
        #[arg(short, long)]
        filter: Option<String>,
        /// Report changes without storing them
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// List plugin pages the filter no longer contributes
    Expired {
        /// Filter to consult (default: from config)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Add a page
    Add(AddArgs),

    /// Remove a page by uid
    Remove {
        /// Uid (href) of the page
        uid: String,
        /// Drop the page's children instead of moving them up
        #[arg(long)]
        no_reattach: bool,
    },

    /// Move a page below another page, or back to the top level
    Move {
        /// Uid (href) of the page to move
        uid: String,
        /// Uid of the new parent page (top level if omitted)
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Print the stored navigation as JSON
    Export {
        /// Write to file instead of stdout
        #[arg(short = 'O', long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Print the option value a fresh installation would store
    #[command(name = "install-value")]
    InstallValue,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Page to add: a uri or a controller/action route.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Page label
    #[arg(short, long)]
    pub label: String,

    /// External or relative uri
    #[arg(short, long, conflicts_with_all = ["controller", "action", "route", "module"])]
    pub uri: Option<String>,

    /// Controller of a route page
    #[arg(long, requires = "action")]
    pub controller: Option<String>,

    /// Action of a route page
    #[arg(long, requires = "controller")]
    pub action: Option<String>,

    /// Named route
    #[arg(long)]
    pub route: Option<String>,

    /// Module
    #[arg(long)]
    pub module: Option<String>,

    /// Uid of the parent page (default: top level)
    #[arg(short, long)]
    pub parent: Option<String>,

    /// Hide the page
    #[arg(long)]
    pub hidden: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Print a config template
    Template,
}
