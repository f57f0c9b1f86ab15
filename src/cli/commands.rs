//! Command dispatch: one handler per subcommand

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::ApplicationError;
use crate::cli::args::{AddArgs, Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings, LOCAL_CONFIG_FILE};
use crate::domain::{Container, Navigation, PageDescriptor, TreeNodeConvert};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        generate(*shell, &mut cmd, "navtree", &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load(local_config_path(cli).as_deref())?;
    let option = cli
        .option
        .clone()
        .unwrap_or_else(|| settings.option_name.clone());
    let container = ServiceContainer::new(settings);

    match command {
        Commands::Show => cmd_show(&container, &option),
        Commands::Sync { filter, dry_run } => {
            let filter = filter.as_deref().unwrap_or(&container.settings.filter_name);
            cmd_sync(&container, &option, filter, *dry_run)
        }
        Commands::Expired { filter } => {
            let filter = filter.as_deref().unwrap_or(&container.settings.filter_name);
            cmd_expired(&container, &option, filter)
        }
        Commands::Add(args) => cmd_add(&container, &option, args),
        Commands::Remove { uid, no_reattach } => {
            cmd_remove(&container, &option, uid, !*no_reattach)
        }
        Commands::Move { uid, parent } => cmd_move(&container, &option, uid, parent.as_deref()),
        Commands::Export { output } => cmd_export(&container, &option, output.as_deref()),
        Commands::InstallValue => cmd_install_value(&container, &option),
        Commands::Config { command } => cmd_config(&container, cli, command),
        Commands::Completion { .. } => Ok(()),
    }
}

/// `--config` if given, else `./navtree.toml` when it exists.
fn local_config_path(cli: &Cli) -> Option<PathBuf> {
    cli.config.clone().or_else(|| {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        local.exists().then_some(local)
    })
}

#[instrument(skip(container))]
fn cmd_show(container: &ServiceContainer, option: &str) -> CliResult<()> {
    let nav = container.navigation_service().load_navigation(option)?;
    if nav.is_empty() {
        output::warning(&format!("navigation '{option}' is empty"));
        return Ok(());
    }
    output::info(&nav.to_tree_string());
    Ok(())
}

#[instrument(skip(container))]
fn cmd_sync(container: &ServiceContainer, option: &str, filter: &str, dry_run: bool) -> CliResult<()> {
    let service = container.navigation_service();
    let mut nav = service.load_navigation(option)?;
    let report = service.add_pages_from_filter(&mut nav, filter)?;

    if report.is_unchanged() {
        output::success(&format!("navigation '{option}' is up to date"));
        return Ok(());
    }

    output::header(&format!("Sync '{option}' with filter '{filter}'"));
    for uid in &report.pruned {
        output::diff_remove(uid);
    }
    for uid in &report.added {
        output::diff_add(uid);
    }

    if dry_run {
        output::warning("dry run, nothing stored");
        return Ok(());
    }
    service.save_as_option(&nav, option)?;
    output::success(&format!(
        "stored '{}' ({} pruned, {} added)",
        option,
        report.pruned.len(),
        report.added.len()
    ));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_expired(container: &ServiceContainer, option: &str, filter: &str) -> CliResult<()> {
    let service = container.navigation_service();
    let nav = service.load_navigation(option)?;
    let expired = service.expired_pages(&nav, filter)?;

    if expired.is_empty() {
        output::success("no expired pages");
        return Ok(());
    }
    output::header(&format!("Expired pages in '{option}'"));
    for page in expired.iter().filter_map(|&id| nav.page(id)) {
        output::detail(&format!(
            "{} [{}]",
            page.label,
            page.uid.as_deref().unwrap_or_default()
        ));
    }
    Ok(())
}

/// Descriptor for the page described on the command line.
pub fn descriptor_from_args(args: &AddArgs) -> CliResult<PageDescriptor> {
    let mut descriptor = match (&args.uri, &args.controller, &args.action) {
        (Some(uri), _, _) => PageDescriptor::uri(&args.label, uri),
        (None, Some(controller), Some(action)) => {
            let mut descriptor = PageDescriptor::route(&args.label, controller, action);
            if let Some(route) = &args.route {
                descriptor = descriptor.with_route_name(route);
            }
            descriptor.module = args.module.clone();
            descriptor
        }
        _ => {
            return Err(CliError::InvalidArgs(
                "either --uri or --controller with --action is required".into(),
            ))
        }
    };
    if args.hidden {
        descriptor = descriptor.hidden();
    }
    Ok(descriptor)
}

#[instrument(skip(container))]
fn cmd_add(container: &ServiceContainer, option: &str, args: &AddArgs) -> CliResult<()> {
    let descriptor = descriptor_from_args(args)?;
    let service = container.navigation_service();
    let mut nav = service.load_navigation(option)?;

    let parent = match &args.parent {
        Some(uid) => Container::Page(
            nav.get_page_by_uid(uid)
                .ok_or_else(|| CliError::NotFound(uid.clone()))?,
        ),
        None => Container::Root,
    };

    let Some(id) = nav
        .add_page_to_container(descriptor, parent)
        .map_err(ApplicationError::from)?
    else {
        output::warning(&format!("page '{}' is already in the navigation", args.label));
        return Ok(());
    };

    service.save_as_option(&nav, option)?;
    output::success(&format!(
        "added {}",
        nav.href(id).unwrap_or_default()
    ));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_remove(container: &ServiceContainer, option: &str, uid: &str, reattach: bool) -> CliResult<()> {
    let service = container.navigation_service();
    let mut nav = service.load_navigation(option)?;

    let id = nav
        .get_page_by_uid(uid)
        .ok_or_else(|| CliError::NotFound(uid.to_string()))?;
    if nav.page(id).is_some_and(|page| !page.can_delete) {
        return Err(CliError::Usage(format!(
            "page '{uid}' is installed by a plugin and cannot be removed"
        )));
    }

    nav.remove_page_recursive(id, Container::Root, reattach);
    service.save_as_option(&nav, option)?;
    output::success(&format!("removed {uid}"));
    Ok(())
}

/// Move the page `uid` below `parent`, or to the top level.
pub fn move_page(nav: &mut Navigation, uid: &str, parent: Option<&str>) -> CliResult<()> {
    let id = nav
        .get_page_by_uid(uid)
        .ok_or_else(|| CliError::NotFound(uid.to_string()))?;
    let container = match parent {
        Some(parent) => Container::Page(
            nav.get_page_by_uid(parent)
                .ok_or_else(|| CliError::NotFound(parent.to_string()))?,
        ),
        None => Container::Root,
    };
    nav.adopt(id, container).map_err(ApplicationError::from)?;
    Ok(())
}

#[instrument(skip(container))]
fn cmd_move(
    container: &ServiceContainer,
    option: &str,
    uid: &str,
    parent: Option<&str>,
) -> CliResult<()> {
    let service = container.navigation_service();
    let mut nav = service.load_navigation(option)?;

    move_page(&mut nav, uid, parent)?;

    service.save_as_option(&nav, option)?;
    output::success(&format!("moved {uid} below {}", parent.unwrap_or("top level")));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_export(container: &ServiceContainer, option: &str, target: Option<&Path>) -> CliResult<()> {
    let nav = container.navigation_service().load_navigation(option)?;
    let json = serde_json::to_string_pretty(&nav.to_descriptors()).map_err(ApplicationError::from)?;

    match target {
        Some(path) => {
            debug!("writing export to {}", path.display());
            container
                .fs
                .write_atomic(path, &json)
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("exported '{}' to {}", option, path.display()));
        }
        None => output::info(&json),
    }
    Ok(())
}

fn cmd_install_value(container: &ServiceContainer, option: &str) -> CliResult<()> {
    let value = container
        .navigation_service()
        .navigation_option_value_for_install(option)?;
    output::info(&value);
    Ok(())
}

fn cmd_config(container: &ServiceContainer, cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&container.settings.to_toml()?),
        ConfigCommands::Path => {
            output::header("Config paths");
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(unavailable)".into());
            output::detail(&format!("global: {global}"));
            let local = local_config_path(cli)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".into());
            output::detail(&format!("local:  {local}"));
            output::detail(&format!(
                "store:  {}",
                container.settings.store_path.display()
            ));
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}
