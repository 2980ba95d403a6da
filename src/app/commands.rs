//! Command handlers
//!
//! Each handler opens the lockfile, works through the plugin lifecycle and
//! reports to the console. Handlers that process several plugins keep going
//! after a failure and report it in the returned status.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use crate::cli::Command;
use crate::error::TimError;
use crate::lockfile::Lockfile;
use crate::plugin::{Plugin, PluginName};
use crate::tmux;
use crate::upgrade::{self, UpgradeOutcome};
use crate::version::Version;
use crate::display::format_compact_table;
use super::App;

/// How a command finished when it did not fail outright
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// Some plugins failed; the rest were processed
    PartialFailure(usize),
}

impl CommandStatus {
    fn from_failures(failures: usize) -> Self {
        if failures == 0 {
            CommandStatus::Success
        } else {
            CommandStatus::PartialFailure(failures)
        }
    }
}

pub fn run_command(app: &App, command: &Command) -> Result<CommandStatus> {
    debug!("Running command {}", command.name());
    match command {
        Command::Add { plugin, branch, tag } => add(app, plugin, branch.as_deref(), tag.as_deref()),
        Command::Remove { plugin } => remove(app, plugin),
        Command::Upgrade { plugin, check, jobs } => upgrade(app, plugin.as_deref(), *check, *jobs),
        Command::Load => load(app),
        Command::Info { plugin } => info(app, plugin.as_deref()),
        Command::Init { tmux_config } => init(app, tmux_config.as_deref()),
    }
}

/// The spec to install with: a branch, a validated release tag, or blank
/// to let the resolver choose
fn requested_spec(branch: Option<&str>, tag: Option<&str>) -> Result<String> {
    match (branch.map(str::trim), tag.map(str::trim)) {
        (Some(branch), _) if !branch.is_empty() => Ok(branch.to_string()),
        (_, Some(tag)) if !tag.is_empty() => match Version::from_spec(tag) {
            Some(version) if version.is_tag() => Ok(version.git_ref().to_string()),
            _ => Err(TimError::invalid_version(tag).into()),
        },
        _ => Ok(String::new()),
    }
}

pub fn add(app: &App, raw_name: &str, branch: Option<&str>, tag: Option<&str>) -> Result<CommandStatus> {
    let name = PluginName::parse(raw_name)?;
    let spec = requested_spec(branch, tag)?;

    let mut lockfile = Lockfile::load(app.lockfile_path())?;
    let mut plugin = Plugin::new(name);

    match plugin.check_installed(&app.env) {
        Ok(()) => return Err(anyhow::anyhow!("Plugin {} is already installed", plugin.name)),
        Err(err) if err.is_not_installed() => {}
        Err(err) => return Err(err.into()),
    }

    if let Err(err) = plugin.install(&app.env, &spec) {
        if plugin.check_installed(&app.env).is_ok() {
            debug!("Removing partial install of {}", plugin.name);
            if let Err(cleanup) = plugin.uninstall(&app.env) {
                warn!("Failed to clean up {}: {}", plugin.dir(&app.env).display(), cleanup);
            }
        }
        return Err(err).with_context(|| format!("Failed to install {}", plugin.name));
    }

    let installed = match &plugin.version {
        Some(version) => version.clone(),
        None => return Err(TimError::invalid_version(spec).into()),
    };
    lockfile.set_spec(plugin.name.clone(), installed.git_ref());
    lockfile.save()?;

    info!("Installed {} at {}", plugin.name, installed);
    app.console
        .success(&format!("Plugin {} successfully installed at {}", plugin.name, installed));
    Ok(CommandStatus::Success)
}

pub fn remove(app: &App, raw_name: &str) -> Result<CommandStatus> {
    let name = PluginName::parse(raw_name)?;
    let mut lockfile = Lockfile::load(app.lockfile_path())?;

    let plugin = lockfile
        .get_plugin(&name)
        .ok_or_else(|| TimError::not_installed(name.as_str()))?;

    match plugin.check_installed(&app.env) {
        Ok(()) => plugin
            .uninstall(&app.env)
            .with_context(|| format!("Failed to uninstall {}", name))?,
        Err(err) if err.is_not_installed() => {
            app.console
                .warning(&format!("Plugin {} was not installed, removing it from the lockfile", name));
        }
        Err(err) => return Err(err.into()),
    }

    lockfile.remove(&name);
    lockfile.save()?;

    app.console.success(&format!("Plugin {} removed", name));
    Ok(CommandStatus::Success)
}

fn report_outcome(app: &App, name: &PluginName, outcome: &UpgradeOutcome) {
    let line = format!("{}: {}", name, outcome);
    match outcome {
        UpgradeOutcome::Upgraded { .. } => app.console.success(&line),
        UpgradeOutcome::Available { .. } | UpgradeOutcome::UpToDate => app.console.info(&line),
    }
}

pub fn upgrade(app: &App, raw_name: Option<&str>, check_only: bool, jobs: Option<usize>) -> Result<CommandStatus> {
    let options = app.upgrade_options(check_only, jobs)?;
    let mut lockfile = Lockfile::load(app.lockfile_path())?;

    let raw_name = match raw_name {
        Some(raw_name) => raw_name,
        None => {
            let reports = upgrade::upgrade_all(&app.env, &mut lockfile, &options)?;
            let mut failures = 0;
            for report in &reports {
                match &report.result {
                    Ok(outcome) => report_outcome(app, &report.name, outcome),
                    Err(err) => {
                        failures += 1;
                        app.console.error(&format!("{}: {}", report.name, err));
                    }
                }
            }
            return Ok(CommandStatus::from_failures(failures));
        }
    };

    let name = PluginName::parse(raw_name)?;
    let mut plugin = lockfile
        .get_plugin(&name)
        .ok_or_else(|| TimError::not_installed(name.as_str()))?;

    let outcome = upgrade::upgrade_plugin(&app.env, &mut plugin, &options)
        .with_context(|| format!("Failed to upgrade {}", name))?;

    if let (UpgradeOutcome::Upgraded { .. }, Some(spec)) = (&outcome, plugin.spec()) {
        lockfile.set_spec(name.clone(), spec);
        lockfile.save()?;
    }
    report_outcome(app, &name, &outcome);
    Ok(CommandStatus::Success)
}

pub fn load(app: &App) -> Result<CommandStatus> {
    let plugins = Lockfile::load(app.lockfile_path())?.plugins();

    let mut failures = 0;
    for plugin in &plugins {
        let result = plugin
            .check_installed(&app.env)
            .and_then(|()| plugin.load(&app.env));
        match result {
            Ok(scripts) => debug!("Loaded {} ({} script(s))", plugin.name, scripts),
            Err(err) => {
                failures += 1;
                app.console.error(&format!("Failed to load {}: {}", plugin.name, err));
            }
        }
    }

    info!("Loaded {} of {} plugin(s)", plugins.len() - failures, plugins.len());
    Ok(CommandStatus::from_failures(failures))
}

fn web_url(app: &App, name: &PluginName) -> String {
    app.env.remote_url(name).trim_end_matches(".git").to_string()
}

fn version_url(app: &App, name: &PluginName, version: &Version) -> String {
    match version {
        Version::Tag(_) => format!("{}/releases/tag/{}", web_url(app, name), version.git_ref()),
        Version::Branch(_) => format!("{}/tree/{}", web_url(app, name), version.git_ref()),
    }
}

fn version_label(plugin: &Plugin) -> String {
    plugin
        .version
        .as_ref()
        .map_or_else(|| "-".to_string(), Version::to_string)
}

pub fn info(app: &App, raw_name: Option<&str>) -> Result<CommandStatus> {
    let lockfile = Lockfile::load(app.lockfile_path())?;

    if let Some(raw_name) = raw_name {
        let name = PluginName::parse(raw_name)?;
        match lockfile.get_plugin(&name) {
            Some(plugin) => print_plugin_details(app, &plugin)?,
            None => app.console.warning(&format!("Plugin {} not installed", name)),
        }
        return Ok(CommandStatus::Success);
    }

    app.console.info(&format!("Tim Version: {}", env!("CARGO_PKG_VERSION")));
    app.console.info(&format!("Lockfile: {}", lockfile.path().display()));

    let plugins = lockfile.plugins();
    if plugins.is_empty() {
        app.console.info("No plugins installed.");
        return Ok(CommandStatus::Success);
    }

    let mut rows = Vec::new();
    let mut missing = Vec::new();
    for plugin in &plugins {
        let location = match plugin.check_installed(&app.env) {
            Ok(()) => plugin.dir(&app.env).display().to_string(),
            Err(err) if err.is_not_installed() => {
                missing.push(plugin.name.clone());
                "not installed".to_string()
            }
            Err(err) => return Err(err.into()),
        };
        rows.push(vec![plugin.name.to_string(), version_label(plugin), location]);
    }

    app.console.info("");
    print!("{}", format_compact_table(&["Plugin", "Version", "Installed to"], &rows));
    for name in missing {
        app.console.warning(&format!(
            "Plugin {} is present in the lockfile but not installed.\n  Run \"tim add {}\" to install it.",
            name, name
        ));
    }
    Ok(CommandStatus::Success)
}

fn print_plugin_details(app: &App, plugin: &Plugin) -> Result<()> {
    let console = &app.console;
    console.info(&format!("Name: {}", console.link(plugin.name.as_str(), &web_url(app, &plugin.name))));

    if let Some(version) = &plugin.version {
        let url = version_url(app, &plugin.name, version);
        console.info(&format!("Version: {}", console.link(&version.to_string(), &url)));
    }

    match plugin.check_installed(&app.env) {
        Ok(()) => {
            console.info(&format!("Installed to: {}", plugin.dir(&app.env).display()));
            let available = plugin.available_versions(&app.env)?;
            if !available.is_empty() {
                console.info(&format!("Available versions: {}", available.join(", ")));
            }
        }
        Err(err) if err.is_not_installed() => console.warning(&format!(
            "Plugin {} is present in the lockfile but not installed.\n  Run \"tim add {}\" to install it.",
            plugin.name, plugin.name
        )),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

pub fn init(app: &App, tmux_config: Option<&std::path::Path>) -> Result<CommandStatus> {
    match tmux::tmux_version() {
        Ok(version) => app.console.info(&format!("tmux version: {}", version)),
        Err(err) => app.console.warning(&format!("Could not determine the tmux version: {}", err)),
    }

    let config_path = match tmux_config {
        Some(path) => crate::config::expand_home(path),
        None => tmux::find_config_path().map_err(|err| {
            anyhow::Error::new(err).context("Create ~/.tmux.conf or pass --tmux-config")
        })?,
    };
    app.console
        .info(&format!("tmux configuration: {}", config_path.display()));

    let loads_plugins = tmux::config_loads_plugins(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    if loads_plugins {
        app.console.success("tmux is set up to load plugins with tim");
    } else {
        app.console
            .warning("tmux does not load plugins yet. Add this line to the configuration:");
        app.console.info(&format!("  {}", tmux::LOAD_HOOK));
    }

    let spec_count = Lockfile::load(app.lockfile_path())?.specs().len();
    debug!("{} plugin(s) in the lockfile", spec_count);
    Ok(CommandStatus::Success)
}
