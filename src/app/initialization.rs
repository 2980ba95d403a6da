//! Application initialization and configuration

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use log::{debug, LevelFilter};
use crate::{cli, config, display, logging};
use crate::git::GitCli;
use crate::plugin::PluginEnv;
use crate::upgrade::UpgradeOptions;

/// Everything a command handler needs
pub struct App {
    pub config: config::ConfigManager,
    pub console: display::Console,
    pub env: PluginEnv,
    lockfile_path: Option<PathBuf>,
}

impl App {
    pub fn new(args: &cli::Args, config: config::ConfigManager) -> Result<Self> {
        let console = create_console(args, &config)?;
        let env = create_plugin_env(&config)?;
        let lockfile_path = args.lockfile.clone().or_else(|| config.lockfile_path());
        Ok(Self {
            config,
            console,
            env,
            lockfile_path,
        })
    }

    /// Explicit lockfile location, if any; `None` means the default location
    pub fn lockfile_path(&self) -> Option<&Path> {
        self.lockfile_path.as_deref()
    }

    /// `--jobs` if given, otherwise the configured default
    pub fn upgrade_options(&self, check_only: bool, jobs: Option<usize>) -> Result<UpgradeOptions> {
        let jobs = match jobs {
            Some(jobs) => jobs,
            None => self.config.upgrade_jobs()?,
        };
        Ok(UpgradeOptions { check_only, jobs })
    }
}

pub fn load_configuration(args: &cli::Args) -> Result<config::ConfigManager> {
    config::ConfigManager::load(args.config_file.as_deref())
}

pub fn configure_logging(args: &cli::Args, config: &config::ConfigManager) -> Result<logging::LogConfig> {
    let console_level = if args.debug {
        LevelFilter::Trace
    } else if args.verbose {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Error
    } else {
        config
            .get_log_level("base", "console-level")
            .context("Invalid console-level in configuration")?
            .unwrap_or(LevelFilter::Warn)
    };

    let format_str = args
        .log_format
        .as_deref()
        .or_else(|| config.get_value("base", "log-format").map(String::as_str));
    let format = match format_str {
        Some(format) => format.parse::<logging::LogFormat>().map_err(|e| anyhow::anyhow!(e))?,
        None => logging::LogFormat::Text,
    };

    let log_file = args.log_file.clone().or_else(|| config.get_path("base", "log-file"));
    let file_level = match &args.log_file_level {
        Some(level) => Some(logging::parse_log_level(level)?),
        None => config
            .get_log_level("base", "file-log-level")
            .context("Invalid file-log-level in configuration")?,
    };

    let (destination, file_level) = match log_file {
        Some(path) => {
            let level = file_level.unwrap_or(console_level);
            (logging::LogDestination::Both(path), Some(level))
        }
        None => (logging::LogDestination::Console, None),
    };

    Ok(logging::LogConfig {
        console_level,
        file_level,
        format,
        destination,
    })
}

/// Colour precedence: --no-color, then --color, then `[base] color`
pub fn create_console(args: &cli::Args, config: &config::ConfigManager) -> Result<display::Console> {
    let configured = config.get_bool("base", "color")?;
    let colours = display::ColourManager::from_flags(args.no_color, args.color, configured);
    Ok(display::Console::new(colours))
}

pub fn create_plugin_env(config: &config::ConfigManager) -> Result<PluginEnv> {
    let plugins_dir = config.plugin_dir()?;
    debug!("Plugins live in {}", plugins_dir.display());

    let git = GitCli::with_program(config.git_program());
    Ok(PluginEnv::new(plugins_dir, Arc::new(git)).with_remote_base(config.remote_base()))
}
