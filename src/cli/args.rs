use clap::{Parser, Subcommand};
use anyhow::Result;
use std::path::PathBuf;
use log::debug;

/// Tmux plugin manager
#[derive(Parser, Debug)]
#[command(name = "tim")]
#[command(about = "Install, upgrade and load tmux plugins pinned in a lockfile")]
#[command(version)]
pub struct Args {
    /// Lockfile to use instead of the configured one
    #[arg(long, global = true, value_name = "FILE")]
    pub lockfile: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Verbose output (debug level logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, global = true, value_name = "FORMAT")]
    pub log_format: Option<String>,

    /// Log file path for file output
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_file_level: Option<String>,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Colour output even when not writing to a terminal
    #[arg(long, global = true)]
    pub color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Install a plugin and record it in the lockfile
    #[command(disable_version_flag = true)]
    Add {
        /// Plugin to install, as owner/repo
        plugin: String,

        /// Track a branch instead of a release tag
        #[arg(long, value_name = "BRANCH", conflicts_with = "tag")]
        branch: Option<String>,

        /// Pin a release tag instead of the newest one
        #[arg(long = "version", value_name = "VERSION")]
        tag: Option<String>,
    },

    /// Uninstall a plugin and drop it from the lockfile
    Remove {
        /// Plugin to remove, as owner/repo
        plugin: String,
    },

    /// Upgrade one plugin, or all of them
    Upgrade {
        /// Plugin to upgrade; all plugins when omitted
        plugin: Option<String>,

        /// Only report available upgrades
        #[arg(long)]
        check: bool,

        /// Number of plugins upgraded at the same time
        #[arg(short, long, value_name = "N")]
        jobs: Option<usize>,
    },

    /// Run the scripts of every installed plugin
    Load,

    /// Show installed plugins
    Info {
        /// Show details for a single plugin
        plugin: Option<String>,
    },

    /// Check the tmux setup
    Init {
        /// tmux configuration to inspect instead of the discovered one
        #[arg(long, value_name = "FILE")]
        tmux_config: Option<PathBuf>,
    },
}

impl Command {
    /// Name of the command, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::Add { .. } => "add",
            Command::Remove { .. } => "remove",
            Command::Upgrade { .. } => "upgrade",
            Command::Load => "load",
            Command::Info { .. } => "info",
            Command::Init { .. } => "init",
        }
    }
}

pub fn parse_args() -> Args {
    let args = Args::parse();
    debug!("Parsed CLI arguments: {:?}", args);
    args
}

/// Reject flag combinations clap cannot express on its own
pub fn validate_args(args: &Args) -> Result<()> {
    let log_flags_count = [args.verbose, args.quiet, args.debug]
        .iter()
        .filter(|&&flag| flag)
        .count();
    if log_flags_count > 1 {
        return Err(anyhow::anyhow!(
            "Conflicting log level flags: only one of --verbose, --quiet, or --debug may be specified"
        ));
    }

    if args.no_color && args.color {
        return Err(anyhow::anyhow!("--color and --no-color cannot be used together"));
    }

    if let Some(format) = &args.log_format {
        format
            .parse::<crate::logging::LogFormat>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }

    if let Some(level) = &args.log_file_level {
        crate::logging::parse_log_level(level)?;
        if args.log_file.is_none() {
            return Err(anyhow::anyhow!("--log-file-level requires --log-file to be specified"));
        }
    }

    if let Command::Upgrade { jobs: Some(0), .. } = args.command {
        return Err(anyhow::anyhow!("--jobs must be at least 1"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_add_with_version() {
        let args = parse(&["tim", "add", "acme/widgets", "--version", "1.2.0"]);
        assert_eq!(
            args.command,
            Command::Add {
                plugin: "acme/widgets".to_string(),
                branch: None,
                tag: Some("1.2.0".to_string()),
            }
        );
    }

    #[test]
    fn test_add_branch_and_version_conflict() {
        let result = Args::try_parse_from([
            "tim", "add", "acme/widgets", "--branch", "main", "--version", "v1.0.0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_upgrade_defaults() {
        let args = parse(&["tim", "upgrade"]);
        assert_eq!(
            args.command,
            Command::Upgrade {
                plugin: None,
                check: false,
                jobs: None,
            }
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["tim", "upgrade", "--check", "--lockfile", "/tmp/tim.json", "-v"]);
        assert!(args.verbose);
        assert_eq!(args.lockfile, Some(PathBuf::from("/tmp/tim.json")));
        assert!(matches!(args.command, Command::Upgrade { check: true, .. }));
        assert_eq!(args.command.name(), "upgrade");
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Args::try_parse_from(["tim"]).is_err());
    }

    #[test]
    fn test_validate_args() {
        assert!(validate_args(&parse(&["tim", "load", "--debug"])).is_ok());
        assert!(validate_args(&parse(&["tim", "load", "-v", "-q"])).is_err());
        assert!(validate_args(&parse(&["tim", "load", "--color", "--no-color"])).is_err());
        assert!(validate_args(&parse(&["tim", "load", "--log-format", "xml"])).is_err());
        assert!(validate_args(&parse(&["tim", "load", "--log-file-level", "debug"])).is_err());
        assert!(validate_args(&parse(&["tim", "upgrade", "--jobs", "0"])).is_err());
        assert!(validate_args(&parse(&[
            "tim", "load", "--log-file", "/tmp/tim.log", "--log-file-level", "debug"
        ]))
        .is_ok());
    }
}
