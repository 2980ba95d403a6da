//! Checking and upgrading installed plugins
//!
//! Each plugin is checked against its remote, and either reported (in
//! check-only mode) or moved to the newer version. Upgrading every plugin
//! runs the per-plugin work on a bounded thread pool; each task touches only
//! its own plugin directory and its own lockfile entry, and the lockfile is
//! saved once after all tasks have finished.

use std::fmt;
use std::io;
use log::{debug, info, warn};
use parking_lot::Mutex;
use rayon::prelude::*;

use crate::error::{TimError, TimResult};
use crate::lockfile::Lockfile;
use crate::plugin::{Plugin, PluginEnv, PluginName};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeOptions {
    /// Report available upgrades without changing anything
    pub check_only: bool,
    /// Maximum number of plugins upgraded at the same time
    pub jobs: usize,
}

impl Default for UpgradeOptions {
    fn default() -> Self {
        Self {
            check_only: false,
            jobs: num_cpus::get(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    UpToDate,
    Available { from: String, to: String },
    Upgraded { from: String, to: String },
}

impl fmt::Display for UpgradeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpgradeOutcome::UpToDate => write!(f, "up-to-date"),
            UpgradeOutcome::Available { from, to } => write!(f, "upgrade available: {} -> {}", from, to),
            UpgradeOutcome::Upgraded { from, to } => write!(f, "upgraded from {} to {}", from, to),
        }
    }
}

/// What happened to one plugin during [`upgrade_all`]
#[derive(Debug)]
pub struct UpgradeReport {
    pub name: PluginName,
    pub result: TimResult<UpgradeOutcome>,
}

impl UpgradeReport {
    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}

/// Check one plugin and, unless `check_only` is set, upgrade it.
///
/// On success the plugin's version is replaced with the upgraded one; the
/// caller is responsible for recording it in the lockfile. A failed upgrade
/// leaves the plugin's version untouched.
pub fn upgrade_plugin(
    env: &PluginEnv,
    plugin: &mut Plugin,
    options: &UpgradeOptions,
) -> TimResult<UpgradeOutcome> {
    plugin.check_installed(env)?;
    let dir = plugin.dir(env);

    let version = plugin
        .version
        .as_mut()
        .ok_or_else(|| TimError::invalid_version(""))?;
    version.check(env.git(), &dir)?;

    let target = match version.has_upgrade() {
        Some(target) => target,
        None => {
            debug!("{} is up-to-date at {}", plugin.name, version);
            return Ok(UpgradeOutcome::UpToDate);
        }
    };

    let from = version.to_string();
    let to = target.to_string();
    if options.check_only {
        return Ok(UpgradeOutcome::Available { from, to });
    }

    target.upgrade(env.git(), &dir)?;
    info!("Upgraded {} from {} to {}", plugin.name, from, to);
    plugin.version = Some(target);
    Ok(UpgradeOutcome::Upgraded { from, to })
}

/// Upgrade every plugin in the lockfile, at most `options.jobs` at a time.
///
/// A failure affects only the plugin it happened to and is returned in that
/// plugin's report. Reports come back in lockfile order. Unless
/// `check_only` is set, the lockfile is saved once all plugins are done.
pub fn upgrade_all(
    env: &PluginEnv,
    lockfile: &mut Lockfile,
    options: &UpgradeOptions,
) -> TimResult<Vec<UpgradeReport>> {
    let plugins = lockfile.plugins();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs.max(1))
        .thread_name(|index| format!("tim-upgrade-{}", index))
        .build()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

    debug!("Upgrading {} plugin(s) with {} job(s)", plugins.len(), options.jobs.max(1));

    let reports = {
        let shared = Mutex::new(&mut *lockfile);
        pool.install(|| {
            plugins
                .into_par_iter()
                .map(|mut plugin| {
                    let result = upgrade_plugin(env, &mut plugin, options);
                    match &result {
                        Ok(UpgradeOutcome::Upgraded { .. }) => {
                            if let Some(spec) = plugin.spec() {
                                shared.lock().set_spec(plugin.name.clone(), spec);
                            }
                        }
                        Ok(_) => {}
                        Err(err) => warn!("Failed to upgrade {}: {}", plugin.name, err),
                    }
                    UpgradeReport {
                        name: plugin.name,
                        result,
                    }
                })
                .collect::<Vec<_>>()
        })
    };

    if !options.check_only {
        lockfile.save()?;
    }
    Ok(reports)
}
