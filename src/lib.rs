pub mod app;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod git;
pub mod lockfile;
pub mod logging;
pub mod plugin;
pub mod tmux;
pub mod upgrade;
pub mod version;

pub use error::{TimError, TimResult};
