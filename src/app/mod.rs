//! Application orchestration module

pub mod commands;
pub mod initialization;

pub use commands::{run_command, CommandStatus};
pub use initialization::{configure_logging, load_configuration, App};
