use anyhow::Result;
use std::process;
use log::debug;
use tim::{app, cli, logging};

fn main() {
    match run() {
        Ok(app::CommandStatus::Success) => {}
        Ok(app::CommandStatus::PartialFailure(failures)) => {
            debug!("{} plugin(s) failed", failures);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn run() -> Result<app::CommandStatus> {
    let args = cli::parse_args();
    cli::validate_args(&args)?;

    let config_manager = app::load_configuration(&args)?;
    let log_config = app::configure_logging(&args, &config_manager)?;
    logging::init_logger(log_config)?;

    let app = app::App::new(&args, config_manager)?;
    colored::control::set_override(app.console.colours().colours_enabled());

    app::run_command(&app, &args.command)
}
