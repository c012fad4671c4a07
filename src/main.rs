#![forbid(unsafe_code)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

#[macro_use]
extern crate log;

#[macro_use]
extern crate derive_builder;

mod app;
mod configuration;
mod error;
mod provisioner;
mod reporter;
mod time;

use log::LevelFilter;
use signal_hook::{iterator::Signals, SIGINT};
use std::{path::PathBuf, process::exit, sync::Arc, thread};
use structopt::StructOpt;

use self::app::{wait::Shutdown, App};
use self::error::{Error, Result};
use self::provisioner::http::HttpProvisioner;
use self::{
    configuration::command_line::{LogLevel, Opt},
    configuration::settings::Settings,
};

#[tokio::main]
async fn main() {
    let options = Opt::from_args();

    if let Err(e) = init_logging(
        options.logging.unwrap_or(LogLevel::Info).into(),
        &options.log_output_file,
    ) {
        eprintln!("Failed to initialize logging: {}", e);
        exit(2);
    }

    let shutdown = Shutdown::new();
    if let Err(e) = watch_signals(shutdown.clone()) {
        warn!("Interrupts will not stop the run gracefully: {}", e);
    }

    match run(&options, shutdown).await {
        Ok(()) => info!("Soak test finished"),
        Err(e) => {
            error!("Soak test failed: {}", e);
            exit(1);
        }
    }
}

async fn run(options: &Opt, shutdown: Shutdown) -> Result<()> {
    let settings = Settings::load(options)?;
    debug!("Initiated configuration {:#?}", settings);
    let plan = settings.plan()?;
    let provisioner = Arc::new(HttpProvisioner::new(
        &settings.server,
        settings.request_timeout,
    ));
    info!("Using provisioner at {}", settings.server);

    let summary = App::new(provisioner, plan, shutdown).run().await?;
    reporter::log_results("Total", &summary.results);
    if let Some(path) = &settings.report_file {
        reporter::write_report(path, &summary)?;
    }
    Ok(())
}

/// The first interrupt asks the run to stop at its next pass so the group still
/// gets deleted; a second one exits immediately.
fn watch_signals(shutdown: Shutdown) -> Result<()> {
    let signals = Signals::new(&[SIGINT])?;
    thread::spawn(move || {
        for sig in signals.forever() {
            if shutdown.is_triggered() {
                warn!("Received signal {:?} again, exiting", sig);
                exit(130);
            }
            info!("Received signal {:?}, stopping after the current pass", sig);
            shutdown.trigger();
        }
    });
    Ok(())
}

fn init_logging(level: LevelFilter, output: &Option<PathBuf>) -> Result<()> {
    let mut dispatcher = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}:{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record
                    .line()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "".to_owned()),
                record.level(),
                message
            ))
        })
        .level(level)
        .level_for("hyper", LevelFilter::Warn)
        .chain(std::io::stdout());

    if let Some(log_file) = output {
        dispatcher = dispatcher.chain(fern::log_file(log_file)?)
    }
    dispatcher
        .apply()
        .map_err(|e| Error::Config(format!("logger already set: {}", e)))?;
    info!("Logging level {} enabled", level);
    Ok(())
}
