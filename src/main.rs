use std::alloc::System;
use std::io;
use std::process::ExitCode;

use memhog::{Config, Driver, Meter, Sleep};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static METER: Meter<System> = Meter::new(System);

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    match run(Config::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> memhog::Result<()> {
    let mut driver = Driver::new(config)?;
    let config = driver.config();
    info!(
        rounds = config.rounds,
        bytes_per_round = config.bytes_per_round,
        hold_secs = config.hold.as_secs(),
        "starting"
    );

    let mut out = io::stdout().lock();
    while let Some(round) = driver.step(&mut out)? {
        debug!(
            round = round.index,
            retained = round.retained,
            live = METER.live(),
            peak = METER.peak(),
            "round complete"
        );
    }

    let _retained = driver.run(&mut out, &Sleep)?;
    Ok(())
}
