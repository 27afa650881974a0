mod cli;
mod replay;

use clap::Parser;
use cli::{Cli, Commands, JSON_MODE};
use eyre::WrapErr;
use tracing_subscriber::EnvFilter;

fn init_logging(json: bool, log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));
    // Logs go to stderr so replay output on stdout stays machine-readable.
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();
    let _ = JSON_MODE.set(args.json);
    init_logging(args.json, &args.log_level);

    let raw = std::fs::read_to_string(&args.config)
        .wrap_err_with(|| format!("failed to read config file {}", args.config.display()))?;
    let config: tickfilter_config::Config = toml::from_str(&raw)
        .wrap_err_with(|| format!("failed to parse config file {}", args.config.display()))?;
    config.validate().wrap_err("invalid config")?;

    match args.cmd {
        Commands::CheckConfig => {
            for sensor in &config.sensor {
                tracing::info!(
                    source = %sensor.source,
                    method = sensor.method.as_str(),
                    update_s = sensor.update_s,
                    "sensor ok"
                );
            }
            println!("config ok: {} sensor(s)", config.sensor.len());
            Ok(())
        }
        Commands::Replay {
            events,
            sensor,
            speed,
            restore,
        } => replay::run_replay(&config, &events, sensor.as_deref(), speed, restore),
    }
}
