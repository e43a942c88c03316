//! softliQ command-line client
//!
//! Reads values from and sends commands to a softliQ water softener.
//!
//! Usage: softliq <host> <command> [args]
//!
//! Commands:
//! - `info`                 model and software version
//! - `current`              instantaneous values
//! - `meter`                meter counters and last error
//! - `poll [seconds]`       poll until Ctrl-C
//! - `set <property> <v>`   write one parameter
//! - `mode <0|1>`           select the regeneration mode
//! - `regenerate`           start a manual regeneration
//! - `reset-errors`         clear the error memory
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use softliq_mux::sensor::render_readings;
use softliq_mux::{
    HttpTransport, MuxClient, MuxConfig, MuxError, MuxResult, Poller, PropertyMap,
    RegenerationMode,
};

const USAGE: &str = "Usage: softliq <host> <command> [args]

Commands:
  info                   model and software version
  current                instantaneous values
  meter                  meter counters and last error
  poll [seconds]         poll until Ctrl-C
  set <property> <value> write one parameter
  mode <0|1>             select the regeneration mode
  regenerate             start a manual regeneration
  reset-errors           clear the error memory";

#[tokio::main]
async fn main() -> ExitCode {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (host, command, rest) = match args.as_slice() {
        [host, command, rest @ ..] => (host.as_str(), command.as_str(), rest),
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    match run(host, command, rest).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(MuxError::Configuration { message }) => {
            eprintln!("{}\n\n{}", message, USAGE);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(host: &str, command: &str, args: &[String]) -> MuxResult<()> {
    let mut config = MuxConfig::new(host);
    if command == "poll" {
        if let Some(seconds) = args.first() {
            let seconds: u64 = seconds
                .parse()
                .map_err(|_| MuxError::configuration(format!("invalid interval '{}'", seconds)))?;
            config = config.with_poll_interval(Duration::from_secs(seconds));
        }
    }

    let client = Arc::new(MuxClient::connect_http(config).await?);
    if command != "info" {
        client.ensure_connected()?;
    }

    match command {
        "info" => {
            println!("{}", softliq_mux::info());
            println!("Host:      {}", client.host());
            println!("Connected: {}", client.is_connected());
            println!("Model:     {}", client.model());
            println!("Software:  {}", client.software_version());
        }
        "current" => print_values(&client.get_current_values().await?),
        "meter" => print_values(&client.get_meter_values().await?),
        "poll" => poll(Arc::clone(&client)).await,
        "set" => match args {
            [property, value] => {
                client.set_parameter(property, value).await?;
                println!("{} set to {}", property, value);
            }
            _ => return Err(MuxError::configuration("set expects <property> <value>")),
        },
        "mode" => {
            let mode: RegenerationMode = args
                .first()
                .ok_or_else(|| MuxError::configuration("mode expects 0 or 1"))?
                .parse()?;
            client.set_mode(mode).await?;
            println!("Regeneration mode set to {}", mode);
        }
        "regenerate" => {
            client.start_manual_regeneration().await?;
            println!("Manual regeneration started");
        }
        "reset-errors" => {
            client.reset_error_memory().await?;
            println!("Error memory cleared");
        }
        other => return Err(MuxError::configuration(format!("unknown command '{}'", other))),
    }

    let stats = client.stats().await;
    tracing::debug!(
        "{} queries, {} attempts, {} retries",
        stats.queries,
        stats.attempts,
        stats.retries
    );
    Ok(())
}

async fn poll(client: Arc<MuxClient<HttpTransport>>) {
    let poller = Poller::new(client);
    let mut updates = poller.subscribe();

    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            if snapshot.stale {
                println!(
                    "-- stale: {}",
                    snapshot.last_error.as_deref().unwrap_or("poll failed")
                );
                continue;
            }
            if let Some(at) = snapshot.last_success {
                println!("-- {}", at.format("%Y-%m-%d %H:%M:%S"));
            }
            print_values(&snapshot.values);
        }
    });

    poller
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
    printer.abort();
}

fn print_values(values: &PropertyMap) {
    for reading in render_readings(values) {
        if values.contains_key(reading.description.key) {
            println!("  {:<16} {}", reading.description.key, reading);
        }
    }
}
