use clap::Parser;
use log::{error, info};
use tokio::time::Duration;

use tag_counter::config::{env_setting, DEFAULT_CONNECT_TIMEOUT_SECS};
use tag_counter::sensor::{send_samples, DEFAULT_SEND_INTERVAL_MS};
use tag_counter::source::open_stream;

/// Send a fixed Pipsqueak sample to an aggregator feed at a fixed rate
#[derive(Parser, Debug)]
#[command(name = "fake-sensor", version, long_about = None)]
struct Args {
    /// Aggregator host
    host: String,

    /// Aggregator sensor port
    port: u16,

    /// Milliseconds between samples
    #[arg(long, default_value_t = DEFAULT_SEND_INTERVAL_MS, value_parser = clap::value_parser!(u64).range(1..))]
    interval_ms: u64,

    /// Stop after this many samples
    #[arg(long)]
    count: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    dotenv::dotenv().ok();
    let connect_timeout = env_setting("CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?;

    let mut stream = match open_stream(
        &args.host,
        args.port,
        Duration::from_secs(connect_timeout),
    )
    .await
    {
        Ok(stream) => stream,
        Err(e) => {
            error!("Unable to connect to aggregator at {}:{}: {}", args.host, args.port, e);
            return Err(e.into());
        }
    };

    tokio::select! {
        result = send_samples(&mut stream, Duration::from_millis(args.interval_ms), args.count) => {
            let sent = result?;
            info!("Sent {} samples", sent);
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Disconnecting...");
        }
    }

    println!("Disconnected.");
    Ok(())
}
