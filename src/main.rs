use log::{debug, error, info, warn};
use std::future::Future;
use std::io::Write;
use time::Duration;

use tag_counter::aggregator::decoder::extract_id;
use tag_counter::aggregator::SampleAggregator;
use tag_counter::config::CounterConfig;
use tag_counter::models::Report;
use tag_counter::source::{connect, SampleSource};
use tag_counter::utils::{format_datetime, format_report};

fn print_report<W: Write>(out: &mut W, report: &Report) -> std::io::Result<()> {
    info!(
        "Report at {}: {} receivers, {} transmitters",
        format_datetime(&report.generated_at),
        report.receivers.len(),
        report.transmitters.len()
    );
    write!(out, "{}", format_report(report))?;
    out.flush()
}

/// Pull samples until the feed ends or `shutdown` resolves, printing a report every period
///
/// Both ways out print the report for the unfinished period.
async fn main_loop<S, W, F>(
    config: &CounterConfig,
    source: &mut S,
    shutdown: F,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: SampleSource,
    W: Write,
    F: Future<Output = ()>,
{
    let mut aggregator =
        SampleAggregator::new(Duration::milliseconds(config.report_interval_ms));

    info!(
        "Counting samples, reporting every {} s",
        aggregator.period().whole_seconds()
    );

    tokio::pin!(shutdown);

    loop {
        let next = tokio::select! {
            next = source.next_sample() => next?,
            _ = &mut shutdown => {
                print_report(out, &aggregator.flush())?;
                writeln!(out, "Shutdown complete.")?;
                return Ok(());
            }
        };

        let record = match next {
            Some(record) => record,
            None => {
                warn!("Got a null sample. Probably got disconnected.");
                print_report(out, &aggregator.flush())?;
                return Ok(());
            }
        };

        if !config.accepts(extract_id(&record.device_id)) {
            debug!("Filtered sample from {}", extract_id(&record.device_id));
            continue;
        }

        if let Some(report) = aggregator.ingest(&record) {
            print_report(out, &report)?;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match CounterConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let timeout = tokio::time::Duration::from_secs(config.connect_timeout_secs);
    let mut source = match connect(&config.host, config.port, timeout).await {
        Ok(source) => source,
        Err(e) => {
            error!("Unable to connect to {}:{}: {}", config.host, config.port, e);
            return Err(e.into());
        }
    };

    // Handle Ctrl+C gracefully
    let (tx, rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(());
            }
            Err(e) => {
                // Keep the sender alive so the main loop is not cut short
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    });
    let shutdown = async {
        let _ = rx.await;
    };

    match main_loop(&config, &mut source, shutdown, &mut std::io::stdout()).await {
        Ok(_) => info!("Sample feed closed"),
        Err(e) => {
            error!("Fatal error: {}", e);
            return Err(e);
        }
    }

    Ok(())
}
