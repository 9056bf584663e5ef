// main.rs
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use xtap::core::{CommandlineArgs, TracerConfig, logging::init_logging};
use xtap::trace::sink::LogContext;
use xtap::transport::record::RecordChannel;
use xtap::transport::{DisplayAddr, proxy};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CommandlineArgs::parse();
    let config = TracerConfig::resolve(&args).context("Failed to resolve configuration")?;
    init_logging().context("Failed to initialize logging")?;

    let display_spec = config
        .display
        .clone()
        .or_else(|| std::env::var("DISPLAY").ok())
        .context("no X display specified (use -d or set DISPLAY)")?;
    let upstream = DisplayAddr::parse(&display_spec).context("Failed to parse display")?;

    let sink: Box<dyn std::io::Write + Send> = match &config.output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to open log file {}", path))?,
        ),
        None => Box::new(std::io::stderr()),
    };
    let mut log = LogContext::new(sink);
    if config.client_ids {
        log.force_client_ids();
    }
    let log = Arc::new(Mutex::new(log));
    let options = Arc::new(config.trace);

    match config.attach {
        Some(client_id) => {
            let mut channel = RecordChannel::connect(&upstream)
                .await
                .context("Failed to open X RECORD control connection")?;
            channel
                .negotiate()
                .await
                .context("Failed to negotiate the RECORD extension")?;
            channel
                .run(client_id, log, options, config.client_ids)
                .await
                .context("Recording failed")?;
            Ok(())
        }
        None => {
            let listener = proxy::ProxyDisplay::bind(upstream, 10, log, options)
                .await
                .context("Failed to create proxy display")?;
            let display_name = listener.display_name();
            info!(display = %display_name, "tracing via proxy display");

            let command = config.command.clone();
            let child = tokio::spawn(async move {
                proxy::spawn_traced_command(&display_name, &command).await
            });
            tokio::select! {
                status = child => {
                    let code = status.context("Traced command panicked")??;
                    std::process::exit(code);
                }
                result = listener.run() => {
                    result.context("Proxy listener failed")?;
                    Ok(())
                }
            }
        }
    }
}
