mod config;
mod prober;
mod util;

use config::ProbeConfig;
use prober::stream::StreamProbe;
use prober::ProbeOutcome;

use tracing::{debug, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load config first to get log level
    let config = ProbeConfig::load().await?;
    let log_level = config.get_tracing_level()?;

    // Logs go to stderr; stdout carries the probe report only
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()
                         .add_directive(format!("stream_probe={}", log_level.as_str().to_lowercase()).parse()?))
        .init();
    debug!("loaded config: {:?}", config);

    let probe = StreamProbe::new(&config);
    let mut out = std::io::stdout().lock();
    match probe.run(&mut out).await {
        ProbeOutcome::Exhausted { lines, bytes } => {
            info!("stream closed by server after {} lines ({} bytes)", lines, bytes);
        }
        ProbeOutcome::TimedOut { lines, bytes } => {
            info!("read window elapsed after {} lines ({} bytes)", lines, bytes);
        }
        ProbeOutcome::Failed { error } => {
            debug!("probe failed, exiting normally: {}", error);
        }
    }

    Ok(())
}
