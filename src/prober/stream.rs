use anyhow::{Context, Result};
use reqwest::Client;
use std::io::Write;
use tokio::time::{timeout_at, Duration, Instant};
use tracing::{debug, error, info};

use crate::config::{DeadlineMode, ProbeConfig};
use crate::prober::lines::LineReader;
use crate::prober::ProbeOutcome;
use crate::util::{describe_error, describe_window};

/// One best-effort streaming GET against a fixed URL, reported line by line.
pub struct StreamProbe {
    url: String,
    window: Duration,
    mode: DeadlineMode,
    connect_timeout: Option<Duration>,
}

impl StreamProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            url: config.url.clone(),
            window: config.read_window(),
            mode: config.deadline_mode,
            connect_timeout: config.connect_timeout(),
        }
    }

    /// Runs the probe and writes the report to `out`. Never returns an error:
    /// every failure ends up as an `Error: ...` line and `ProbeOutcome::Failed`.
    pub async fn run<W: Write>(&self, out: &mut W) -> ProbeOutcome {
        match self.stream(out).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let description = describe_error(&e);
                error!("stream probe {} failed: {}", self.url, description);
                let _ = writeln!(out, "Error: {}", description);
                ProbeOutcome::Failed { error: description }
            }
        }
    }

    async fn stream<W: Write>(&self, out: &mut W) -> Result<ProbeOutcome> {
        writeln!(out, "Connecting to {}...", self.url)?;
        info!("connecting to {} ({:?} read window)", self.url, self.mode);

        let mut builder = Client::builder();
        if let Some(t) = self.connect_timeout {
            builder = builder.connect_timeout(t);
        }
        let client = builder.build()?;

        let resp = client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?;
        // redirects are already followed; anything else outside 2xx is a failure
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!(
                "HTTP Error {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            );
        }
        writeln!(out, "Status: {}", status.as_u16())?;

        let start = Instant::now();
        let deadline = start + self.window;
        // resp is moved into the reader and dropped on every return below
        let mut reader = LineReader::new(Box::pin(resp.bytes_stream()));
        let mut lines = 0usize;
        let mut bytes = 0usize;

        loop {
            let next = match self.mode {
                DeadlineMode::Cooperative => reader.next_line().await?,
                DeadlineMode::Hard => match timeout_at(deadline, reader.next_line()).await {
                    Ok(line) => line?,
                    Err(_) => {
                        debug!("read deadline hit while waiting for line {}", lines + 1);
                        self.stop_after_window(out)?;
                        return Ok(ProbeOutcome::TimedOut { lines, bytes });
                    }
                },
            };

            let Some(line) = next else {
                return Ok(ProbeOutcome::Exhausted { lines, bytes });
            };

            lines += 1;
            bytes += line.len();
            debug!("line {}: {} bytes", lines, line.len());
            writeln!(out, "Received: {} bytes", line.len())?;

            if start.elapsed() > self.window {
                self.stop_after_window(out)?;
                return Ok(ProbeOutcome::TimedOut { lines, bytes });
            }
        }
    }

    fn stop_after_window<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{} elapsed, stopping.", describe_window(self.window))?;
        Ok(())
    }
}
