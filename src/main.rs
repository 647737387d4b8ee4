//! metric-mux - statsd relay over a pooled metrics registry
//!
//! This is the composition root: it wires configuration, logging and the
//! process-wide registry, then relays `name:value|type[|@rate]` lines read
//! from stdin.

use metric_mux::infrastructure::{ControlSignal, SignalListener};
use metric_mux::{load_config, Config, Metric, MetricRegistry};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let mut cfg = load_config()?;

    // Setup logging (stdout carries local-mode echoes)
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        "starting metric-mux destinations={:?} protocol={} local={}",
        cfg.destinations,
        cfg.protocol,
        cfg.local
    );

    // ===== COMPOSITION ROOT =====
    // Client options are fixed here; SIGHUP only re-points the pool.
    if metric_mux::install(MetricRegistry::from_config(&cfg)).is_err() {
        anyhow::bail!("metrics registry already initialized");
    }
    activate(cfg.clone()).await?;

    let mut signals = SignalListener::install()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(cfg.flush_interval_ms.max(1)));

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => relay(&line),
                None => {
                    tracing::info!("stdin closed, shutting down");
                    break;
                }
            },
            _ = ticker.tick() => {
                if let Err(e) = metric_mux::flush_all() {
                    tracing::warn!("periodic flush failed: {}", e);
                }
            }
            signal = signals.recv() => match signal {
                ControlSignal::Shutdown => break,
                ControlSignal::Reload => match load_config() {
                    Ok(next) => {
                        cfg = next;
                        if let Err(e) = activate(cfg.clone()).await {
                            tracing::error!("failed to rebuild metrics pool: {}", e);
                        }
                    }
                    Err(e) => tracing::error!("failed to reload configuration: {:?}", e),
                },
            }
        }
    }

    tokio::task::spawn_blocking(metric_mux::stop).await?;
    tracing::info!("metric-mux stopped");
    Ok(())
}

/// Rebuild the process-wide pool off the async workers; connecting may
/// block for up to the connect timeout per destination.
async fn activate(cfg: Config) -> anyhow::Result<()> {
    tokio::task::spawn_blocking(move || {
        let registry = metric_mux::registry();
        if cfg.local {
            registry.re_create_local(&cfg.prefix, &cfg.destinations)
        } else {
            registry.re_create(&cfg.prefix, &cfg.destinations)
        }
    })
    .await??;
    Ok(())
}

fn relay(line: &str) {
    if line.trim().is_empty() {
        return;
    }
    let metric = match Metric::parse_line(line) {
        Ok(metric) => metric,
        Err(e) => {
            tracing::warn!("skipping input: {}", e);
            return;
        }
    };
    match metric_mux::registry().emit(&metric, false) {
        Ok(Some(echo)) if !echo.is_empty() => println!("{}", echo),
        Ok(_) => {}
        Err(e) => tracing::warn!("failed to emit {}: {}", metric.name, e),
    }
}
