//! Connectivity monitoring
//!
//! A probe answers "are we online?"; the monitor polls it and feeds
//! transitions to the logging service, which replays the offline buffer on
//! reconnect.

use crate::constants::{CONNECTIVITY_POLL_INTERVAL_SECS, CONNECTIVITY_PROBE_TIMEOUT_SECS};
use crate::emitter::remote::http_client;
use crate::error::Result;
use crate::logging::LoggingService;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Online when a HEAD request to `url` gets any HTTP answer
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client(Duration::from_secs(CONNECTIVITY_PROBE_TIMEOUT_SECS))?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn is_online(&self) -> bool {
        match self.client.head(&self.url).send().await {
            Ok(_) => true,
            Err(e) => {
                debug!("Connectivity probe to {} failed: {}", self.url, e);
                false
            }
        }
    }
}

pub fn default_interval() -> Duration {
    Duration::from_secs(CONNECTIVITY_POLL_INTERVAL_SECS)
}

/// Poll `probe` every `interval` until `shutdown` flips to true
pub fn spawn_connectivity_monitor(
    service: LoggingService,
    probe: Box<dyn ConnectivityProbe>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let online = probe.is_online().await;
                    if online != service.is_online() {
                        info!("Connectivity changed: {}", if online { "online" } else { "offline" });
                        if let Some(report) = service.handle_connectivity(online).await {
                            info!("{}", report);
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    })
}
