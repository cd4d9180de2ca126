//! Remote emitter
//!
//! POSTs entries as JSON to every configured endpoint. Delivery counts as a
//! success only when all endpoints accept the entry.

use crate::error::{DiagError, Result};
use crate::logging::LogEntry;
use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// Per-request timeout for log POSTs
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait RemoteSink: Send + Sync {
    fn endpoint(&self) -> &str;
    async fn send(&self, entry: &LogEntry) -> Result<()>;
}

/// HTTP POST sink
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSink {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// One sink per endpoint, sharing a connection pool
    pub fn for_endpoints(endpoints: &[String]) -> Result<Vec<Arc<dyn RemoteSink>>> {
        let client = http_client(REQUEST_TIMEOUT)?;
        Ok(endpoints
            .iter()
            .map(|e| Arc::new(HttpSink::new(client.clone(), e.clone())) as Arc<dyn RemoteSink>)
            .collect())
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DiagError::Remote {
            endpoint: "client".to_string(),
            source: e,
        })
}

#[async_trait]
impl RemoteSink for HttpSink {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, entry: &LogEntry) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(entry)
            .send()
            .await
            .map_err(|e| DiagError::Remote {
                endpoint: self.endpoint.clone(),
                source: e,
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DiagError::RemoteStatus {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            })
        }
    }
}

/// Fan-out over all configured sinks
#[derive(Clone, Default)]
pub struct RemoteEmitter {
    sinks: Vec<Arc<dyn RemoteSink>>,
}

impl RemoteEmitter {
    pub fn new(sinks: Vec<Arc<dyn RemoteSink>>) -> Self {
        Self { sinks }
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.sinks.iter().map(|s| s.endpoint().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Send to every sink concurrently; the first failure is returned
    pub async fn deliver(&self, entry: &LogEntry) -> Result<()> {
        if self.sinks.is_empty() {
            return Err(DiagError::NoRemoteEndpoints);
        }

        let results = join_all(self.sinks.iter().map(|sink| sink.send(entry))).await;
        results.into_iter().collect::<Result<Vec<()>>>().map(|_| ())
    }
}
