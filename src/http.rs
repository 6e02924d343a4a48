use crate::error::ShipError;
use crate::transport::{LogPayload, LogTransport};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Path of the collector's batch ingestion endpoint.
pub const LOGS_PATH: &str = "/api/logs";

/// [`LogTransport`] that posts JSON batches to `<endpoint>/api/logs`.
///
/// Only a `200 OK` counts as delivered. Any other status is reported as
/// [`ShipError::Rejected`] together with the response body.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    /// Construct a transport for the collector at `endpoint`.
    ///
    /// **Parameters**
    /// - `endpoint`: base address such as `http://localhost:3000`; a
    ///   trailing `/` is ignored.
    /// - `timeout`: upper bound for a whole request, connect included.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ShipError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ShipError::Client(e.to_string()))?;
        Ok(Self::with_client(client, endpoint))
    }

    /// Reuse an existing `reqwest` client.
    pub fn with_client(client: Client, endpoint: &str) -> Self {
        let url = format!("{}{}", endpoint.trim_end_matches('/'), LOGS_PATH);
        Self { client, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LogTransport for HttpTransport {
    async fn send(&self, payload: &LogPayload) -> Result<(), ShipError> {
        let body = payload.to_json()?;
        let resp = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::OK {
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(ShipError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}
