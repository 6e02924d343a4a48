use crate::error::ShipError;
use crate::record::LogEntry;
use async_trait::async_trait;
use serde::Serialize;

/// Body posted to the collector for one batch.
///
/// Serializes to `{"source": "...", "logs": ["...", ...]}` with the raw
/// tab-separated lines in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogPayload {
    pub source: String,
    pub logs: Vec<LogEntry>,
}

impl LogPayload {
    pub fn new(source: impl Into<String>, logs: Vec<LogEntry>) -> Self {
        Self {
            source: source.into(),
            logs,
        }
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    pub fn to_json(&self) -> Result<String, ShipError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Hand the lines back so a failed batch can be requeued.
    pub fn into_entries(self) -> Vec<LogEntry> {
        self.logs
    }
}

/// Asynchronous delivery of a [`LogPayload`] to a collector.
///
/// The flush coordinator calls `send` from its own background task, one
/// batch at a time, and never from the thread that produced the logs.
#[async_trait]
pub trait LogTransport: Send + Sync {
    /// Deliver one batch.
    ///
    /// **Returns**
    /// - `Ok(())` once the collector acknowledged the batch.
    /// - `Err(..)` for anything else (connection failure, non-success
    ///   status, serialization error). The coordinator logs the error
    ///   and puts the batch back at the head of the buffer.
    async fn send(&self, payload: &LogPayload) -> Result<(), ShipError>;
}
