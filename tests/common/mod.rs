#![allow(dead_code)]

use async_trait::async_trait;
use log_shipper::{LogPayload, LogShipper, LogTransport, ShipError, ShipperConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Transport that records every batch it is handed and succeeds or fails
/// on demand.
#[derive(Default)]
pub struct RecordingTransport {
    batches: Mutex<Vec<LogPayload>>,
    fail: AtomicBool,
}

impl RecordingTransport {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let transport = Self::default();
        transport.fail.store(true, Ordering::SeqCst);
        Arc::new(transport)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn payloads(&self) -> Vec<LogPayload> {
        self.batches.lock().unwrap().clone()
    }

    /// Unescaped contents of each batch, in call order.
    pub fn contents(&self) -> Vec<Vec<String>> {
        self.payloads()
            .iter()
            .map(|p| contents_of(&p.logs))
            .collect()
    }
}

#[async_trait]
impl LogTransport for RecordingTransport {
    async fn send(&self, payload: &LogPayload) -> Result<(), ShipError> {
        self.batches.lock().unwrap().push(payload.clone());
        if self.fail.load(Ordering::SeqCst) {
            Err(ShipError::Rejected {
                status: 503,
                body: "collector unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

pub fn contents_of(entries: &[log_shipper::LogEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| e.fields().unwrap().content)
        .collect()
}

/// Config with a timer long enough to never fire during a test.
pub fn quiet_config(threshold: usize) -> ShipperConfig {
    ShipperConfig::new("http://unused", "test-app")
        .with_batch_threshold(threshold)
        .with_flush_interval(Duration::from_secs(3600))
}

pub fn shipper(config: ShipperConfig, transport: Arc<RecordingTransport>) -> LogShipper {
    LogShipper::with_transport(config, transport).unwrap()
}

/// Poll `cond` until it holds or two seconds pass.
pub async fn eventually(mut cond: impl FnMut() -> bool) {
    timeout(Duration::from_secs(2), async {
        while !cond() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}
