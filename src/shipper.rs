use crate::buffer::LogBuffer;
use crate::config::ShipperConfig;
use crate::coordinator::{FlushCoordinator, FlushOutcome, FlushState};
use crate::error::ShipError;
use crate::record::LogEntry;
use crate::transport::LogTransport;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Point-in-time view of a shipper's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShipperStats {
    /// Entries passed to [`LogShipper::log`].
    pub appended: u64,
    /// Entries acknowledged by the collector.
    pub delivered: u64,
    /// Entries returned to the buffer after a failed attempt (counted once
    /// per failed attempt).
    pub requeued: u64,
    /// Shipping attempts that failed.
    pub failed_attempts: u64,
    /// Entries evicted because the buffer reached its capacity, or logged
    /// after [`LogShipper::close`].
    pub dropped: u64,
    /// Entries currently waiting in the buffer.
    pub buffered: usize,
}

/// Constructed but not yet running shipper.
///
/// Created by [`LogShipper::new`]; nothing is spawned until
/// [`init`](LogShipperBuilder::init) is called.
#[derive(Debug, Clone)]
pub struct LogShipperBuilder {
    config: ShipperConfig,
}

impl LogShipperBuilder {
    pub fn config(&self) -> &ShipperConfig {
        &self.config
    }

    /// Override any other configuration field before starting.
    pub fn configure(mut self, f: impl FnOnce(&mut ShipperConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Start shipping to the HTTP collector with the given batch threshold.
    ///
    /// Spawns the flush coordinator and the auto-flush timer on the current
    /// Tokio runtime.
    #[cfg(feature = "http")]
    pub fn init(self, batch_threshold: usize) -> Result<LogShipper, ShipError> {
        let config = self.config.with_batch_threshold(batch_threshold).normalized();
        let transport =
            crate::http::HttpTransport::new(&config.endpoint, config.request_timeout)?;
        LogShipper::with_transport(config, Arc::new(transport))
    }

    /// Start with a caller-supplied transport instead of HTTP.
    pub fn init_with_transport(
        self,
        batch_threshold: usize,
        transport: Arc<dyn LogTransport>,
    ) -> Result<LogShipper, ShipError> {
        let config = self.config.with_batch_threshold(batch_threshold);
        LogShipper::with_transport(config, transport)
    }
}

/// Producer-facing handle: buffers log lines and ships them in batches.
///
/// [`log`](LogShipper::log) never blocks on I/O and never fails. Once the
/// buffer holds `batch_threshold` entries the flush coordinator is woken;
/// in addition a timer flushes whatever has accumulated every
/// `flush_interval`. Batches that fail to deliver are put back at the head
/// of the buffer and retried on the next flush.
///
/// Call [`close`](LogShipper::close) before shutting down so the remainder
/// is shipped.
pub struct LogShipper {
    config: ShipperConfig,
    buffer: Arc<LogBuffer>,
    coordinator: FlushCoordinator,
    appended: AtomicU64,
    closed: AtomicBool,
}

impl LogShipper {
    /// Begin constructing a shipper for `endpoint`, tagging batches with
    /// `source`. An empty `source` uses the default identifier.
    pub fn new(endpoint: impl Into<String>, source: impl Into<String>) -> LogShipperBuilder {
        LogShipperBuilder {
            config: ShipperConfig::new(endpoint, source),
        }
    }

    /// Build and start a shipper from a full config over the HTTP transport.
    #[cfg(feature = "http")]
    pub fn from_config(config: ShipperConfig) -> Result<Self, ShipError> {
        let config = config.normalized();
        let transport =
            crate::http::HttpTransport::new(&config.endpoint, config.request_timeout)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Build and start a shipper delivering through `transport`.
    ///
    /// **Returns**
    /// - `Err(ShipError::Runtime)` when no Tokio runtime is available.
    pub fn with_transport(
        config: ShipperConfig,
        transport: Arc<dyn LogTransport>,
    ) -> Result<Self, ShipError> {
        let config = config.normalized();
        let buffer = Arc::new(LogBuffer::new(config.batch_threshold, config.capacity));
        let coordinator =
            FlushCoordinator::spawn(Arc::clone(&buffer), transport, config.source.clone())?;
        coordinator.start_auto_flush(config.flush_interval);

        debug!(
            endpoint = %config.endpoint,
            source = %config.source,
            batch_threshold = config.batch_threshold,
            "log shipper started"
        );

        Ok(Self {
            config,
            buffer,
            coordinator,
            appended: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        })
    }

    /// Record one log line.
    ///
    /// **Parameters**
    /// - `level`: free-form level, e.g. `"INFO"`.
    /// - `trace_id`: optional trace identifier; `None` leaves the field empty.
    /// - `content`: message text; newlines and backslashes are escaped.
    ///
    /// Entries logged after [`close`](LogShipper::close) are discarded and
    /// counted in [`ShipperStats::dropped`].
    pub fn log(&self, level: &str, trace_id: Option<&str>, content: &str) {
        self.append(LogEntry::new(level, trace_id, content));
    }

    /// Buffer an already formatted entry.
    pub fn append(&self, entry: LogEntry) {
        self.appended.fetch_add(1, Ordering::Relaxed);
        if self.closed.load(Ordering::Acquire) {
            self.buffer.record_dropped(1);
            return;
        }
        if self.buffer.append(entry) {
            self.coordinator.trigger();
        }
    }

    /// Ask for a flush without waiting for it.
    pub fn flush(&self) {
        if !self.buffer.is_empty() {
            self.coordinator.trigger();
        }
    }

    /// Flush and wait until the attempt has either delivered or requeued
    /// the batch.
    pub async fn flush_and_wait(&self) -> FlushOutcome {
        self.coordinator.flush_now().await
    }

    /// Stop the auto-flush timer and ship whatever is left.
    ///
    /// Resolves once the final attempt has finished. A batch that fails here
    /// stays in the buffer. Calling it again does nothing.
    pub async fn close(&self) -> FlushOutcome {
        self.closed.store(true, Ordering::Release);
        let outcome = self.coordinator.shutdown().await;
        debug!(?outcome, buffered = self.buffer.len(), "log shipper closed");
        outcome
    }

    pub fn stop_auto_flush(&self) {
        self.coordinator.stop_auto_flush();
    }

    /// Restart the auto-flush timer with the configured interval.
    pub fn start_auto_flush(&self) {
        self.start_auto_flush_every(self.config.flush_interval);
    }

    pub fn start_auto_flush_every(&self, interval: std::time::Duration) {
        self.coordinator.start_auto_flush(interval);
    }

    pub fn config(&self) -> &ShipperConfig {
        &self.config
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Copy of the lines waiting to be shipped, oldest first.
    pub fn pending(&self) -> Vec<LogEntry> {
        self.buffer.snapshot()
    }

    pub fn state(&self) -> FlushState {
        self.coordinator.state()
    }

    pub fn stats(&self) -> ShipperStats {
        let counters = self.coordinator.counters();
        ShipperStats {
            appended: self.appended.load(Ordering::Relaxed),
            delivered: counters.delivered.load(Ordering::Relaxed),
            requeued: counters.requeued.load(Ordering::Relaxed),
            failed_attempts: counters.failed_attempts.load(Ordering::Relaxed),
            dropped: self.buffer.dropped(),
            buffered: self.buffer.len(),
        }
    }
}
