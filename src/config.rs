use std::time::Duration;

/// Source identifier used when none is supplied.
pub const DEFAULT_SOURCE: &str = "rust-app";

/// Interval of the recurring auto-flush.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Shortest accepted auto-flush interval.
pub const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(10);

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Collector base address, e.g. `http://127.0.0.1:3000`.
pub const LOG_SHIPPER_ENDPOINT_ENV: &str = "LOG_SHIPPER_ENDPOINT";

/// Source identifier sent with every batch.
pub const LOG_SHIPPER_SOURCE_ENV: &str = "LOG_SHIPPER_SOURCE";

/// Number of buffered entries that triggers a flush.
pub const LOG_SHIPPER_BATCH_THRESHOLD_ENV: &str = "LOG_SHIPPER_BATCH_THRESHOLD";

/// Auto-flush interval in milliseconds.
pub const LOG_SHIPPER_FLUSH_INTERVAL_MS_ENV: &str = "LOG_SHIPPER_FLUSH_INTERVAL_MS";

/// Optional buffer capacity; unset means unbounded.
pub const LOG_SHIPPER_CAPACITY_ENV: &str = "LOG_SHIPPER_CAPACITY";

/// Configuration of a [`LogShipper`](crate::shipper::LogShipper).
///
/// **Fields**
/// - `endpoint`: base address of the collector.
/// - `source`: identifier attached to every batch.
/// - `batch_threshold`: buffered entry count that triggers a flush; `1`
///   ships every line as soon as it is logged.
/// - `flush_interval`: period of the auto-flush timer.
/// - `capacity`: upper bound on buffered entries; the oldest are dropped
///   once it is exceeded. `None` keeps everything.
/// - `request_timeout`: per-request timeout of the HTTP transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShipperConfig {
    pub endpoint: String,
    pub source: String,
    pub batch_threshold: usize,
    pub flush_interval: Duration,
    pub capacity: Option<usize>,
    pub request_timeout: Duration,
}

impl Default for ShipperConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3000".to_string(),
            source: DEFAULT_SOURCE.to_string(),
            batch_threshold: 1,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            capacity: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ShipperConfig {
    /// An empty `source` falls back to [`DEFAULT_SOURCE`].
    pub fn new(endpoint: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            endpoint: endpoint.into(),
            source: if source.is_empty() {
                DEFAULT_SOURCE.to_string()
            } else {
                source
            },
            ..Self::default()
        }
    }

    pub fn with_batch_threshold(mut self, batch_threshold: usize) -> Self {
        self.batch_threshold = batch_threshold;
        self
    }

    pub fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Clamp out-of-range values instead of rejecting them.
    pub fn normalized(mut self) -> Self {
        self.batch_threshold = self.batch_threshold.max(1);
        self.flush_interval = self.flush_interval.max(MIN_FLUSH_INTERVAL);
        self.capacity = self.capacity.map(|c| c.max(1));
        if self.source.is_empty() {
            self.source = DEFAULT_SOURCE.to_string();
        }
        self
    }

    /// Build a config from `LOG_SHIPPER_*` environment variables, using
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let mut config = Self::new(
            env_or(LOG_SHIPPER_ENDPOINT_ENV, &defaults.endpoint),
            env_or(LOG_SHIPPER_SOURCE_ENV, &defaults.source),
        );
        config.batch_threshold =
            env_parse(LOG_SHIPPER_BATCH_THRESHOLD_ENV).unwrap_or(defaults.batch_threshold);
        config.flush_interval = env_parse(LOG_SHIPPER_FLUSH_INTERVAL_MS_ENV)
            .map(Duration::from_millis)
            .unwrap_or(defaults.flush_interval);
        config.capacity = env_parse(LOG_SHIPPER_CAPACITY_ENV);
        config.normalized()
    }
}

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
