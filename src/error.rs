/// Errors produced while building or shipping a batch.
///
/// None of these ever reach the code calling [`LogShipper::log`]; transport
/// failures are logged and the batch is requeued.
///
/// [`LogShipper::log`]: crate::shipper::LogShipper::log
#[derive(thiserror::Error, Debug)]
pub enum ShipError {
    #[error("request to collector failed: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("collector rejected batch with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("malformed log line: expected 5 tab-separated fields")]
    MalformedLine,

    #[error("failed to build http client: {0}")]
    Client(String),

    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),

    #[error("no tokio runtime available: {0}")]
    Runtime(String),

    #[error("flush coordinator has shut down")]
    Closed,

    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for ShipError {
    fn from(e: reqwest::Error) -> Self {
        ShipError::Http(Box::new(e))
    }
}

impl From<String> for ShipError {
    fn from(msg: String) -> Self {
        ShipError::Other(msg)
    }
}

impl From<&str> for ShipError {
    fn from(msg: &str) -> Self {
        ShipError::Other(msg.to_string())
    }
}
