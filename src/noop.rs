use crate::error::ShipError;
use crate::transport::{LogPayload, LogTransport};
use async_trait::async_trait;

/// A transport that accepts every batch and sends nothing.
///
/// Useful for measuring the overhead of buffering and flushing without
/// any network I/O.
#[derive(Clone, Default)]
pub struct NoopTransport;

#[async_trait]
impl LogTransport for NoopTransport {
    async fn send(&self, _payload: &LogPayload) -> Result<(), ShipError> {
        Ok(())
    }
}
