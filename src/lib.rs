pub mod error;
pub mod record;
pub mod buffer;
pub mod transport;
pub mod coordinator;
pub mod shipper;
pub mod config;
pub mod layer;

#[cfg(feature = "http")]
pub mod http;

pub mod init;
pub mod noop;

pub use config::ShipperConfig;
pub use coordinator::{FlushOutcome, FlushState};
pub use error::ShipError;
pub use record::LogEntry;
pub use shipper::{LogShipper, LogShipperBuilder, ShipperStats};
pub use transport::{LogPayload, LogTransport};
