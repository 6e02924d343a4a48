use std::sync::Arc;

use async_trait::async_trait;
use log_shipper::{LogPayload, LogShipper, LogTransport, ShipError};

/// Example of delivering batches somewhere other than the HTTP collector
/// by implementing `LogTransport` directly. This one just prints them.
struct StdoutTransport;

#[async_trait]
impl LogTransport for StdoutTransport {
    async fn send(&self, payload: &LogPayload) -> Result<(), ShipError> {
        println!("[{}] batch of {}", payload.source, payload.len());
        for line in &payload.logs {
            println!("  {}", line);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let shipper = LogShipper::new("unused", "custom-transport-app")
        .init_with_transport(3, Arc::new(StdoutTransport))
        .expect("start shipper");

    shipper.log("INFO", None, "custom transport example started");
    shipper.log("DEBUG", Some("trace-001"), "doing work");
    shipper.log("ERROR", Some("trace-002"), "simulated failure\nwith a second line");
    shipper.log("INFO", None, "left over for close()");

    shipper.close().await;
}
