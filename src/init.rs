use crate::error::ShipError;
use crate::layer::ShipperLayer;
use crate::shipper::LogShipper;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Options for bridging `tracing` events into a [`LogShipper`].
///
/// **Fields**
/// - `min_level`: least severe level forwarded to the shipper.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed as well so events are also printed to the console.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    pub min_level: Level,
    pub enable_stdout: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            min_level: Level::INFO,
            enable_stdout: true,
        }
    }
}

/// Install a global subscriber that forwards events to `shipper`.
///
/// **Returns**
/// - `Err(ShipError::Subscriber)` if a global default subscriber has already
///   been set.
pub fn init_tracing_with_config(
    shipper: Arc<LogShipper>,
    config: BridgeConfig,
) -> Result<(), ShipError> {
    let layer = ShipperLayer::new(shipper, config.min_level);

    // The two subscriber stacks have different types, hence two branches.
    let result = if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    };

    result.map_err(|e| ShipError::Subscriber(e.to_string()))
}

/// Initialize tracing with [`BridgeConfig::default`].
pub fn init_tracing(shipper: Arc<LogShipper>) -> Result<(), ShipError> {
    init_tracing_with_config(shipper, BridgeConfig::default())
}
