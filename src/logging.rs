use crate::err;
use crate::result::BgSizeResult;
use tracing::Level;

/// Installs the global subscriber. Thread names are shown since every
/// resolution cycle and image load runs on its own named thread.
pub fn init_logging(max_level: Level) -> BgSizeResult<()> {
    tracing_subscriber::fmt()
        .with_thread_names(true)
        .with_max_level(max_level)
        .try_init()
        .map_err(|error| err!("Failed to initialize logging: {}", error))
}
