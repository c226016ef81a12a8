use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::errors::{RegistryError, RegistryResult};

pub fn parse_level(level: &str) -> RegistryResult<Level> {
    level
        .trim()
        .parse::<Level>()
        .map_err(|_| RegistryError::config(format!("unknown log level '{level}'")))
}

/// Install the global fmt subscriber at `level`
pub fn init_tracing(level: &str) -> RegistryResult<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(level)?)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| RegistryError::config(format!("failed to install tracing subscriber: {e}")))
}
