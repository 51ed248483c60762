//! JSON-lines logging to standard error.
//!
//! Standard output carries extract data, so log records never go there.

use std::io;

use structured_logger::{Builder, json::new_writer};

use crate::CliError;

/// Level used when `stats` is requested.
pub(crate) const STATS_LEVEL: &str = "info";
/// Level used otherwise.
pub(crate) const QUIET_LEVEL: &str = "warn";

pub(crate) const fn level_for(stats: bool) -> &'static str {
    if stats { STATS_LEVEL } else { QUIET_LEVEL }
}

/// Install the process-wide logger.
pub(crate) fn init(stats: bool) -> Result<(), CliError> {
    Builder::with_level(level_for(stats))
        .with_target_writer("*", new_writer(io::stderr()))
        .try_init()?;
    Ok(())
}
