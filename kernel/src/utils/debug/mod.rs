/*
 * Debugging and Logging Utilities
 *
 * Kernel logger, the buffer it writes into, and the ring buffer behind it.
 */

pub mod log_buffer;
pub mod logger;
pub mod ring_buffer;

use crate::config::DEFAULT_LOG_LEVEL;
use log::{LevelFilter, SetLoggerError};

/// Initialize debug infrastructure (kernel logger into the log buffer)
///
/// `None` installs `DEFAULT_LOG_LEVEL`.
pub fn init_debug_infrastructure(level: Option<LevelFilter>) -> Result<(), SetLoggerError> {
    logger::init(level.unwrap_or(DEFAULT_LOG_LEVEL))
}
