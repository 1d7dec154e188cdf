/*
 * Kernel Logging System
 *
 * `log` backend for the Solo kernel. Records are formatted as
 * "[LEVEL] message" into the global log buffer.
 */

use super::log_buffer;
use log::{LevelFilter, Metadata, Record, SetLoggerError};

/// Logger writing into the kernel log buffer
struct KernelLogger;

impl log::Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            log_buffer::write_fmt(format_args!("[{}] {}\n", record.level(), record.args()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: KernelLogger = KernelLogger;

/// Install the kernel logger with `level` as the maximum level
///
/// Fails if a logger has already been installed.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}
