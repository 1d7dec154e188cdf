/*
 * Kernel Configuration
 *
 * Compile-time tunables shared by the memory and logging subsystems.
 */

use log::LevelFilter;

/// Size of a page / physical frame (4 KiB)
pub const PAGE_SIZE: usize = 4096;

/// Capacity of the kernel log ring buffer in bytes
pub const LOG_BUFFER_SIZE: usize = 32 * 1024;

/// Level installed by `utils::debug::init_debug_infrastructure` when the
/// caller does not ask for a specific one
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Chunk size used when the platform drains the log buffer to its console
pub const LOG_DRAIN_CHUNK: usize = 256;
