/*
 * Buffered Logging System
 *
 * Global log buffer the kernel logger writes into. Messages stay in memory
 * until the platform drains them to its console, so logging works before any
 * output device is set up.
 */

use super::ring_buffer::RingBuffer;
use crate::config::{LOG_BUFFER_SIZE, LOG_DRAIN_CHUNK};
use core::fmt;
use spin::Mutex;

/// Global log buffer
static LOG_BUFFER: Mutex<RingBuffer<LOG_BUFFER_SIZE>> = Mutex::new(RingBuffer::new());

/// Append formatted output to the log buffer
pub fn write_fmt(args: fmt::Arguments<'_>) {
    let mut buffer = LOG_BUFFER.lock();
    let _ = fmt::Write::write_fmt(&mut *buffer, args);
}

/// Drain pending bytes into `dest`
///
/// # Returns
/// Number of bytes copied
pub fn drain(dest: &mut [u8]) -> usize {
    LOG_BUFFER.lock().read(dest)
}

/// Flush everything pending to `sink` in console-sized chunks
///
/// The platform calls this with its serial writer.
pub fn flush<F: FnMut(&[u8])>(mut sink: F) {
    let mut temp_buf = [0u8; LOG_DRAIN_CHUNK];

    loop {
        let read = drain(&mut temp_buf);
        if read == 0 {
            break;
        }
        sink(&temp_buf[..read]);
    }
}

/// Get current buffer usage (for monitoring)
pub fn buffer_usage() -> usize {
    LOG_BUFFER.lock().len()
}
