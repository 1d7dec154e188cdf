/*
 * Ring Buffer for Logging
 *
 * Fixed-size circular byte buffer backing the kernel log.
 *
 * Design:
 * - Capacity is a const generic, storage lives inline (no heap)
 * - Overwrite on overflow (loses the oldest bytes)
 * - Not synchronized; the log buffer wraps it in a spin lock
 */

use core::fmt;

/// Circular byte buffer holding at most `N` bytes
pub struct RingBuffer<const N: usize> {
    /// Circular buffer storage
    buffer: [u8; N],

    /// Index of the oldest unread byte
    start: usize,

    /// Number of unread bytes
    len: usize,
}

impl<const N: usize> RingBuffer<N> {
    /// Create a new empty ring buffer
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            start: 0,
            len: 0,
        }
    }

    /// Write a string to the ring buffer
    ///
    /// If the buffer is full, the oldest data is overwritten.
    ///
    /// # Returns
    /// Number of bytes written
    pub fn write(&mut self, data: &str) -> usize {
        if N == 0 {
            return 0;
        }

        for &byte in data.as_bytes() {
            let idx = (self.start + self.len) % N;
            self.buffer[idx] = byte;

            if self.len < N {
                self.len += 1;
            } else {
                self.start = (self.start + 1) % N;
            }
        }

        data.len()
    }

    /// Drain up to `dest.len()` of the oldest bytes into `dest`
    ///
    /// # Returns
    /// Number of bytes actually read
    pub fn read(&mut self, dest: &mut [u8]) -> usize {
        let to_read = self.len.min(dest.len());

        for (i, slot) in dest.iter_mut().take(to_read).enumerate() {
            *slot = self.buffer[(self.start + i) % N];
        }

        if to_read > 0 {
            self.start = (self.start + to_read) % N;
            self.len -= to_read;
        }

        to_read
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of unread bytes
    pub fn len(&self) -> usize {
        self.len
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Write for RingBuffer<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read() {
        let mut rb = RingBuffer::<64>::new();

        let written = rb.write("Hello, World!");
        assert_eq!(written, 13);
        assert_eq!(rb.len(), 13);

        let mut buf = [0u8; 20];
        let read = rb.read(&mut buf);
        assert_eq!(read, 13);
        assert_eq!(&buf[..13], b"Hello, World!");
        assert!(rb.is_empty());
    }

    #[test]
    fn test_partial_read() {
        let mut rb = RingBuffer::<16>::new();
        rb.write("abcdef");

        let mut buf = [0u8; 4];
        assert_eq!(rb.read(&mut buf), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(rb.read(&mut buf), 2);
        assert_eq!(&buf[..2], b"ef");
    }

    #[test]
    fn test_overwrite_oldest() {
        let mut rb = RingBuffer::<8>::new();
        rb.write("0123456");
        rb.write("789");
        assert_eq!(rb.len(), 8);

        let mut buf = [0u8; 8];
        assert_eq!(rb.read(&mut buf), 8);
        assert_eq!(&buf, b"23456789");
    }
}
