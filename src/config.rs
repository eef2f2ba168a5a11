//! Writer capacity configuration.
//!
//! The initial allocation size and the growth ceiling are the only tunables of the
//! serialization core. There is no endianness option: fixed-width values are copied in native
//! byte order, so reader and writer must run on machines with matching endianness.

/// Capacity settings for a [`crate::BufferWriter`].
///
/// # Default Values
///
/// | Setting | Default Value |
/// |---------|---------------|
/// | `initial_capacity` | 1024 bytes |
/// | `max_capacity` | 1024 bytes |
///
/// With the defaults the writer never grows.
///
/// # Examples
///
/// ```rust
/// use netpack::{BufferWriter, WriterConfig};
///
/// let config = WriterConfig::growable(64, 4096);
/// let writer = BufferWriter::with_config(config)?;
/// assert_eq!(writer.capacity(), 64);
/// assert_eq!(writer.max_capacity(), 4096);
/// # Ok::<(), netpack::Error>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriterConfig {
    /// Initial allocation size in bytes.
    ///
    /// The buffer is zero-filled to this size at construction.
    pub initial_capacity: usize,

    /// Maximum size in bytes.
    ///
    /// The buffer doubles its capacity on demand up to this limit. Writes that would need
    /// more fail with [`crate::Error::CapacityExceeded`].
    pub max_capacity: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self::fixed(1024)
    }
}

impl WriterConfig {
    /// A buffer of exactly `size` bytes that never grows.
    #[must_use]
    pub const fn fixed(size: usize) -> Self {
        Self {
            initial_capacity: size,
            max_capacity: size,
        }
    }

    /// A buffer starting at `initial` bytes that may grow up to `max` bytes.
    #[must_use]
    pub const fn growable(initial: usize, max: usize) -> Self {
        Self {
            initial_capacity: initial,
            max_capacity: max,
        }
    }
}
