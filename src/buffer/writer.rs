//! Growable write cursor.
//!
//! [`BufferWriter`] owns a zero-filled byte region, a write position and a high-water mark.
//! Every write method on the writer is bounds checked and grows the region on demand, doubling
//! its capacity until the request fits but never past the configured maximum.
//!
//! For hot loops the check can be batched: [`BufferWriter::reserve`] verifies (and grows) once
//! for `n` bytes and hands back a [`WriteReservation`], a capability token whose write methods
//! skip the capacity and context checks. The token can only be obtained from a successful check,
//! so the fast path cannot be reached without one.
//!
//! # Length vs. Capacity vs. Position
//!
//! - `position` is where the next byte goes.
//! - `capacity` is the current allocation size; `max_capacity` its ceiling.
//! - `length` is the high-water mark: the furthest position ever reached. Seeking backwards to
//!   patch earlier bytes does not shrink it; only [`BufferWriter::truncate`] does.
//!
//! # Examples
//!
//! ```rust
//! use netpack::BufferWriter;
//!
//! let mut writer = BufferWriter::new(4, 64)?;
//! writer.write_value(&0u32)?;          // placeholder
//! writer.write_bytes(b"payload")?;     // grows to 16 bytes
//!
//! let end = writer.position();
//! writer.seek(0);
//! writer.write_value(&(end as u32))?;  // patch the placeholder
//! writer.seek(end);
//!
//! assert_eq!(writer.length(), 11);
//! assert_eq!(writer.capacity(), 16);
//! # Ok::<(), netpack::Error>(())
//! ```

use log::debug;
use widestring::U16String;
use zerocopy::IntoBytes;

use crate::{
    buffer::{
        bitwriter::BitWriter,
        io::{write_at, write_partial_at, Blittable},
    },
    config::WriterConfig,
    Error, Result,
};

/// A growable byte buffer with a write cursor.
///
/// See the [module documentation](self) for the position/length/capacity model.
#[derive(Debug, Clone)]
pub struct BufferWriter {
    /// Backing storage; `buffer.len()` is the capacity
    buffer: Vec<u8>,
    /// Next byte to write
    position: usize,
    /// High-water mark, synchronised with `position` lazily
    length: usize,
    /// Growth ceiling
    max_capacity: usize,
    /// Set while a [`BitWriter`] derived from this writer is live
    in_bitwise_context: bool,
}

impl Default for BufferWriter {
    fn default() -> Self {
        let config = WriterConfig::default();
        Self::fixed(config.initial_capacity)
    }
}

impl BufferWriter {
    /// Creates a writer with `initial_capacity` zeroed bytes that may grow up to `max_capacity`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `max_capacity < initial_capacity`.
    pub fn new(initial_capacity: usize, max_capacity: usize) -> Result<Self> {
        if max_capacity < initial_capacity {
            return Err(Error::InvalidCapacity {
                initial: initial_capacity,
                max: max_capacity,
            });
        }

        Ok(BufferWriter {
            buffer: vec![0; initial_capacity],
            position: 0,
            length: 0,
            max_capacity,
            in_bitwise_context: false,
        })
    }

    /// Creates a writer of exactly `size` bytes that never grows.
    #[must_use]
    pub fn fixed(size: usize) -> Self {
        BufferWriter {
            buffer: vec![0; size],
            position: 0,
            length: 0,
            max_capacity: size,
            in_bitwise_context: false,
        }
    }

    /// Creates a writer from a [`WriterConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if the configured maximum is below the initial size.
    pub fn with_config(config: WriterConfig) -> Result<Self> {
        Self::new(config.initial_capacity, config.max_capacity)
    }

    /// Next byte index to be written.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// The high-water mark: the largest position ever reached.
    #[must_use]
    pub fn length(&self) -> usize {
        self.position.max(self.length)
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// Current allocation size.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Size the buffer may grow to.
    #[must_use]
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Bytes that can still be written from the current position, counting possible growth.
    #[must_use]
    pub fn remaining_capacity(&self) -> usize {
        self.max_capacity.saturating_sub(self.position)
    }

    /// Returns `true` while a [`BitWriter`] derived from this writer is live (or was leaked).
    #[must_use]
    pub fn in_bitwise_context(&self) -> bool {
        self.in_bitwise_context
    }

    /// Moves the cursor to `pos`, clamped to the current capacity.
    ///
    /// Moving backwards keeps the high-water mark, so already-written data is not lost.
    pub fn seek(&mut self, pos: usize) {
        let pos = pos.min(self.buffer.len());
        if self.position > self.length && pos < self.position {
            self.length = self.position;
        }
        self.position = pos;
    }

    /// Shrinks the high-water mark to the current position.
    pub fn truncate(&mut self) {
        self.truncate_to(self.position);
    }

    /// Shrinks the high-water mark to `min(length, pos)`, pulling the position back if needed.
    ///
    /// This is the only operation that reduces [`BufferWriter::length`].
    pub fn truncate_to(&mut self, pos: usize) {
        if self.position > pos {
            self.position = pos;
        }
        if self.length > pos {
            self.length = pos;
        }
    }

    /// Opens a bit-granular sub-context starting at the current position.
    ///
    /// The returned [`BitWriter`] borrows this writer; when it is dropped, the position
    /// advances by the number of bytes its bits touched (rounded up).
    ///
    /// # Errors
    ///
    /// Returns [`Error::BitwiseContextActive`] if a previous context was leaked.
    pub fn enter_bitwise_context(&mut self) -> Result<BitWriter<'_>> {
        if self.in_bitwise_context {
            return Err(Error::BitwiseContextActive);
        }
        self.in_bitwise_context = true;
        Ok(BitWriter::new(self))
    }

    /// Batched bounds check: makes sure `bytes` more bytes fit at the current position,
    /// growing the buffer if necessary.
    ///
    /// Returns `false` if the request cannot be satisfied within `max_capacity` or a bitwise
    /// context is active; the buffer is left untouched in that case.
    #[must_use]
    pub fn try_begin_write(&mut self, bytes: usize) -> bool {
        if self.in_bitwise_context {
            debug!("try_begin_write({bytes}) rejected: bitwise context active");
            return false;
        }
        match self.position.checked_add(bytes) {
            Some(end) => self.ensure_capacity(end),
            None => false,
        }
    }

    /// Same as [`BufferWriter::try_begin_write`] for `size_of::<T>()` bytes.
    #[must_use]
    pub fn try_begin_write_value<T: Blittable>(&mut self) -> bool {
        self.try_begin_write(std::mem::size_of::<T>())
    }

    /// Batched bounds check returning a capability token for unchecked writes.
    ///
    /// All writes through the returned [`WriteReservation`] skip capacity checks. Composing a
    /// multi-field value inside one reservation makes it atomic: either all of it fits or
    /// nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BitwiseContextActive`] if a bit context is active, or
    /// [`Error::CapacityExceeded`] if `bytes` cannot fit within `max_capacity`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use netpack::BufferWriter;
    ///
    /// let mut writer = BufferWriter::new(8, 8)?;
    /// let mut batch = writer.reserve(6)?;
    /// batch.write_value(&0xABCDu16);
    /// batch.write_value(&7u32);
    /// drop(batch);
    /// assert_eq!(writer.position(), 6);
    /// # Ok::<(), netpack::Error>(())
    /// ```
    pub fn reserve(&mut self, bytes: usize) -> Result<WriteReservation<'_>> {
        self.check_bytewise()?;
        let end = self.require(bytes)?;
        Ok(WriteReservation { writer: self, end })
    }

    /// Writes one byte.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] or [`Error::BitwiseContextActive`].
    pub fn write_byte(&mut self, value: u8) -> Result<()> {
        self.claim(1)?[0] = value;
        Ok(())
    }

    /// Writes a byte slice verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] or [`Error::BitwiseContextActive`].
    pub fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.claim(value.len())?.copy_from_slice(value);
        Ok(())
    }

    /// Copies the in-memory (native-endian) representation of `value` into the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] or [`Error::BitwiseContextActive`].
    pub fn write_value<T: Blittable>(&mut self, value: &T) -> Result<()> {
        self.check_bytewise()?;
        self.require(std::mem::size_of::<T>())?;
        write_at(&mut self.buffer, &mut self.position, value)
    }

    /// Writes a `bool` as one byte, `0` or `1`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] or [`Error::BitwiseContextActive`].
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_byte(u8::from(value))
    }

    /// Writes the low `count` bytes (0-8) of `value`, little-endian.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`], [`Error::BitwiseContextActive`], or
    /// [`Error::Malformed`] if `count > 8`.
    pub fn write_partial(&mut self, value: u64, count: usize) -> Result<()> {
        if count > 8 {
            return Err(malformed_error!(
                "Partial value of {} bytes does not fit in 64 bits",
                count
            ));
        }
        self.check_bytewise()?;
        self.require(count)?;
        write_partial_at(&mut self.buffer, &mut self.position, value, count)
    }

    /// Writes a `u32` element count followed by the raw bytes of every element.
    ///
    /// The whole slice is reserved up front, so a failure writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`], [`Error::BitwiseContextActive`], or
    /// [`Error::Malformed`] if the slice has more than `u32::MAX` elements.
    pub fn write_slice<T: Blittable>(&mut self, values: &[T]) -> Result<()> {
        let count = u32::try_from(values.len())
            .map_err(|_| malformed_error!("Slice of {} elements is too long", values.len()))?;

        let mut batch = self.reserve(Self::size_of_slice(values))?;
        batch.write_value(&count);
        batch.write_bytes(values.as_bytes());
        Ok(())
    }

    /// Writes a string as a `u32` UTF-16 unit count followed by the units.
    ///
    /// Each unit takes two native-endian bytes, or a single byte (the low byte of the unit)
    /// when `one_byte_chars` is set. The one-byte form is only lossless for Latin-1 text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`], [`Error::BitwiseContextActive`], or
    /// [`Error::Malformed`] if the string has more than `u32::MAX` units.
    pub fn write_string(&mut self, value: &str, one_byte_chars: bool) -> Result<()> {
        let units = U16String::from_str(value);
        let count = u32::try_from(units.len())
            .map_err(|_| malformed_error!("String of {} units is too long", units.len()))?;

        let unit_size = if one_byte_chars { 1 } else { 2 };
        let mut batch = self.reserve(4 + units.len() * unit_size)?;
        batch.write_value(&count);
        if one_byte_chars {
            for unit in units.as_slice() {
                batch.write_byte(unit.to_le_bytes()[0]);
            }
        } else {
            batch.write_bytes(units.as_slice().as_bytes());
        }
        Ok(())
    }

    /// Size of a fixed write of `T`.
    #[must_use]
    pub const fn size_of_value<T: Blittable>() -> usize {
        std::mem::size_of::<T>()
    }

    /// Size of [`BufferWriter::write_slice`] for `values`.
    #[must_use]
    pub fn size_of_slice<T: Blittable>(values: &[T]) -> usize {
        4 + std::mem::size_of_val(values)
    }

    /// Size of [`BufferWriter::write_string`] for `value`.
    #[must_use]
    pub fn size_of_string(value: &str, one_byte_chars: bool) -> usize {
        let units = value.encode_utf16().count();
        4 + units * if one_byte_chars { 1 } else { 2 }
    }

    /// The written bytes, `[0, length)`.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.length()]
    }

    /// Copies the written bytes into a new vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    /// Consumes the writer and returns the written bytes without copying.
    #[must_use]
    pub fn into_vec(mut self) -> Vec<u8> {
        let length = self.length();
        self.buffer.truncate(length);
        self.buffer
    }

    /// Raw view of the allocation from the current position to the end of the capacity.
    ///
    /// Bytes filled through this slice become part of the stream once committed with
    /// [`BufferWriter::advance`].
    pub fn spare_capacity_mut(&mut self) -> &mut [u8] {
        let position = self.position;
        &mut self.buffer[position..]
    }

    /// Commits `bytes` bytes that were filled through [`BufferWriter::spare_capacity_mut`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] if `bytes` is more than the spare capacity, or
    /// [`Error::BitwiseContextActive`].
    pub fn advance(&mut self, bytes: usize) -> Result<()> {
        self.check_bytewise()?;
        if bytes > self.buffer.len() - self.position {
            return Err(capacity_error!(bytes, self.position, self.buffer.len()));
        }
        self.position += bytes;
        Ok(())
    }

    /// Appends `[0, position)` of this writer to `other`.
    ///
    /// # Errors
    ///
    /// Returns any error from writing into `other`.
    pub fn copy_to(&self, other: &mut BufferWriter) -> Result<()> {
        other.write_bytes(&self.buffer[..self.position])
    }

    /// Appends `[0, position)` of `other` to this writer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] or [`Error::BitwiseContextActive`].
    pub fn copy_from(&mut self, other: &BufferWriter) -> Result<()> {
        self.write_bytes(&other.buffer[..other.position])
    }

    /// Makes sure the buffer can hold `end` bytes, growing it if allowed.
    pub(crate) fn ensure_capacity(&mut self, end: usize) -> bool {
        if end <= self.buffer.len() {
            return true;
        }
        if end > self.max_capacity {
            debug!(
                "Growth to {} bytes rejected: maximum capacity is {}",
                end, self.max_capacity
            );
            return false;
        }
        self.grow(end)
    }

    /// Doubles the capacity until `required` fits, clamped to `max_capacity`.
    ///
    /// Returns `false` if the allocator refuses the new size; the buffer is left untouched.
    fn grow(&mut self, required: usize) -> bool {
        let mut desired = self.buffer.len().max(1).saturating_mul(2);
        while desired < required {
            desired = desired.saturating_mul(2);
        }
        let new_size = desired.min(self.max_capacity);

        if let Err(e) = self.buffer.try_reserve_exact(new_size - self.buffer.len()) {
            debug!(
                "Growth from {} to {} bytes failed: {}",
                self.buffer.len(),
                new_size,
                e
            );
            return false;
        }

        debug!(
            "Growing buffer from {} to {} bytes (required {})",
            self.buffer.len(),
            new_size,
            required
        );
        self.buffer.resize(new_size, 0);
        true
    }

    /// Called by [`BitWriter`] on drop.
    pub(crate) fn commit_bitwise_writes(&mut self, bytes: usize) {
        self.position += bytes;
        self.in_bitwise_context = false;
    }

    pub(crate) fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    fn check_bytewise(&self) -> Result<()> {
        if self.in_bitwise_context {
            return Err(Error::BitwiseContextActive);
        }
        Ok(())
    }

    /// Makes `bytes` bytes available at the position and returns the end of that window.
    fn require(&mut self, bytes: usize) -> Result<usize> {
        match self.position.checked_add(bytes) {
            Some(end) if self.ensure_capacity(end) => Ok(end),
            _ => Err(capacity_error!(bytes, self.position, self.max_capacity)),
        }
    }

    /// Checked write window: returns `[position, position + len)` and advances past it.
    fn claim(&mut self, len: usize) -> Result<&mut [u8]> {
        self.check_bytewise()?;
        let end = self.require(len)?;
        let start = self.position;
        self.position = end;
        Ok(&mut self.buffer[start..end])
    }
}

/// Capability token for writes whose capacity was verified up front.
///
/// Obtained from [`BufferWriter::reserve`]. Writes through the token skip the capacity and
/// bitwise-context checks of the writer. Writing past the reserved window is a programmer
/// error and panics in every build configuration; it can never corrupt memory.
#[derive(Debug)]
pub struct WriteReservation<'w> {
    writer: &'w mut BufferWriter,
    /// Absolute end of the reserved window
    end: usize,
}

impl WriteReservation<'_> {
    /// Current write position of the underlying writer.
    #[must_use]
    pub fn position(&self) -> usize {
        self.writer.position
    }

    /// Bytes left in the reserved window.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.end - self.writer.position
    }

    /// Writes one byte.
    ///
    /// # Panics
    ///
    /// Panics if the reserved window is exhausted.
    pub fn write_byte(&mut self, value: u8) {
        self.window(1)[0] = value;
    }

    /// Writes a byte slice verbatim.
    ///
    /// # Panics
    ///
    /// Panics if the slice does not fit the remaining reserved window.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.window(value.len()).copy_from_slice(value);
    }

    /// Copies the in-memory representation of `value`.
    ///
    /// # Panics
    ///
    /// Panics if `T` does not fit the remaining reserved window.
    pub fn write_value<T: Blittable>(&mut self, value: &T) {
        self.window(std::mem::size_of::<T>())
            .copy_from_slice(value.as_bytes());
    }

    /// Writes a `bool` as one byte, `0` or `1`.
    ///
    /// # Panics
    ///
    /// Panics if the reserved window is exhausted.
    pub fn write_bool(&mut self, value: bool) {
        self.write_byte(u8::from(value));
    }

    /// Writes the low `count` bytes of `value`, little-endian.
    ///
    /// # Panics
    ///
    /// Panics if `count > 8` or the bytes do not fit the remaining reserved window.
    pub fn write_partial(&mut self, value: u64, count: usize) {
        assert!(count <= 8, "partial value of {count} bytes");
        self.window(count)
            .copy_from_slice(&value.to_le_bytes()[..count]);
    }

    fn window(&mut self, len: usize) -> &mut [u8] {
        let start = self.writer.position;
        assert!(
            len <= self.end - start,
            "write of {len} bytes at {start} exceeds the reservation ending at {}",
            self.end
        );
        self.writer.position = start + len;
        &mut self.writer.buffer[start..start + len]
    }
}
