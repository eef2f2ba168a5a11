use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    ($requested:expr, $position:expr, $length:expr) => {
        crate::Error::OutOfBounds {
            requested: $requested,
            position: $position,
            length: $length,
        }
    };
}

macro_rules! capacity_error {
    ($requested:expr, $position:expr, $max_capacity:expr) => {
        crate::Error::CapacityExceeded {
            requested: $requested,
            position: $position,
            max_capacity: $max_capacity,
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every failure in this crate is local and synchronous: it is returned at the call site that
/// caused it, and there is nothing to retry. A failed single-call write or read leaves the cursor
/// position unchanged; a sequence of calls composing one logical value is not rolled back, so
/// callers who need that atomicity reserve the full size up front with
/// [`crate::BufferWriter::reserve`] or use [`crate::BufferReader::transactional`].
///
/// # Error Categories
///
/// ## Capacity Errors
/// - [`Error::CapacityExceeded`] - A write would grow the buffer past its maximum capacity
/// - [`Error::OutOfBounds`] - A read would pass the end of the readable data
/// - [`Error::InvalidCapacity`] - A writer was configured with `max < initial`
///
/// ## Programmer Errors
/// - [`Error::BitwiseContextActive`] - Bytewise access while a bit context is live
/// - [`Error::BitCountOutOfRange`] - More bits requested than the target type holds
///
/// ## Encoding Errors
/// - [`Error::BitBudgetExceeded`] - Value does not fit the bit-packed budget of its type
/// - [`Error::Malformed`] - Input bytes cannot be decoded as the requested type
///
/// # Examples
///
/// ```rust
/// use netpack::{BufferWriter, Error};
///
/// let mut writer = BufferWriter::new(2, 2)?;
/// match writer.write_bytes(&[1, 2, 3]) {
///     Err(Error::CapacityExceeded { requested, max_capacity, .. }) => {
///         assert_eq!(requested, 3);
///         assert_eq!(max_capacity, 2);
///     }
///     other => panic!("unexpected result: {other:?}"),
/// }
/// assert_eq!(writer.position(), 0);
/// # Ok::<(), netpack::Error>(())
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A write would exceed the writer's maximum capacity.
    ///
    /// Growth doubles the current capacity until the request fits, clamped to the maximum;
    /// when even the maximum cannot hold `position + requested` bytes, this is returned and
    /// nothing is written.
    #[error("Writing past the end of the buffer - {requested} bytes at position {position}, maximum capacity is {max_capacity}")]
    CapacityExceeded {
        /// Number of bytes the failed operation needed
        requested: usize,
        /// Cursor position at the time of the request
        position: usize,
        /// The writer's configured ceiling
        max_capacity: usize,
    },

    /// A read would pass the end of the readable data.
    #[error("Reading past the end of the buffer - {requested} bytes at position {position}, length is {length}")]
    OutOfBounds {
        /// Number of bytes the failed operation needed
        requested: usize,
        /// Cursor position at the time of the request
        position: usize,
        /// Total readable length
        length: usize,
    },

    /// The writer was configured with a maximum capacity below its initial capacity.
    #[error("Maximum capacity {max} is smaller than initial capacity {initial}")]
    InvalidCapacity {
        /// Requested initial capacity
        initial: usize,
        /// Requested maximum capacity
        max: usize,
    },

    /// A bytewise operation was attempted while a bit context derived from the same cursor
    /// is still live.
    ///
    /// With safe code the borrow checker rules this out; it can only be observed after a
    /// [`crate::BitWriter`] or [`crate::BitReader`] was leaked with `std::mem::forget`.
    #[error("Cannot use the buffer in bytewise mode while in a bitwise context")]
    BitwiseContextActive,

    /// A value does not fit the bit budget of its bit-packed encoding.
    #[error("Value {value} does not fit in the {bits}-bit packed budget")]
    BitBudgetExceeded {
        /// The rejected value, after zigzag mapping for signed types
        value: u64,
        /// Bits available for the payload
        bits: u32,
    },

    /// More bits were requested than the target type can hold.
    #[error("Cannot transfer {requested} bits, at most {max} are allowed")]
    BitCountOutOfRange {
        /// Requested bit count
        requested: usize,
        /// Maximum for this operation
        max: usize,
    },

    /// The input could not be decoded.
    ///
    /// Includes the source location where the problem was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },
}
