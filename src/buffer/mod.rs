//! Byte cursors and their bit-granular sub-contexts.
//!
//! # Architecture
//!
//! The writer and reader are thin cursors over a byte region. Checked value reads and writes go
//! through the bounds-checked helpers in [`io`]; growth, the high-water mark and the
//! bitwise-context flag are layered on top. Reservation tokens copy straight into their
//! pre-checked window and assert they stay inside it.
//!
//! - [`BufferWriter`] / [`WriteReservation`] - growable output cursor and its batched fast path
//! - [`BufferReader`] / [`ReadReservation`] - input cursor over borrowed or owned bytes
//! - [`BitWriter`] / [`BitReader`] - scoped LSB-first bit access, committed on drop
//!
//! # Thread Safety
//!
//! Cursors are plain owned data and are `Send`. They hold no interior mutability; sharing one
//! between threads requires external synchronization, as with any `&mut` value.

pub mod bitreader;
pub mod bitwriter;
pub mod io;
pub mod reader;
pub mod writer;

pub use bitreader::BitReader;
pub use bitwriter::BitWriter;
pub use io::Blittable;
pub use reader::{BufferReader, ReadReservation};
pub use writer::{BufferWriter, WriteReservation};
