//! Framed Transport
//!
//! Length-prefixed framing over any async byte stream. Framing is independent
//! of the wire codec: a frame body is an opaque byte sequence handed to the
//! codec on read and taken from it on write.

pub mod frame;

pub use frame::{read_frame, write_frame, MAX_FRAME_SIZE};
