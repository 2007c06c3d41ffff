//! Byte sources feeding the TIC link layer.
//!
//! The meter pushes bytes at 1200 or 9600 baud and never aligns them with
//! frame boundaries. Everything above this crate only ever asks one question:
//! "which bytes arrived since last time?" ([`ByteSource::read_available`]).
//!
//! Provided sources:
//! - [`SerialPort`]: a tty configured for the TIC line format (7E1)
//! - [`ReaderSource`]: any `Read` (capture files, stdin)
//! - [`ScriptedSource`]: a fixed list of chunks, handy for tests and demos

pub mod error;
pub mod source;

pub mod serial;

pub use error::{Result, TransportError};
pub use source::{ByteSource, ReaderSource, ScriptedSource, DEFAULT_CHUNK_SIZE};

pub use serial::{SerialConfig, SerialPort, DEFAULT_READ_TIMEOUT, SUPPORTED_BAUD_RATES};
