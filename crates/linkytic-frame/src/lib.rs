//! TIC link-layer framing and dataset decoding.
//!
//! A TIC meter streams frames continuously:
//! - a frame is `STX <datasets> ETX`
//! - a dataset is `LF <fields> CR`
//! - fields are `name [date] value checksum`, space-separated in historique
//!   mode and tab-separated in standard mode
//!
//! Decoding happens in stages, each usable on its own:
//! [`FrameSynchronizer`] finds frames in an arbitrary chunked byte stream,
//! [`DatasetSplitter`] cuts a frame into records, [`decode_dataset`] validates
//! one record, and [`assemble`] builds a [`DecodedFrame`]. [`FrameReader`] ties
//! them to a [`ByteSource`](linkytic_transport::ByteSource).

pub mod assemble;
pub mod codec;
pub mod dataset;
pub mod error;
pub mod horodate;
pub mod markers;
pub mod reader;
pub mod sync;

pub use assemble::{assemble, assemble_with_report, decode_frame, AssemblyReport, DecodedFrame};
pub use codec::{checksum, decode_dataset, encode_dataset, encode_frame, Reading, TicMode, TicValue};
pub use dataset::DatasetSplitter;
pub use error::{AttributeError, DatasetError, FrameError, HorodateError, Result};
pub use horodate::{Horodate, Season};
pub use reader::{FrameReader, ReaderConfig};
pub use sync::{FrameConfig, FrameSynchronizer, RawFrame, SyncOutcome, SyncStats, DEFAULT_MAX_FRAME_SIZE};
