use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, warn};

use crate::dataset::DatasetSplitter;
use crate::markers::{ETX, STX};

const INITIAL_BUFFER_CAPACITY: usize = 2 * 1024;

/// Default upper bound on a frame payload: 16 KiB.
///
/// A standard-mode Linky frame is well under 2 KiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024;

/// Link-layer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. A frame growing past it is abandoned
    /// and the synchronizer hunts for the next STX.
    pub max_frame_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// A frame payload with its STX/ETX markers stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame(Bytes);

impl RawFrame {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self(payload.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the dataset records of this frame.
    pub fn datasets(&self) -> DatasetSplitter<'_> {
        DatasetSplitter::new(&self.0)
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl AsRef<[u8]> for RawFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Result of one [`FrameSynchronizer::feed`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No start marker buffered: not synchronized to a frame.
    NoData,
    /// A frame has started but its end marker has not arrived.
    Partial,
    /// A complete frame.
    Frame(RawFrame),
}

impl SyncOutcome {
    pub fn into_frame(self) -> Option<RawFrame> {
        match self {
            SyncOutcome::Frame(frame) => Some(frame),
            SyncOutcome::NoData | SyncOutcome::Partial => None,
        }
    }
}

/// Link-layer counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Frames emitted.
    pub frames: u64,
    /// Times synchronization was lost and found again.
    pub resyncs: u64,
    /// Bytes thrown away while hunting for a start marker.
    pub discarded_bytes: u64,
}

/// Finds `STX ... ETX` frames in a chunked byte stream.
///
/// Bytes are buffered across calls, so frames may be split at any point.
/// Bytes outside a frame are dropped. Losing sync after it was once
/// established is reported as a resync (logged and counted), never as an
/// error.
#[derive(Debug)]
pub struct FrameSynchronizer {
    buf: BytesMut,
    config: FrameConfig,
    synced: bool,
    // Bytes were dropped since the last start marker was seen.
    dropped_since_stx: bool,
    stats: SyncStats,
}

impl Default for FrameSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSynchronizer {
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            synced: false,
            dropped_since_stx: false,
            stats: SyncStats::default(),
        }
    }

    /// Append `bytes` and try to cut the next frame.
    ///
    /// At most one frame is returned per call. Call again with an empty
    /// slice to drain frames that are already buffered.
    pub fn feed(&mut self, bytes: &[u8]) -> SyncOutcome {
        self.buf.extend_from_slice(bytes);

        loop {
            let Some(stx) = self.buf.iter().position(|&b| b == STX) else {
                if !self.buf.is_empty() {
                    self.discard(self.buf.len());
                }
                return SyncOutcome::NoData;
            };

            if stx > 0 {
                self.discard(stx);
            }
            if self.dropped_since_stx {
                if self.synced {
                    self.stats.resyncs += 1;
                    warn!(
                        discarded_total = self.stats.discarded_bytes,
                        "lost frame synchronization, resynchronized on next STX"
                    );
                }
                self.dropped_since_stx = false;
            }
            self.synced = true;

            let etx = self.buf[1..]
                .iter()
                .position(|&b| b == ETX)
                .map(|pos| pos + 1);
            let payload_len = etx.map_or(self.buf.len() - 1, |etx| etx - 1);

            if payload_len > self.config.max_frame_size {
                warn!(
                    size = payload_len,
                    max = self.config.max_frame_size,
                    "frame exceeds maximum size, dropping it"
                );
                self.discard(1);
                continue;
            }

            let Some(etx) = etx else {
                return SyncOutcome::Partial;
            };

            self.buf.advance(1);
            let payload = self.buf.split_to(etx - 1).freeze();
            self.buf.advance(1);
            self.stats.frames += 1;
            debug!(size = payload.len(), "frame received");

            return SyncOutcome::Frame(RawFrame(payload));
        }
    }

    /// Drop buffered bytes and forget synchronization.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.synced = false;
        self.dropped_since_stx = false;
    }

    /// True once a start marker has been seen.
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Bytes currently buffered (a partial frame, or complete frames not yet drained).
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn discard(&mut self, n: usize) {
        self.buf.advance(n);
        self.stats.discarded_bytes += n as u64;
        self.dropped_since_stx = true;
    }
}
