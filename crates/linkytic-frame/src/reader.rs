use std::time::Duration;

use bytes::Bytes;
use linkytic_transport::ByteSource;
use tracing::{debug, trace};

use crate::assemble::{assemble_with_report, AssemblyReport, DecodedFrame};
use crate::codec::TicMode;
use crate::error::{FrameError, Result};
use crate::sync::{FrameConfig, FrameSynchronizer, RawFrame, SyncOutcome, SyncStats};

/// Shortest pause between two empty polls.
pub const DEFAULT_MIN_IDLE: Duration = Duration::from_millis(25);

/// Longest pause between two empty polls.
pub const DEFAULT_MAX_IDLE: Duration = Duration::from_millis(200);

/// Configuration for [`FrameReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Wire variant used to decode datasets.
    pub mode: TicMode,
    /// Link-layer limits.
    pub frame: FrameConfig,
    /// First backoff step after an empty poll.
    pub min_idle: Duration,
    /// Backoff ceiling. The link runs at 9600 baud at most, so polling
    /// faster than this buys nothing.
    pub max_idle: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            mode: TicMode::default(),
            frame: FrameConfig::default(),
            min_idle: DEFAULT_MIN_IDLE,
            max_idle: DEFAULT_MAX_IDLE,
        }
    }
}

impl ReaderConfig {
    pub fn for_mode(mode: TicMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

/// Pulls decoded frames out of a [`ByteSource`].
///
/// `next_frame` blocks until a non-empty frame is available, polling the
/// source and backing off between empty reads. This is the only place the
/// decode pipeline waits.
pub struct FrameReader<S> {
    source: S,
    sync: FrameSynchronizer,
    config: ReaderConfig,
    last_report: AssemblyReport,
}

impl<S: ByteSource> FrameReader<S> {
    /// Create a reader with default configuration for `mode`.
    pub fn new(source: S, mode: TicMode) -> Self {
        Self::with_config(source, ReaderConfig::for_mode(mode))
    }

    pub fn with_config(source: S, config: ReaderConfig) -> Self {
        Self {
            source,
            sync: FrameSynchronizer::with_config(config.frame),
            config,
            last_report: AssemblyReport::default(),
        }
    }

    /// Block until the next non-empty raw frame.
    ///
    /// Frames already buffered are returned before the source is polled.
    /// Returns `FrameError::SourceExhausted` once a finite source has run dry.
    pub fn next_raw_frame(&mut self) -> Result<RawFrame> {
        let max_idle = self.config.max_idle;
        let min_idle = self.config.min_idle.min(max_idle);
        let mut idle = min_idle;
        let mut incoming = Bytes::new();

        loop {
            match self.sync.feed(&incoming) {
                SyncOutcome::Frame(raw) if raw.is_empty() => {
                    debug!("skipping empty frame");
                    incoming = Bytes::new();
                    continue;
                }
                SyncOutcome::Frame(raw) => return Ok(raw),
                SyncOutcome::NoData | SyncOutcome::Partial => {}
            }

            incoming = self.source.read_available()?;
            if !incoming.is_empty() {
                idle = min_idle;
                continue;
            }
            if self.source.is_exhausted() {
                return Err(FrameError::SourceExhausted);
            }

            trace!(sleep_ms = idle.as_millis() as u64, "no bytes available");
            std::thread::sleep(idle);
            idle = (idle * 2).min(max_idle);
        }
    }

    /// Block until the next frame and decode it.
    ///
    /// Bad datasets are dropped; see [`FrameReader::last_report`].
    pub fn next_frame(&mut self) -> Result<DecodedFrame> {
        let raw = self.next_raw_frame()?;
        let (frame, report) = assemble_with_report(raw.datasets(), self.config.mode);
        self.last_report = report;
        debug!(
            readings = frame.len(),
            rejected = report.rejected(),
            "frame decoded"
        );
        Ok(frame)
    }

    /// Dataset outcome of the most recent decoded frame.
    pub fn last_report(&self) -> AssemblyReport {
        self.last_report
    }

    /// Link-layer counters.
    pub fn stats(&self) -> SyncStats {
        self.sync.stats()
    }

    pub fn mode(&self) -> TicMode {
        self.config.mode
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consume the reader and return the source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: ByteSource> Iterator for FrameReader<S> {
    type Item = Result<DecodedFrame>;

    /// Ends when the source is exhausted; other errors are yielded.
    fn next(&mut self) -> Option<Self::Item> {
        match self.next_frame() {
            Err(FrameError::SourceExhausted) => None,
            other => Some(other),
        }
    }
}

impl<S> std::fmt::Debug for FrameReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameReader")
            .field("mode", &self.config.mode)
            .field("buffered", &self.sync.buffered_len())
            .field("stats", &self.sync.stats())
            .finish()
    }
}
