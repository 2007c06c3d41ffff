use std::iter::FusedIterator;

use tracing::debug;

use crate::markers::{CR, LF};

/// Splits a frame payload into `LF ... CR` dataset records.
///
/// Bytes before a record's LF are skipped (and logged). A record whose CR
/// never comes is returned with everything up to the end of the frame.
///
/// Note: that tolerance means a frame cut short inside its last dataset can
/// yield a truncated record. The checksum normally rejects it, but nothing
/// here can tell the difference.
#[derive(Debug, Clone)]
pub struct DatasetSplitter<'a> {
    rest: &'a [u8],
}

impl<'a> DatasetSplitter<'a> {
    pub fn new(frame: &'a [u8]) -> Self {
        Self { rest: frame }
    }

    /// Bytes not consumed yet.
    pub fn remainder(&self) -> &'a [u8] {
        self.rest
    }
}

impl<'a> Iterator for DatasetSplitter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        let Some(start) = self.rest.iter().position(|&b| b == LF) else {
            self.rest = &[];
            return None;
        };
        if start != 0 {
            debug!(bytes = start, "skipping leading garbage before dataset");
        }

        let after = &self.rest[start + 1..];
        match after.iter().position(|&b| b == CR) {
            Some(end) => {
                self.rest = &after[end + 1..];
                Some(&after[..end])
            }
            None => {
                debug!(bytes = after.len(), "dataset without CR at end of frame");
                self.rest = &[];
                Some(after)
            }
        }
    }
}

impl FusedIterator for DatasetSplitter<'_> {}
