use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use bytes::Bytes;

use crate::error::{Result, TransportError};

/// Default read chunk size. A full standard-mode frame is well under 1 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;

/// A supplier of raw link bytes.
///
/// `read_available` returns whatever arrived since the previous call, which
/// may be nothing at all. It must not block for long: the frame reader does
/// its own idle pacing.
pub trait ByteSource {
    /// Return the bytes available right now (possibly empty).
    fn read_available(&mut self) -> Result<Bytes>;

    /// True once the source can never produce more bytes.
    ///
    /// Live devices never exhaust; replay sources do at end of input.
    fn is_exhausted(&self) -> bool {
        false
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_available(&mut self) -> Result<Bytes> {
        (**self).read_available()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_available(&mut self) -> Result<Bytes> {
        (**self).read_available()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }
}

/// Byte source over any `Read` implementation.
///
/// `Ok(0)` from the reader is treated as end of input. `WouldBlock` and
/// `TimedOut` read as "nothing yet".
pub struct ReaderSource<R> {
    inner: R,
    chunk_size: usize,
    exhausted: bool,
}

impl<R: Read> ReaderSource<R> {
    /// Wrap a reader with the default chunk size.
    pub fn new(inner: R) -> Self {
        Self::with_chunk_size(inner, DEFAULT_CHUNK_SIZE)
    }

    /// Wrap a reader, reading at most `chunk_size` bytes per call.
    pub fn with_chunk_size(inner: R, chunk_size: usize) -> Self {
        Self {
            inner,
            chunk_size: chunk_size.max(1),
            exhausted: false,
        }
    }

    /// Borrow the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Consume the source and return the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_available(&mut self) -> Result<Bytes> {
        if self.exhausted {
            return Ok(Bytes::new());
        }

        let mut chunk = vec![0u8; self.chunk_size];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    tracing::debug!("reader source reached end of input");
                    self.exhausted = true;
                    return Ok(Bytes::new());
                }
                Ok(n) => {
                    chunk.truncate(n);
                    return Ok(Bytes::from(chunk));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    return Ok(Bytes::new())
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// Byte source replaying a fixed sequence of chunks.
///
/// Each call hands out the next chunk; an empty chunk models a poll where
/// nothing arrived. The source is exhausted once every chunk was handed out.
#[derive(Debug, Default, Clone)]
pub struct ScriptedSource {
    chunks: VecDeque<Bytes>,
}

impl ScriptedSource {
    pub fn new<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
        }
    }

    /// Split `bytes` into chunks of at most `chunk_size` bytes.
    pub fn chunked(bytes: &[u8], chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self::new(
            bytes
                .chunks(chunk_size)
                .map(Bytes::copy_from_slice)
                .collect::<Vec<_>>(),
        )
    }

    /// Append one more chunk to the script.
    pub fn push(&mut self, chunk: impl Into<Bytes>) {
        self.chunks.push_back(chunk.into());
    }

    /// Chunks not handed out yet.
    pub fn remaining(&self) -> usize {
        self.chunks.len()
    }
}

impl ByteSource for ScriptedSource {
    fn read_available(&mut self) -> Result<Bytes> {
        Ok(self.chunks.pop_front().unwrap_or_default())
    }

    fn is_exhausted(&self) -> bool {
        self.chunks.is_empty()
    }
}
