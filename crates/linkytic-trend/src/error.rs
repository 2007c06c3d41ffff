/// A history geometry that cannot be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    /// Width and requested size must both be at least 1.
    #[error("invalid history geometry: width {width}, requested size {requested}")]
    InvalidGeometry { width: usize, requested: usize },
}

/// Errors from the display mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HandoffError {
    /// The receiving side was dropped.
    #[error("display mailbox closed by receiver")]
    Closed,

    /// The sending side was dropped and the slot is empty.
    #[error("display mailbox disconnected by sender")]
    Disconnected,

    /// Nothing was published before the timeout.
    #[error("timed out waiting for a display frame")]
    Timeout,
}
