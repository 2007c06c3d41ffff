//! Decode French smart meter TIC telemetry.
//!
//! linkytic turns the raw serial stream of a TIC ("Télé-Information Client")
//! meter into checksum-validated readings, and keeps a display-sized power
//! history on top of them.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte sources (serial tty, capture replay, scripted chunks)
//! - [`frame`]: frame synchronization, dataset checksums, frame assembly
//! - [`trend`]: power history, flow estimate, display state (behind `trend` feature)

/// Re-export transport types.
pub mod transport {
    pub use linkytic_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use linkytic_frame::*;
}

/// Re-export trend types (requires `trend` feature).
#[cfg(feature = "trend")]
pub mod trend {
    pub use linkytic_trend::*;
}
