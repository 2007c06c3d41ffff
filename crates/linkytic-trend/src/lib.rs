//! Display-side processing of decoded TIC frames.
//!
//! [`HistoryAggregator`] keeps a bounded power history sized for a display of
//! fixed width, [`estimate_flow`] brackets the power flow from rms current
//! and voltage, and [`Dashboard`] turns each decoded frame into an immutable
//! [`DisplayFrame`]. Frames cross to the renderer through a latest-wins
//! mailbox ([`display_mailbox`]).

pub mod dashboard;
pub mod error;
pub mod flow;
pub mod handoff;
pub mod history;
pub mod percent;

pub use dashboard::{Dashboard, DashboardConfig, DisplayFrame};
pub use error::{HandoffError, HistoryError};
pub use flow::{estimate_flow, FlowDirection, FlowEstimate};
pub use handoff::{display_mailbox, Delivery, MailboxReceiver, MailboxSender};
pub use history::{HistoryAggregator, HistoryConfig, Scaling};
pub use percent::scale_to_percent;
