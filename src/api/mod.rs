//! Refresh loop and presentation interfaces
//!
//! The loop produces a [`TickReport`] per refresh and hands it to a
//! [`PositionSink`]. Rendering is entirely the sink's business.

pub mod types;
pub mod formatting;
pub mod refresh;

pub use types::{TickStatus, TickReport};
pub use formatting::{
    PositionSink, SinkError, SinkResult, TextSink, JsonLinesSink, ChannelSink, format_report_line,
};
pub use refresh::RefreshLoop;
