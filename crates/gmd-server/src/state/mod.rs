//! Shared server state.

pub mod events;
pub mod store;

pub use events::{ChannelSink, StreamEvent};
pub use store::{AppState, LoopHeartbeat};
