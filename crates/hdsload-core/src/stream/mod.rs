//! Per-stream state and the control loop that polls it.

mod poller;
mod state;


pub(crate) use poller::{PollContext, StreamPoller};
pub use state::StreamState;
