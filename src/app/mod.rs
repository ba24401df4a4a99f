//! Application wiring

pub mod driver;
pub mod state;

pub use state::{AppState, VoteError};
