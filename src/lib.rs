// Public API for integration tests and the agent binary

pub mod abuse;
pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod persist;
pub mod protocol;
pub mod state;
pub mod sync;
pub mod types;
