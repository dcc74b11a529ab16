//! Swapgate-api: HTTP API layer for Swapgate
//!
//! Exposes batch submission and read-only engine queries over HTTP.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;

pub use server::*;
pub use state::AppState;
