//! HTTP API module.
//!
//! This module provides the HTTP server, response types and the run log
//! stream for the cost impact backend.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::{router, start_server};
pub use types::*;
