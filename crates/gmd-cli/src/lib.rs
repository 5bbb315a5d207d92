//! GMD CLI - command line tools for the missile defense simulation server.
//!
//! - `client`: blocking HTTP client for the REST API
//! - `board`: local threat board built from fetched missiles and sites

pub mod board;
pub mod client;

pub use board::{threat_board, ThreatRow};
pub use client::GmdClient;
