//! Shared library surface for the simulation server and its tests.

pub mod api;
pub mod config;
pub mod loops;
pub mod persistence;
pub mod state;
