//! Shared library surface for the shade routing server and its tests.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod optimizer;
pub mod providers;
pub mod state;
