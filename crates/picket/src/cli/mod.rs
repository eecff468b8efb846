//! Command implementations for the Picket CLI.

pub mod config;
pub mod scan;
