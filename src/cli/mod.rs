//! CLI command handlers

pub mod commands;

pub use commands::{inspect, split, SplitArgs};
