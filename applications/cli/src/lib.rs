//! Encore command-line client
//!
//! Configuration, backend wiring and command handlers for the `encore`
//! binary.

pub mod app;
pub mod commands;
pub mod config;
