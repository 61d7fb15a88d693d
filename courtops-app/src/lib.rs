//! `courtops` command line: configuration, logging and wiring for the agent runtime.

pub mod bootstrap;
pub mod commands;
pub mod config;
pub mod logging;
