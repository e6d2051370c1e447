//! Command handlers, one module per command group.

pub mod diff;
pub mod init;
pub mod prompts;
pub mod tags;
