//! # vault-cli
//!
//! Command-line front end over `vault-core`. Every invocation opens the
//! vault, runs one command and locks again; nothing stays unlocked between
//! runs.

pub mod cli;
pub mod commands;
pub mod output;

pub use cli::{Args, Command, ConfigAction};
pub use commands::run;
