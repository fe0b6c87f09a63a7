//! Command-line client for the CRM kanban board.
//!
//! The binary is a thin shell over [`commands::execute`]; everything it
//! prints is built here so it can be tested without a terminal.

pub mod cli;
pub mod commands;
pub mod error;
pub mod render;

pub use cli::{Cli, Commands, TaskFields};
pub use commands::{execute, run, Session};
pub use error::CliError;
