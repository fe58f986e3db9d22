//! CLI module for odatakit
//!
//! Provides command-line interface for:
//! - render: print protocol query parameters
//! - query: run a query over a local JSON dataset

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, QueryArgs};
pub use commands::{build_options, init_logging, query, render, run, run_command, LOG_ENV};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_dataset, write_error, write_response};
