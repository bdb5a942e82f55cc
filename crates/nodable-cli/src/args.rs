use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line arguments for the `nodable` binary.
#[derive(Parser, Debug)]
#[command(name = "nodable", version, about = "Parse, compile, and run nodable programs")]
pub struct CliArgs {
    /// Tolerate undeclared identifiers instead of failing the parse.
    #[arg(long, global = true)]
    pub permissive: bool,

    /// Raise tracing verbosity (-v for debug, -vv for trace).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse, compile, and execute a program; print the value left in `rax`.
    Run {
        /// Source file to run.
        file: PathBuf,
    },
    /// Parse a program and print it back out, as a round-trip check.
    Fmt {
        /// Source file to format.
        file: PathBuf,
    },
    /// Parse a program and print a debug tree of the resulting graph.
    Ast {
        /// Source file to inspect.
        file: PathBuf,
    },
}
