#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(rust_2018_idioms, unsafe_code)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::module_name_repetitions)]

mod args;
mod commands;
mod context;

use args::Args;
use clap::Parser;
use context::Context;
use ledger::LedgerError;
use std::process::ExitCode;
use thiserror::Error;
use wordgen::WordError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Word(#[from] WordError),
    #[error("{0}")]
    Usage(String),
    #[error("failed to open `{0:?}` with `{1}`")]
    Open(std::path::PathBuf, String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let ctx = Context {
        master: args.master,
        copies: args.copies,
        interactive: !args.cli,
    };

    match commands::run(&ctx, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ctx.error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
