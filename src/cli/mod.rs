//! Command line interface
//!
//! - `make-migrations`: report pending and unknown migrations
//! - `migrate`: apply pending migrations
//! - `rollback`: revert the latest migration
//! - `run`: serve the HTTP API and the daily scheduler

pub mod migrations;
pub mod run;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tappweb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare embedded migrations with the database
    MakeMigrations,

    /// Apply all pending migrations
    Migrate,

    /// Revert the latest applied migration
    Rollback,

    /// Run the HTTP server
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Bind address, defaults to the configured server host
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port, defaults to the configured server port
    #[arg(long)]
    pub port: Option<u16>,

    /// Runtime worker threads
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: u16,

    /// Verbose logging and `/docs`
    #[arg(long)]
    pub debug: bool,

    /// Serve from the in-memory store instead of PostgreSQL
    #[arg(long)]
    pub in_memory: bool,
}
