use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pos_types::{OrderId, SessionId};

#[derive(Parser)]
#[command(
    name = "posret",
    about = "POS returns ledger: search done orders, inspect them, and create refund orders",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// JSON data file holding the store snapshot
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Server config file (TOML); `--data` wins over its `data_path`
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Search completed orders
    Search(SearchArgs),
    /// Show an order with its returnable quantities
    Show(ShowArgs),
    /// Create the refund order of an order
    Refund(RefundArgs),
    /// List the refund orders of an order
    Refunds(RefundsArgs),
    /// Serve the store over HTTP
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct SearchArgs {
    /// Name, receipt reference or customer; empty lists the session's till
    #[arg(default_value = "")]
    pub query: String,
    #[arg(short, long)]
    pub session: SessionId,
}

#[derive(Args)]
pub struct ShowArgs {
    pub order: OrderId,
}

#[derive(Args)]
pub struct RefundArgs {
    pub order: OrderId,
    /// Build the refund order without saving the data file
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct RefundsArgs {
    pub order: OrderId,
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<String>,
    /// Keep refunds in memory only
    #[arg(long)]
    pub no_persist: bool,
}
