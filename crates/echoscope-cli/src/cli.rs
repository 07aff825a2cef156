//! CLI argument definitions for echoscope.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `score` | Score a token's early trajectory against the reference basket |
//! | `birth` | Resolve a token's earliest on-chain activity |
//! | `basket` | Print the effective reference basket |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--config` | none | JSON configuration file |
//! | `--rpc-url` | mainnet-beta | Solana JSON-RPC endpoint |
//! | `--timeout-ms` | `15000` | Per-request timeout in ms |
//! | `--offline` | `false` | Use deterministic synthetic data |
//! | `-v` | warn | Raise log verbosity (repeatable) |
//!
//! # Examples
//!
//! ```bash
//! # Score a token against the default basket
//! echoscope score 7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2Hr --format table
//!
//! # Compare against two reference tokens only, at 15 minute buckets
//! echoscope score <ADDRESS> --granularity 15m --basket <REF1> --basket <REF2>
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// Birth-aligned price echo scoring for newly listed Solana tokens.
#[derive(Debug, Parser)]
#[command(name = "echoscope", author, version, about)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// JSON configuration file; absent fields keep their defaults.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Solana JSON-RPC endpoint, overriding config and environment.
    #[arg(long, global = true, value_name = "URL")]
    pub rpc_url: Option<String>,

    /// Per-request timeout budget in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Serve every request from deterministic synthetic data.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    Table,
    /// Single JSON envelope.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Score a token against the reference basket.
    Score(ScoreArgs),
    /// Resolve the earliest on-chain activity of a token.
    Birth(BirthArgs),
    /// Print the effective reference basket.
    Basket,
}

#[derive(Debug, Clone, Args)]
pub struct ScoreArgs {
    /// Token mint address to score.
    pub address: String,

    /// Price-history bucket size (1m, 5m, 1H, 1D, ...).
    #[arg(long)]
    pub granularity: Option<String>,

    /// Reference token address; repeat to replace the configured basket.
    #[arg(long = "basket", value_name = "ADDRESS")]
    pub basket: Vec<String>,

    /// Steps the reference waveform lags the target by.
    #[arg(long)]
    pub phase_shift: Option<usize>,
}

#[derive(Debug, Clone, Args)]
pub struct BirthArgs {
    /// Token mint address.
    pub address: String,
}
