use clap::{Parser, Subcommand};

use crate::gate::GateConfig;

/// gilt — token-gated Farcaster client for $GILT holders.
#[derive(Parser, Debug)]
#[command(name = "gilt", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the interactive session client: sign in, read gates, cast
    Run(RunArgs),

    /// Print the latest casts from the hub feed
    Feed(FeedArgs),

    /// Search hub users by handle or display name
    Search(SearchArgs),

    /// Read a wallet's token balance and entitlements
    Balance(BalanceArgs),

    /// Show the top holders recorded by the sync backend
    Leaderboard(LeaderboardArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Loopback port for the sign-in callback listener
    #[arg(long, default_value = "9311")]
    pub callback_port: u16,

    /// Balance poll interval in milliseconds
    #[arg(long, default_value = "30000")]
    pub poll_interval_ms: u64,

    /// Price refresh interval in milliseconds
    #[arg(long, default_value = "60000")]
    pub price_interval_ms: u64,

    /// Status log interval in milliseconds
    #[arg(long, default_value = "120000")]
    pub status_interval_ms: u64,

    /// Minimum balance to publish a cast
    #[arg(long, default_value = "100000")]
    pub cast_gate: f64,

    /// Minimum balance to publish a golden cast
    #[arg(long, default_value = "1000000")]
    pub golden_cast_gate: f64,

    /// Minimum balance for royal standing
    #[arg(long, default_value = "500000")]
    pub royal_gate: f64,

    /// Minimum balance for the knight tier
    #[arg(long, default_value = "1")]
    pub knight_tier: f64,

    /// Minimum balance for the king tier
    #[arg(long, default_value = "1000000")]
    pub king_tier: f64,
}

impl RunArgs {
    pub fn gates(&self) -> GateConfig {
        GateConfig {
            cast_gate: self.cast_gate,
            golden_cast_gate: self.golden_cast_gate,
            royal_gate: self.royal_gate,
            knight_tier: self.knight_tier,
            king_tier: self.king_tier,
        }
    }
}

#[derive(Parser, Debug)]
pub struct FeedArgs {
    /// Number of casts to fetch
    #[arg(long, default_value = "25")]
    pub limit: u8,

    /// Resume from a page cursor returned by a previous call
    #[arg(long)]
    pub cursor: Option<String>,

    /// Show casts authored by this fid instead of the global feed
    #[arg(long)]
    pub fid: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Handle or display name to search for
    pub query: String,
}

#[derive(Parser, Debug)]
pub struct BalanceArgs {
    /// Wallet address, 0x-prefixed hex
    pub address: String,

    /// Keep reading on an interval instead of exiting after one read
    #[arg(long)]
    pub watch: bool,

    /// Emit JSON lines instead of text
    #[arg(long)]
    pub json: bool,

    /// Read interval in watch mode, in milliseconds
    #[arg(long, default_value = "30000")]
    pub interval_ms: u64,

    /// Minimum balance to publish a cast
    #[arg(long, default_value = "100000")]
    pub cast_gate: f64,

    /// Minimum balance to publish a golden cast
    #[arg(long, default_value = "1000000")]
    pub golden_cast_gate: f64,

    /// Minimum balance for royal standing
    #[arg(long, default_value = "500000")]
    pub royal_gate: f64,

    /// Minimum balance for the knight tier
    #[arg(long, default_value = "1")]
    pub knight_tier: f64,

    /// Minimum balance for the king tier
    #[arg(long, default_value = "1000000")]
    pub king_tier: f64,
}

impl BalanceArgs {
    pub fn gates(&self) -> GateConfig {
        GateConfig {
            cast_gate: self.cast_gate,
            golden_cast_gate: self.golden_cast_gate,
            royal_gate: self.royal_gate,
            knight_tier: self.knight_tier,
            king_tier: self.king_tier,
        }
    }
}

#[derive(Parser, Debug)]
pub struct LeaderboardArgs {
    /// Number of holders to show
    #[arg(long, default_value = "25")]
    pub limit: u32,
}
