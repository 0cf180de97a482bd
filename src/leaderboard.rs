//! Holder leaderboard from the sync backend: the `leaderboard` command.

use castgate::UserRow;

use crate::client;
use crate::error::GiltError;
use crate::gate::{evaluate, GateConfig};

/// Print the top holders by recorded balance. Requires the sync backend to
/// be configured; balances are as of each holder's last session, not live
/// ledger reads.
pub async fn run_leaderboard(limit: u32, gates: GateConfig) -> Result<(), GiltError> {
    let sync = client::sync_from_env()?;
    let rows = sync.top_users(limit).await?;
    if rows.is_empty() {
        println!("no holders recorded yet");
        return Ok(());
    }
    print_rows(&rows, &gates);
    Ok(())
}

pub fn print_rows(rows: &[UserRow], gates: &GateConfig) {
    for (i, row) in rows.iter().enumerate() {
        println!("{}", format_row(i + 1, row, gates));
    }
}

/// One ranked line: position, tier label at the recorded balance, balance,
/// handle.
fn format_row(rank: usize, row: &UserRow, gates: &GateConfig) -> String {
    let tier = evaluate(row.token_balance, gates).tier;
    format!(
        "{:>3}  {:<7} {:>14.2}  @{}",
        rank,
        tier.label(),
        row.token_balance,
        row.username
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(username: &str, balance: f64) -> UserRow {
        UserRow {
            fid: 7,
            username: username.into(),
            display_name: None,
            pfp_url: None,
            wallet_address: None,
            token_balance: balance,
            updated_at: None,
        }
    }

    #[test]
    fn test_format_row_king() {
        let line = format_row(1, &row("whale", 2_500_000.0), &GateConfig::default());
        assert_eq!(line, "  1  king        2500000.00  @whale");
    }

    #[test]
    fn test_format_row_without_tier() {
        let line = format_row(12, &row("newcomer", 0.0), &GateConfig::default());
        assert_eq!(line, " 12  -                 0.00  @newcomer");
    }
}
