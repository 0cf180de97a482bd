//! Ledger balance lookups: the `balance` command.

use castgate::Address;
use serde::Serialize;
use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::client;
use crate::error::GiltError;
use crate::gate::{evaluate, shortfall, EntitlementSet, GateConfig, Tier};

/// One machine-readable line in `--json` mode.
#[derive(Serialize)]
struct HoldingsLine<'a> {
    address: &'a str,
    raw: u128,
    units: f64,
    can_cast: bool,
    can_golden_cast: bool,
    is_royal: bool,
    tier: Tier,
}

/// Read a wallet's balance and entitlements once, or on an interval with
/// `watch`. Malformed addresses are rejected before touching the network.
pub async fn run_balance(
    address: &str,
    gates: GateConfig,
    watch: bool,
    json: bool,
    interval_ms: u64,
    cancel: CancellationToken,
) -> Result<(), GiltError> {
    let address = Address::parse(address)?;
    let ledger = client::ledger_from_env().await?;

    let mut ticker = time::interval(Duration::from_millis(interval_ms));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match ledger.balance_of(&address).await {
                    Ok(balance) => {
                        let set = evaluate(balance.units, &gates);
                        if json {
                            print_json(&address, balance.raw, balance.units, &set);
                        } else if watch {
                            println!("{}", holdings_line(&address, balance.units, &set));
                        } else {
                            print_block(&address, balance.raw, balance.units, &set, &gates);
                        }
                    }
                    Err(e) => {
                        if !watch {
                            return Err(e.into());
                        }
                        warn!(error = %e, "balance read failed, will retry");
                    }
                }
                if !watch {
                    return Ok(());
                }
            }
            _ = cancel.cancelled() => return Ok(()),
        }
    }
}

fn print_json(address: &Address, raw: u128, units: f64, set: &EntitlementSet) {
    let address = address.to_string();
    let line = HoldingsLine {
        address: &address,
        raw,
        units,
        can_cast: set.can_cast,
        can_golden_cast: set.can_golden_cast,
        is_royal: set.is_royal,
        tier: set.tier,
    };
    match serde_json::to_string(&line) {
        Ok(s) => println!("{s}"),
        Err(e) => warn!(error = %e, "json encode failed"),
    }
}

fn print_block(address: &Address, raw: u128, units: f64, set: &EntitlementSet, gates: &GateConfig) {
    println!("address   {address}");
    println!("balance   {units} GILT (raw {raw})");
    println!(
        "gates     cast:{} golden:{} royal:{} tier:{}",
        set.can_cast,
        set.can_golden_cast,
        set.is_royal,
        set.tier.label()
    );
    if !set.can_cast {
        println!(
            "locked    cast needs {:.0} more",
            shortfall(gates.cast_gate, units)
        );
    }
    if !set.can_golden_cast {
        println!(
            "locked    golden needs {:.0} more",
            shortfall(gates.golden_cast_gate, units)
        );
    }
}

/// Compact single line for watch mode.
fn holdings_line(address: &Address, units: f64, set: &EntitlementSet) -> String {
    format!(
        "{address}  {units:.4} GILT  cast:{} golden:{} royal:{} tier:{}",
        set.can_cast,
        set.can_golden_cast,
        set.is_royal,
        set.tier.label()
    )
}
