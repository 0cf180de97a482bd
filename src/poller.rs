//! Balance polling tied to the wallet-link lifetime.
//!
//! A single task watches the session for wallet changes. Linking a wallet
//! triggers an immediate ledger read, then a fixed cadence while the link
//! holds; unlinking idles the loop. Every observation goes through
//! [`SessionStore::record_balance`], which discards reads that no longer
//! match the linked wallet. A failed read keeps the previous value and
//! marks it stale.

use std::sync::Arc;

use castgate::{Address, LedgerClient};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::session::store::SessionStore;

pub fn spawn(
    store: Arc<SessionStore>,
    ledger: LedgerClient,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut session_rx = store.subscribe();
        let mut current: Option<Address> = session_rx.borrow().wallet;
        let mut ticker = time::interval(interval);
        ticker.tick().await; // consume the immediate tick

        if let Some(address) = current {
            poll_once(&store, &ledger, &address).await;
        }

        loop {
            tokio::select! {
                changed = session_rx.changed() => {
                    if changed.is_err() {
                        return; // store dropped, client is shutting down
                    }
                    let wallet = session_rx.borrow_and_update().wallet;
                    if wallet != current {
                        current = wallet;
                        if let Some(address) = current {
                            // Fresh link: read now, restart the cadence.
                            ticker.reset();
                            poll_once(&store, &ledger, &address).await;
                        }
                    }
                }
                _ = ticker.tick(), if current.is_some() => {
                    if let Some(address) = current {
                        poll_once(&store, &ledger, &address).await;
                    }
                }
                _ = cancel.cancelled() => {
                    debug!("balance polling stopped");
                    return;
                }
            }
        }
    })
}

/// One ledger read, applied through the store's wallet guard.
async fn poll_once(store: &SessionStore, ledger: &LedgerClient, address: &Address) {
    match ledger.balance_of(address).await {
        Ok(balance) => {
            if store.record_balance(address, balance) {
                debug!(address = %address, units = balance.units, "balance updated");
            }
        }
        Err(e) => {
            warn!(address = %address, error = %e, "balance read failed, keeping last value");
            store.mark_balance_stale(address);
        }
    }
}
