//! The session store.
//!
//! Every mutation goes through a named method here and runs inside
//! `watch::Sender::send_modify`, so a balance write and its entitlement
//! recomputation land in one publish. Readers can never observe a
//! balance/entitlement pair that disagrees, and subscribers wake exactly
//! once per mutation.

use castgate::{Address, Profile, TokenBalance, TokenPrice};
use tokio::sync::watch;
use tracing::debug;

use super::{BalanceState, Session, SessionPhase, Tab};
use crate::gate::{evaluate, GateConfig};

pub struct SessionStore {
    tx: watch::Sender<Session>,
    gates: GateConfig,
}

impl SessionStore {
    pub fn new(gates: GateConfig) -> Self {
        let initial = Session {
            entitlements: evaluate(0.0, &gates),
            ..Session::default()
        };
        let (tx, _) = watch::channel(initial);
        Self { tx, gates }
    }

    /// Clone of the current session.
    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        self.tx.borrow().phase()
    }

    pub fn gates(&self) -> &GateConfig {
        &self.gates
    }

    /// Install an identity. Replaces any previous one wholesale.
    pub fn set_identity(&self, profile: Profile) {
        self.tx.send_modify(|s| {
            s.identity = Some(profile);
        });
    }

    /// Link, change, or drop the wallet. Refused while anonymous: a wallet
    /// can never be linked without an identity. Changing the address zeroes
    /// the balance so the old wallet's holdings stop gating actions the
    /// moment the link moves. Returns whether the change was applied.
    pub fn set_wallet(&self, wallet: Option<Address>) -> bool {
        let mut applied = false;
        self.tx.send_modify(|s| {
            if s.identity.is_none() && wallet.is_some() {
                return;
            }
            applied = true;
            if s.wallet == wallet {
                return;
            }
            s.wallet = wallet;
            s.balance = BalanceState::default();
            s.entitlements = evaluate(0.0, &self.gates);
        });
        if !applied {
            debug!("wallet link ignored for anonymous session");
        }
        applied
    }

    /// Apply a balance observation if it is still for the linked wallet.
    /// Reads that resolve after the wallet changed (or the session ended)
    /// are discarded. Returns whether the observation was applied.
    pub fn record_balance(&self, address: &Address, balance: TokenBalance) -> bool {
        let mut applied = false;
        self.tx.send_modify(|s| {
            if s.wallet.as_ref() != Some(address) {
                return;
            }
            s.balance = BalanceState {
                balance,
                stale: false,
            };
            s.entitlements = evaluate(balance.units, &self.gates);
            applied = true;
        });
        if !applied {
            debug!(address = %address, "discarding balance for superseded wallet");
        }
        applied
    }

    /// Note a failed read for the linked wallet: the last good value stays
    /// in place, marked stale. Entitlements keep gating on that value.
    pub fn mark_balance_stale(&self, address: &Address) {
        self.tx.send_modify(|s| {
            if s.wallet.as_ref() != Some(address) {
                return;
            }
            s.balance.stale = true;
        });
    }

    /// Sign out. Identity, wallet, balance, and entitlements reset in one
    /// publish; UI flags and the token price survive.
    pub fn clear(&self) {
        self.tx.send_modify(|s| {
            s.identity = None;
            s.wallet = None;
            s.balance = BalanceState::default();
            s.entitlements = evaluate(0.0, &self.gates);
        });
    }

    pub fn set_price(&self, price: TokenPrice) {
        self.tx.send_modify(|s| {
            s.price = Some(price);
        });
    }

    pub fn set_active_tab(&self, tab: Tab) {
        self.tx.send_modify(|s| {
            s.ui.active_tab = tab;
        });
    }

    pub fn set_panel_open(&self, open: bool) {
        self.tx.send_modify(|s| {
            s.ui.panel_open = open;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use castgate::Profile;

    fn store() -> SessionStore {
        SessionStore::new(GateConfig::default())
    }

    fn profile() -> Profile {
        Profile {
            fid: 3621,
            username: "goldsmith".into(),
            display_name: Some("The Goldsmith".into()),
            pfp_url: None,
            bio: None,
            follower_count: 12,
            following_count: 3,
            verifications: vec![],
            custody_address: None,
            signer_uuid: Some("c0ffee".into()),
        }
    }

    fn addr_a() -> Address {
        Address::parse("0x00000000000000000000000000000000000000aa").unwrap()
    }

    fn addr_b() -> Address {
        Address::parse("0x00000000000000000000000000000000000000bb").unwrap()
    }

    fn balance(units: f64) -> TokenBalance {
        TokenBalance {
            raw: (units * 1e18) as u128,
            units,
        }
    }

    // ---- lifecycle ----

    #[test]
    fn test_phase_transitions() {
        let store = store();
        assert_eq!(store.phase(), SessionPhase::Anonymous);

        store.set_identity(profile());
        assert_eq!(store.phase(), SessionPhase::AuthenticatedUnlinked);

        assert!(store.set_wallet(Some(addr_a())));
        assert_eq!(store.phase(), SessionPhase::AuthenticatedLinked);

        store.clear();
        assert_eq!(store.phase(), SessionPhase::Anonymous);
    }

    #[test]
    fn test_wallet_link_requires_identity() {
        let store = store();
        assert!(!store.set_wallet(Some(addr_a())));
        assert_eq!(store.snapshot().wallet, None);
    }

    #[test]
    fn test_clear_resets_session_but_keeps_ui_flags() {
        let store = store();
        store.set_identity(profile());
        store.set_wallet(Some(addr_a()));
        store.record_balance(&addr_a(), balance(150_000.0));
        store.set_active_tab(Tab::Golden);
        store.set_panel_open(true);

        store.clear();

        let s = store.snapshot();
        assert!(s.identity.is_none());
        assert!(s.wallet.is_none());
        assert_eq!(s.balance.balance, TokenBalance::ZERO);
        assert!(!s.entitlements.can_cast);
        assert_eq!(s.ui.active_tab, Tab::Golden);
        assert!(s.ui.panel_open);
    }

    // ---- balance + entitlements ----

    #[test]
    fn test_balance_and_entitlements_update_together() {
        let store = store();
        store.set_identity(profile());
        store.set_wallet(Some(addr_a()));

        assert!(store.record_balance(&addr_a(), balance(150_000.0)));
        let s = store.snapshot();
        assert_eq!(s.balance.balance.units, 150_000.0);
        assert!(!s.balance.stale);
        assert!(s.entitlements.can_cast);
        assert!(!s.entitlements.is_royal);
    }

    #[test]
    fn test_wallet_change_zeroes_balance() {
        let store = store();
        store.set_identity(profile());
        store.set_wallet(Some(addr_a()));
        store.record_balance(&addr_a(), balance(600_000.0));
        assert!(store.snapshot().entitlements.is_royal);

        store.set_wallet(Some(addr_b()));
        let s = store.snapshot();
        assert_eq!(s.balance.balance, TokenBalance::ZERO);
        assert!(!s.entitlements.can_cast);
        assert!(!s.entitlements.is_royal);
    }

    #[test]
    fn test_relink_same_wallet_keeps_balance() {
        let store = store();
        store.set_identity(profile());
        store.set_wallet(Some(addr_a()));
        store.record_balance(&addr_a(), balance(150_000.0));

        assert!(store.set_wallet(Some(addr_a())));
        assert_eq!(store.snapshot().balance.balance.units, 150_000.0);
    }

    #[test]
    fn test_stale_poll_for_old_wallet_is_discarded() {
        let store = store();
        store.set_identity(profile());
        store.set_wallet(Some(addr_a()));
        store.set_wallet(Some(addr_b()));

        // A read captured for the old wallet resolves late.
        assert!(!store.record_balance(&addr_a(), balance(150_000.0)));
        let s = store.snapshot();
        assert_eq!(s.balance.balance, TokenBalance::ZERO);
        assert!(!s.entitlements.can_cast);
    }

    #[test]
    fn test_poll_after_sign_out_is_discarded() {
        let store = store();
        store.set_identity(profile());
        store.set_wallet(Some(addr_a()));
        store.clear();

        assert!(!store.record_balance(&addr_a(), balance(150_000.0)));
        assert!(!store.snapshot().entitlements.can_cast);
    }

    #[test]
    fn test_failed_read_keeps_value_and_marks_stale() {
        let store = store();
        store.set_identity(profile());
        store.set_wallet(Some(addr_a()));
        store.record_balance(&addr_a(), balance(150_000.0));

        store.mark_balance_stale(&addr_a());
        let s = store.snapshot();
        assert!(s.balance.stale);
        assert_eq!(s.balance.balance.units, 150_000.0);
        assert!(s.entitlements.can_cast, "entitlements gate on last good value");

        // A later successful read clears the marker.
        store.record_balance(&addr_a(), balance(150_001.0));
        assert!(!store.snapshot().balance.stale);
    }

    #[test]
    fn test_unlink_drops_balance() {
        let store = store();
        store.set_identity(profile());
        store.set_wallet(Some(addr_a()));
        store.record_balance(&addr_a(), balance(150_000.0));

        assert!(store.set_wallet(None));
        assert_eq!(store.phase(), SessionPhase::AuthenticatedUnlinked);
        assert_eq!(store.snapshot().balance.balance, TokenBalance::ZERO);
    }

    // ---- watch semantics ----

    #[test]
    fn test_subscribers_see_consistent_snapshots() {
        let store = store();
        let rx = store.subscribe();
        store.set_identity(profile());
        store.set_wallet(Some(addr_a()));
        store.record_balance(&addr_a(), balance(1_000_000.0));

        let s = rx.borrow();
        assert_eq!(s.balance.balance.units, 1_000_000.0);
        assert!(s.entitlements.can_golden_cast);
        assert_eq!(s.entitlements.tier, crate::gate::Tier::King);
    }

    #[test]
    fn test_signer_comes_from_identity() {
        let store = store();
        assert!(store.snapshot().signer().is_none());
        store.set_identity(profile());
        assert_eq!(store.snapshot().signer(), Some("c0ffee"));
    }
}
