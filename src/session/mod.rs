//! Session state: the single source of truth for who is signed in, which
//! wallet is linked, the last observed balance, and what it unlocks.

pub mod store;

use castgate::{Address, Profile, TokenBalance, TokenPrice};

use crate::gate::EntitlementSet;

/// Lifecycle phase derived from the identity/wallet pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No identity.
    Anonymous,
    /// Signed in, no wallet linked; every gate stays locked.
    AuthenticatedUnlinked,
    /// Signed in with a linked wallet; balance polling is live.
    AuthenticatedLinked,
}

impl SessionPhase {
    pub fn label(&self) -> &'static str {
        match self {
            SessionPhase::Anonymous => "anonymous",
            SessionPhase::AuthenticatedUnlinked => "authenticated (no wallet)",
            SessionPhase::AuthenticatedLinked => "authenticated",
        }
    }
}

/// Client view selector. Survives sign-out with the rest of the UI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Home,
    Golden,
    Search,
    Leaderboard,
    Profile,
}

impl Tab {
    pub fn parse(name: &str) -> Option<Tab> {
        match name {
            "home" => Some(Tab::Home),
            "golden" => Some(Tab::Golden),
            "search" => Some(Tab::Search),
            "board" | "leaderboard" => Some(Tab::Leaderboard),
            "profile" => Some(Tab::Profile),
            _ => None,
        }
    }
}

/// Interface state carried alongside the session proper.
#[derive(Debug, Clone, Copy, Default)]
pub struct UiFlags {
    pub active_tab: Tab,
    pub panel_open: bool,
}

/// Last observed balance plus a staleness marker. `stale` is set when a
/// ledger read fails; the value itself is the last good observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceState {
    pub balance: TokenBalance,
    pub stale: bool,
}

/// The one session per running client.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub identity: Option<Profile>,
    pub wallet: Option<Address>,
    pub balance: BalanceState,
    pub entitlements: EntitlementSet,
    pub price: Option<TokenPrice>,
    pub ui: UiFlags,
}

impl Session {
    pub fn phase(&self) -> SessionPhase {
        match (&self.identity, &self.wallet) {
            (None, _) => SessionPhase::Anonymous,
            (Some(_), None) => SessionPhase::AuthenticatedUnlinked,
            (Some(_), Some(_)) => SessionPhase::AuthenticatedLinked,
        }
    }

    /// Capability token for publishing, when the provider granted one.
    pub fn signer(&self) -> Option<&str> {
        self.identity.as_ref()?.signer_uuid.as_deref()
    }
}
