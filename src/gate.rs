//! Balance-gated entitlements.
//!
//! A single pure function maps a token balance to the full set of unlocked
//! capabilities. Every threshold is an independent knob: the royal gate sits
//! below the golden-cast gate on the default ladder, and nothing here assumes
//! any ordering between them. All comparisons are inclusive, so holding
//! exactly the threshold unlocks the gate.

use serde::Serialize;

/// Default display-unit thresholds.
pub const DEFAULT_CAST_GATE: f64 = 100_000.0;
pub const DEFAULT_GOLDEN_CAST_GATE: f64 = 1_000_000.0;
pub const DEFAULT_ROYAL_GATE: f64 = 500_000.0;
pub const DEFAULT_KNIGHT_TIER: f64 = 1.0;
pub const DEFAULT_KING_TIER: f64 = 1_000_000.0;

/// Threshold configuration, in display units of the token.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Minimum balance to publish a cast.
    pub cast_gate: f64,
    /// Minimum balance to publish a golden cast.
    pub golden_cast_gate: f64,
    /// Minimum balance for royal standing.
    pub royal_gate: f64,
    /// Minimum balance for the knight tier label.
    pub knight_tier: f64,
    /// Minimum balance for the king tier label.
    pub king_tier: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            cast_gate: DEFAULT_CAST_GATE,
            golden_cast_gate: DEFAULT_GOLDEN_CAST_GATE,
            royal_gate: DEFAULT_ROYAL_GATE,
            knight_tier: DEFAULT_KNIGHT_TIER,
            king_tier: DEFAULT_KING_TIER,
        }
    }
}

/// Holder tier label. Ordered: `None < Knight < King`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    None,
    Knight,
    King,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Tier::None => "-",
            Tier::Knight => "knight",
            Tier::King => "king",
        }
    }
}

/// The set of capabilities a balance unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EntitlementSet {
    pub can_cast: bool,
    pub can_golden_cast: bool,
    pub is_royal: bool,
    pub tier: Tier,
}

/// Evaluate the entitlements for a balance.
///
/// Total over all `f64` inputs: negative and non-finite balances count as
/// zero, so a failed or garbage balance read can never unlock anything.
pub fn evaluate(balance: f64, gates: &GateConfig) -> EntitlementSet {
    let balance = sanitize(balance);
    let tier = if balance >= gates.king_tier {
        Tier::King
    } else if balance >= gates.knight_tier {
        Tier::Knight
    } else {
        Tier::None
    };
    EntitlementSet {
        can_cast: balance >= gates.cast_gate,
        can_golden_cast: balance >= gates.golden_cast_gate,
        is_royal: balance >= gates.royal_gate,
        tier,
    }
}

/// How much more balance a gate needs. Zero when already unlocked.
pub fn shortfall(threshold: f64, balance: f64) -> f64 {
    (threshold - sanitize(balance)).max(0.0)
}

fn sanitize(balance: f64) -> f64 {
    if balance.is_finite() && balance > 0.0 {
        balance
    } else {
        0.0
    }
}
