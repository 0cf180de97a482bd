pub mod config;
pub mod error;
pub mod handshake;
pub mod ledger;
pub mod price;
pub mod rest;
pub mod sync;
pub mod types;

// ---- Top-level re-exports for ergonomic usage ----

// Configuration + errors
pub use config::{HubConfig, LedgerConfig, PriceConfig, ProviderConfig, SyncConfig};
pub use error::{CastgateError, Result};

// Clients
pub use ledger::{LedgerClient, TokenBalance};
pub use price::PriceClient;
pub use rest::HubClient;
pub use sync::SyncClient;

// Sign-in handshake
pub use handshake::{
    AuthSurface, HandshakeState, PendingSignIn, SignInFlow, SignInOutcome, SurfaceMessage,
    LIVENESS_INTERVAL,
};

// Identity + social types
pub use types::{Cast, CastEmbed, CastRef, FeedPage, Profile, ProviderUser, ReactionKind};

// Wallet + pricing + sync rows
pub use types::{Address, GoldenCast, TokenPrice, UserRow};
