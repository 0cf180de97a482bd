//! Cross-window sign-in handshake against the identity provider.
//!
//! The popup flow is modeled as an explicit async attempt with a single
//! resolution point. A surface (real browser window in production, scripted
//! in tests) emits raw messages; the first message from an allow-listed
//! origin carrying a valid authenticated payload resolves the attempt and
//! closes the surface. A fixed-interval liveness check detects the user
//! closing the surface and cancels the attempt instead. Each `begin` call
//! assigns at most one identity: the attempt task stops consuming messages
//! after resolution and the outcome channel is a oneshot.

use serde::Deserialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::config::ProviderConfig;
use crate::error::{CastgateError, Result};
use crate::types::{Profile, ProviderUser};

/// How often the attempt checks whether the surface is still open.
pub const LIVENESS_INTERVAL: Duration = Duration::from_millis(500);

/// A raw message delivered by an auth surface, tagged with the origin it
/// arrived from. The payload is untrusted until screened.
#[derive(Debug, Clone)]
pub struct SurfaceMessage {
    pub origin: String,
    pub payload: serde_json::Value,
}

/// An external sign-in surface: something that can show the provider page
/// and report whether the user still has it open.
pub trait AuthSurface: Send + 'static {
    /// Show the provider page. An error means the surface could not be
    /// opened at all (the popup-blocked case); nothing is spawned.
    fn open(&mut self, url: &Url) -> Result<()>;

    /// Whether the surface is still open.
    fn is_open(&self) -> bool;

    /// Close the surface if it is still open.
    fn close(&mut self);
}

/// Lifecycle of a sign-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakeState {
    /// No attempt in flight.
    #[default]
    Idle,
    /// Surface opened, waiting for a trusted message.
    Pending,
    /// A valid message arrived; an identity was delivered.
    Resolved,
    /// The surface was closed (or the attempt aborted) before completion.
    Cancelled,
}

/// How a sign-in attempt ended.
#[derive(Debug, Clone)]
pub enum SignInOutcome {
    /// The provider confirmed authentication; here is the identity.
    Completed(Profile),
    /// The user closed the surface (or the attempt was aborted) before any
    /// valid message arrived. Not an error.
    Dismissed,
}

/// Message payload shape expected from the provider.
#[derive(Debug, Deserialize)]
struct ProviderPayload {
    is_authenticated: bool,
    #[serde(default)]
    user: Option<ProviderUser>,
}

/// Factory for sign-in attempts against a configured provider.
#[derive(Debug, Clone)]
pub struct SignInFlow {
    config: ProviderConfig,
}

impl SignInFlow {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    /// Start a sign-in attempt: validate configuration, open the surface at
    /// the provider URL, and spawn the pending attempt. Returns immediately
    /// with a [`PendingSignIn`] handle. Cancelling `cancel` (or calling
    /// [`PendingSignIn::abort`]) dismisses the attempt.
    ///
    /// # Errors
    ///
    /// `CastgateError::Config` when the client id is missing (nothing is
    /// opened), or the surface's own error when it cannot open (popup
    /// blocked). In both cases no task is spawned and no state changes.
    pub fn begin(
        &self,
        mut surface: Box<dyn AuthSurface>,
        mut messages: mpsc::Receiver<SurfaceMessage>,
        cancel: CancellationToken,
    ) -> Result<PendingSignIn> {
        if self.config.client_id.trim().is_empty() {
            return Err(CastgateError::Config(
                "provider client id is not set".into(),
            ));
        }
        let url = self.auth_url()?;
        surface.open(&url)?;

        let (state_tx, state_rx) = watch::channel(HandshakeState::Pending);
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let task_cancel = cancel.clone();
        let allowed = self.config.allowed_origins.clone();

        tokio::spawn(async move {
            let outcome = attempt(surface.as_mut(), &mut messages, &allowed, &task_cancel).await;
            match &outcome {
                SignInOutcome::Completed(profile) => {
                    let _ = state_tx.send(HandshakeState::Resolved);
                    info!(
                        fid = profile.fid,
                        username = %profile.username,
                        "sign-in completed"
                    );
                }
                SignInOutcome::Dismissed => {
                    let _ = state_tx.send(HandshakeState::Cancelled);
                    debug!("sign-in attempt dismissed");
                }
            }
            let _ = outcome_tx.send(outcome);
        });

        Ok(PendingSignIn {
            state: state_rx,
            outcome: outcome_rx,
            cancel,
        })
    }

    /// Provider URL with client id, callback origin, and a per-attempt nonce.
    fn auth_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.config.auth_url)?;
        let nonce: [u8; 16] = rand::random();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_origin", &self.config.app_origin)
            .append_pair("state", &hex::encode(nonce));
        Ok(url)
    }
}

/// Handle to an in-flight sign-in attempt.
#[derive(Debug)]
pub struct PendingSignIn {
    state: watch::Receiver<HandshakeState>,
    outcome: oneshot::Receiver<SignInOutcome>,
    cancel: CancellationToken,
}

impl PendingSignIn {
    /// Current attempt state.
    pub fn state(&self) -> HandshakeState {
        *self.state.borrow()
    }

    /// Abort the attempt (shutdown path). The outcome resolves to
    /// [`SignInOutcome::Dismissed`].
    pub fn abort(&self) {
        self.cancel.cancel();
    }

    /// Wait for the attempt to resolve. Consuming the handle makes "applied
    /// at most once" a property of the type: the outcome cannot be taken
    /// twice.
    pub async fn wait(self) -> Result<SignInOutcome> {
        self.outcome
            .await
            .map_err(|_| CastgateError::Validation("sign-in attempt task dropped".into()))
    }
}

/// The pending attempt: first trusted message wins, surface-closed cancels.
async fn attempt(
    surface: &mut dyn AuthSurface,
    messages: &mut mpsc::Receiver<SurfaceMessage>,
    allowed: &[String],
    cancel: &CancellationToken,
) -> SignInOutcome {
    let mut liveness = time::interval(LIVENESS_INTERVAL);
    liveness.tick().await; // consume immediate tick

    loop {
        tokio::select! {
            msg = messages.recv() => {
                match msg {
                    Some(msg) => {
                        if let Some(profile) = screen_message(&msg, allowed) {
                            surface.close();
                            return SignInOutcome::Completed(profile);
                        }
                    }
                    // Surface hung up its channel without completing.
                    None => return SignInOutcome::Dismissed,
                }
            }
            _ = liveness.tick() => {
                if !surface.is_open() {
                    return SignInOutcome::Dismissed;
                }
            }
            _ = cancel.cancelled() => {
                surface.close();
                return SignInOutcome::Dismissed;
            }
        }
    }
}

/// Screen one message: origin allow-list first, then payload shape. Anything
/// untrusted or malformed is discarded with a `debug!` trace and no other
/// effect.
fn screen_message(msg: &SurfaceMessage, allowed: &[String]) -> Option<Profile> {
    if !allowed.iter().any(|origin| origin == &msg.origin) {
        debug!(origin = %msg.origin, "discarding message from unlisted origin");
        return None;
    }
    let payload: ProviderPayload = match serde_json::from_value(msg.payload.clone()) {
        Ok(p) => p,
        Err(e) => {
            debug!(error = %e, "discarding malformed sign-in message");
            return None;
        }
    };
    if !payload.is_authenticated {
        debug!("discarding unauthenticated sign-in message");
        return None;
    }
    let Some(user) = payload.user else {
        debug!("discarding sign-in message without a user");
        return None;
    };
    Some(Profile::from(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn allowed() -> Vec<String> {
        vec![
            "https://app.neynar.com".to_string(),
            "http://127.0.0.1:9311".to_string(),
        ]
    }

    fn valid_payload() -> serde_json::Value {
        json!({
            "is_authenticated": true,
            "user": {
                "fid": 3621,
                "username": "goldsmith",
                "display_name": "The Goldsmith",
                "custody_address": "0x6117de9f5f889dac0561c70f3bcaf055c0b6914d"
            }
        })
    }

    #[test]
    fn test_screen_accepts_trusted_valid_message() {
        let msg = SurfaceMessage {
            origin: "https://app.neynar.com".into(),
            payload: valid_payload(),
        };
        let profile = screen_message(&msg, &allowed()).unwrap();
        assert_eq!(profile.fid, 3621);
        assert_eq!(profile.username, "goldsmith");
    }

    #[test]
    fn test_screen_rejects_unlisted_origin_with_valid_payload() {
        let msg = SurfaceMessage {
            origin: "https://evil.example".into(),
            payload: valid_payload(),
        };
        assert!(screen_message(&msg, &allowed()).is_none());
    }

    #[test]
    fn test_screen_rejects_unauthenticated_flag() {
        let msg = SurfaceMessage {
            origin: "https://app.neynar.com".into(),
            payload: json!({ "is_authenticated": false, "user": { "fid": 1, "username": "x" } }),
        };
        assert!(screen_message(&msg, &allowed()).is_none());
    }

    #[test]
    fn test_screen_rejects_missing_user() {
        let msg = SurfaceMessage {
            origin: "https://app.neynar.com".into(),
            payload: json!({ "is_authenticated": true }),
        };
        assert!(screen_message(&msg, &allowed()).is_none());
    }

    #[test]
    fn test_screen_rejects_user_without_handle() {
        let msg = SurfaceMessage {
            origin: "https://app.neynar.com".into(),
            payload: json!({ "is_authenticated": true, "user": { "fid": 7 } }),
        };
        assert!(screen_message(&msg, &allowed()).is_none());
    }

    #[test]
    fn test_screen_rejects_non_object_payload() {
        let msg = SurfaceMessage {
            origin: "https://app.neynar.com".into(),
            payload: json!("definitely-not-a-sign-in"),
        };
        assert!(screen_message(&msg, &allowed()).is_none());
    }

    #[test]
    fn test_screen_flattens_nested_bio() {
        let msg = SurfaceMessage {
            origin: "http://127.0.0.1:9311".into(),
            payload: json!({
                "is_authenticated": true,
                "user": {
                    "fid": 9,
                    "username": "herald",
                    "profile": { "bio": { "text": "announcements only" } }
                }
            }),
        };
        let profile = screen_message(&msg, &allowed()).unwrap();
        assert_eq!(profile.bio.as_deref(), Some("announcements only"));
    }
}
