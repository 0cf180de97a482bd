//! Integration tests for the sign-in handshake using scripted surfaces.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use castgate::{
    AuthSurface, CastgateError, HandshakeState, ProviderConfig, SignInFlow, SignInOutcome,
    SurfaceMessage,
};

/// A surface driven entirely by the test: records the opened URL and exposes
/// its open/closed state through shared flags.
struct ScriptedSurface {
    fail_open: bool,
    open_called: Arc<AtomicBool>,
    is_open: Arc<AtomicBool>,
    seen_url: Arc<Mutex<Option<String>>>,
}

impl ScriptedSurface {
    fn new() -> (Self, Arc<AtomicBool>, Arc<AtomicBool>, Arc<Mutex<Option<String>>>) {
        let open_called = Arc::new(AtomicBool::new(false));
        let is_open = Arc::new(AtomicBool::new(false));
        let seen_url = Arc::new(Mutex::new(None));
        let surface = Self {
            fail_open: false,
            open_called: Arc::clone(&open_called),
            is_open: Arc::clone(&is_open),
            seen_url: Arc::clone(&seen_url),
        };
        (surface, open_called, is_open, seen_url)
    }
}

impl AuthSurface for ScriptedSurface {
    fn open(&mut self, url: &Url) -> castgate::Result<()> {
        self.open_called.store(true, Ordering::SeqCst);
        if self.fail_open {
            return Err(CastgateError::SurfaceOpen("popup blocked".into()));
        }
        *self.seen_url.lock().unwrap() = Some(url.to_string());
        self.is_open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.is_open.load(Ordering::SeqCst)
    }

    fn close(&mut self) {
        self.is_open.store(false, Ordering::SeqCst);
    }
}

fn flow() -> SignInFlow {
    SignInFlow::new(ProviderConfig {
        auth_url: "https://auth.example/login".into(),
        client_id: "client-123".into(),
        app_origin: "http://127.0.0.1:9311".into(),
        allowed_origins: vec![
            "https://auth.example".into(),
            "http://127.0.0.1:9311".into(),
        ],
    })
}

fn valid_message() -> SurfaceMessage {
    SurfaceMessage {
        origin: "https://auth.example".into(),
        payload: json!({
            "is_authenticated": true,
            "user": { "fid": 3621, "username": "goldsmith" }
        }),
    }
}

#[tokio::test(start_paused = true)]
async fn test_valid_message_completes_and_closes_surface() {
    let (surface, _, is_open, seen_url) = ScriptedSurface::new();
    let (tx, rx) = mpsc::channel(8);

    let pending = flow().begin(Box::new(surface), rx, CancellationToken::new()).unwrap();
    assert_eq!(pending.state(), HandshakeState::Pending);

    tx.send(valid_message()).await.unwrap();
    let outcome = pending.wait().await.unwrap();

    match outcome {
        SignInOutcome::Completed(profile) => {
            assert_eq!(profile.fid, 3621);
            assert_eq!(profile.username, "goldsmith");
        }
        SignInOutcome::Dismissed => panic!("expected completion"),
    }
    assert!(!is_open.load(Ordering::SeqCst), "surface should be closed");

    let url = seen_url.lock().unwrap().clone().unwrap();
    assert!(url.contains("client_id=client-123"), "url: {url}");
    assert!(url.contains("redirect_origin="), "url: {url}");
    assert!(url.contains("state="), "url: {url}");
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_messages_yield_single_identity() {
    let (surface, _, _, _) = ScriptedSurface::new();
    let (tx, rx) = mpsc::channel(8);

    let pending = flow().begin(Box::new(surface), rx, CancellationToken::new()).unwrap();
    tx.send(valid_message()).await.unwrap();
    tx.send(valid_message()).await.unwrap();

    let outcome = pending.wait().await.unwrap();
    assert!(matches!(outcome, SignInOutcome::Completed(_)));

    // The attempt stopped listening after the first resolution: the channel
    // has no receiver any more, so a third message has nowhere to go.
    assert!(tx.send(valid_message()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_unlisted_origin_never_resolves() {
    let (surface, _, is_open, _) = ScriptedSurface::new();
    let (tx, rx) = mpsc::channel(8);

    let pending = flow().begin(Box::new(surface), rx, CancellationToken::new()).unwrap();
    tx.send(SurfaceMessage {
        origin: "https://evil.example".into(),
        payload: json!({
            "is_authenticated": true,
            "user": { "fid": 666, "username": "impostor" }
        }),
    })
    .await
    .unwrap();

    // Give the attempt time to screen (and discard) the message.
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
    assert_eq!(pending.state(), HandshakeState::Pending);

    // The user eventually gives up and closes the window.
    is_open.store(false, Ordering::SeqCst);
    let outcome = pending.wait().await.unwrap();
    assert!(matches!(outcome, SignInOutcome::Dismissed));
}

#[tokio::test(start_paused = true)]
async fn test_surface_closed_after_delay_dismisses() {
    let (surface, _, is_open, _) = ScriptedSurface::new();
    let (_tx, rx) = mpsc::channel::<SurfaceMessage>(8);

    let pending = flow().begin(Box::new(surface), rx, CancellationToken::new()).unwrap();

    // Three seconds of nothing, then the user closes the window.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(pending.state(), HandshakeState::Pending);
    is_open.store(false, Ordering::SeqCst);

    let outcome = pending.wait().await.unwrap();
    assert!(matches!(outcome, SignInOutcome::Dismissed));
}

#[tokio::test]
async fn test_missing_client_id_aborts_before_opening() {
    let (surface, open_called, _, _) = ScriptedSurface::new();
    let (_tx, rx) = mpsc::channel(8);

    // Whitespace-only counts as unset.
    let config = ProviderConfig {
        auth_url: "https://auth.example/login".into(),
        client_id: "  ".into(),
        app_origin: "http://127.0.0.1:9311".into(),
        allowed_origins: vec!["https://auth.example".into()],
    };

    let err = SignInFlow::new(config)
        .begin(Box::new(surface), rx, CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, CastgateError::Config(_)));
    assert!(!open_called.load(Ordering::SeqCst), "nothing may be opened");
}

#[tokio::test]
async fn test_blocked_surface_propagates_error() {
    let (mut surface, _, _, _) = ScriptedSurface::new();
    surface.fail_open = true;
    let (_tx, rx) = mpsc::channel(8);

    let err = flow().begin(Box::new(surface), rx, CancellationToken::new()).unwrap_err();
    assert!(matches!(err, CastgateError::SurfaceOpen(_)));
}

#[tokio::test(start_paused = true)]
async fn test_malformed_message_is_skipped_then_valid_resolves() {
    let (surface, _, _, _) = ScriptedSurface::new();
    let (tx, rx) = mpsc::channel(8);

    let pending = flow().begin(Box::new(surface), rx, CancellationToken::new()).unwrap();
    tx.send(SurfaceMessage {
        origin: "https://auth.example".into(),
        payload: json!({ "totally": "unrelated" }),
    })
    .await
    .unwrap();
    tx.send(valid_message()).await.unwrap();

    let outcome = pending.wait().await.unwrap();
    assert!(matches!(outcome, SignInOutcome::Completed(_)));
}

#[tokio::test(start_paused = true)]
async fn test_abort_dismisses_and_closes_surface() {
    let (surface, _, is_open, _) = ScriptedSurface::new();
    let (_tx, rx) = mpsc::channel::<SurfaceMessage>(8);

    let pending = flow().begin(Box::new(surface), rx, CancellationToken::new()).unwrap();
    pending.abort();

    let outcome = pending.wait().await.unwrap();
    assert!(matches!(outcome, SignInOutcome::Dismissed));
    assert!(!is_open.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_unauthenticated_payload_does_not_resolve() {
    let (surface, _, is_open, _) = ScriptedSurface::new();
    let (tx, rx) = mpsc::channel(8);

    let pending = flow().begin(Box::new(surface), rx, CancellationToken::new()).unwrap();
    tx.send(SurfaceMessage {
        origin: "https://auth.example".into(),
        payload: json!({ "is_authenticated": false, "user": { "fid": 1, "username": "nope" } }),
    })
    .await
    .unwrap();

    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
    assert_eq!(pending.state(), HandshakeState::Pending);

    is_open.store(false, Ordering::SeqCst);
    assert!(matches!(
        pending.wait().await.unwrap(),
        SignInOutcome::Dismissed
    ));
}
