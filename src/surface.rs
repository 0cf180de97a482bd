//! The sign-in surface for a terminal client: the system browser plus a
//! loopback callback listener.
//!
//! Opening the surface binds a listener on the loopback interface and
//! launches the user's browser at the provider URL. The provider's
//! completion page delivers the sign-in payload back to the listener,
//! either as a cross-origin POST (tagged with the request's Origin header)
//! or as a top-level redirect with the payload in the query string (tagged
//! with the app's own origin). Both land as surface messages; all trust
//! decisions stay in the handshake's origin screen.
//!
//! "Open" here means the listener is alive. A user closing the browser tab
//! is not observable from this side, so a silently abandoned attempt stays
//! pending until it is aborted or the client shuts down.

use std::net::TcpListener as StdTcpListener;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::Html;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};
use url::Url;

use castgate::{AuthSurface, CastgateError, SurfaceMessage};

const LANDING_PAGE: &str = "<!doctype html>\
<html><head><title>gilt</title></head>\
<body><p>Sign-in received. You can close this window and return to the terminal.</p></body></html>";

pub struct BrowserSurface {
    port: u16,
    app_origin: String,
    messages: mpsc::Sender<SurfaceMessage>,
    shutdown: CancellationToken,
    opened: bool,
}

impl BrowserSurface {
    /// Create the surface and the message channel the handshake consumes.
    /// `port` must match the port baked into `app_origin`.
    pub fn create(port: u16, app_origin: String) -> (Self, mpsc::Receiver<SurfaceMessage>) {
        let (tx, rx) = mpsc::channel(8);
        let surface = Self {
            port,
            app_origin,
            messages: tx,
            shutdown: CancellationToken::new(),
            opened: false,
        };
        (surface, rx)
    }
}

impl AuthSurface for BrowserSurface {
    fn open(&mut self, url: &Url) -> castgate::Result<()> {
        // Bind synchronously so a taken port surfaces as an open failure
        // before anything is launched.
        let std_listener = StdTcpListener::bind(("127.0.0.1", self.port)).map_err(|e| {
            CastgateError::SurfaceOpen(format!("cannot bind callback port {}: {e}", self.port))
        })?;
        std_listener
            .set_nonblocking(true)
            .map_err(|e| CastgateError::SurfaceOpen(format!("callback listener: {e}")))?;
        let listener = tokio::net::TcpListener::from_std(std_listener)
            .map_err(|e| CastgateError::SurfaceOpen(format!("callback listener: {e}")))?;

        let state = CallbackState {
            messages: self.messages.clone(),
            app_origin: self.app_origin.clone(),
        };
        // Permissive CORS only lets the provider page deliver the message;
        // the handshake's allow-list decides whether to trust it.
        let router = Router::new()
            .route("/callback", post(receive_post).get(receive_redirect))
            .layer(CorsLayer::permissive())
            .with_state(state);
        let shutdown = self.shutdown.clone();
        let server = axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await });
        tokio::spawn(async move {
            if let Err(e) = server.await {
                debug!(error = %e, "callback listener terminated");
            }
        });

        if let Err(e) = open::that_detached(url.as_str()) {
            self.shutdown.cancel();
            return Err(CastgateError::SurfaceOpen(format!(
                "cannot launch browser: {e}"
            )));
        }
        info!(%url, "opened provider sign-in page");
        self.opened = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.opened
    }

    fn close(&mut self) {
        self.opened = false;
        self.shutdown.cancel();
    }
}

impl Drop for BrowserSurface {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[derive(Clone)]
struct CallbackState {
    messages: mpsc::Sender<SurfaceMessage>,
    app_origin: String,
}

#[derive(Deserialize)]
struct RedirectQuery {
    payload: Option<String>,
}

/// POST /callback - completion payload pushed by the provider page. The
/// request's Origin header rides along for the handshake's origin screen.
async fn receive_post(
    State(state): State<CallbackState>,
    headers: HeaderMap,
    Json(payload): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    forward(&state.messages, SurfaceMessage { origin, payload });
    Json(serde_json::json!({ "ok": true }))
}

/// GET /callback - top-level redirect with the payload in the query string,
/// delivered under the app's own origin.
async fn receive_redirect(
    State(state): State<CallbackState>,
    Query(query): Query<RedirectQuery>,
) -> Html<&'static str> {
    if let Some(raw) = query.payload {
        match serde_json::from_str(&raw) {
            Ok(payload) => forward(
                &state.messages,
                SurfaceMessage {
                    origin: state.app_origin.clone(),
                    payload,
                },
            ),
            Err(e) => debug!(error = %e, "redirect payload is not json"),
        }
    }
    Html(LANDING_PAGE)
}

fn forward(messages: &mpsc::Sender<SurfaceMessage>, msg: SurfaceMessage) {
    if let Err(e) = messages.try_send(msg) {
        debug!(error = %e, "dropping surface message");
    }
}
