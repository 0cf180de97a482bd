//! The interactive session client.
//!
//! A single `tokio::select!` event loop over stdin commands, sign-in
//! outcomes, session changes, the price tick, and shutdown. All session
//! mutation goes through the store; this module only decides when to call
//! which method and what to print.

use std::sync::Arc;

use castgate::{Address, GoldenCast, ReactionKind, SignInOutcome, UserRow};
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{create_client, GiltClient};
use crate::error::GiltError;
use crate::feed::print_cast;
use crate::gate::{shortfall, GateConfig};
use crate::poller;
use crate::session::store::SessionStore;
use crate::session::{Session, SessionPhase, Tab};
use crate::surface::BrowserSurface;

/// Knobs for the interactive session client.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub callback_port: u16,
    pub poll_interval_ms: u64,
    pub price_interval_ms: u64,
    pub status_interval_ms: u64,
}

/// Top-level interactive client.
pub struct SessionClient {
    config: RunConfig,
    gates: GateConfig,
}

// ---------------------------------------------------------------------------
// Helpers (pure, testable)
// ---------------------------------------------------------------------------

/// One stdin line, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Empty,
    Help,
    Status,
    SignIn,
    SignOut,
    Link(String),
    Unlink,
    Cast(String),
    Golden(String),
    GoldenFeed,
    Like(String),
    Recast(String),
    Feed,
    Board,
    Tab(String),
    Panel,
    Quit,
    Unknown(String),
}

pub fn parse_line(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    match word {
        "help" | "?" => ReplCommand::Help,
        "status" | "s" => ReplCommand::Status,
        "in" | "signin" => ReplCommand::SignIn,
        "out" | "signout" => ReplCommand::SignOut,
        "link" => ReplCommand::Link(rest.to_string()),
        "unlink" => ReplCommand::Unlink,
        "cast" => ReplCommand::Cast(rest.to_string()),
        "golden" if rest.is_empty() => ReplCommand::GoldenFeed,
        "golden" => ReplCommand::Golden(rest.to_string()),
        "like" => ReplCommand::Like(rest.to_string()),
        "recast" => ReplCommand::Recast(rest.to_string()),
        "feed" => ReplCommand::Feed,
        "board" | "leaderboard" => ReplCommand::Board,
        "tab" => ReplCommand::Tab(rest.to_string()),
        "panel" => ReplCommand::Panel,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        other => ReplCommand::Unknown(other.to_string()),
    }
}

/// Text published to the hub for a golden cast.
pub fn golden_text(text: &str) -> String {
    format!("\u{1F451} [GOLDEN CAST] {}", text.trim())
}

/// The parts of a session the sync backend cares about. `None` while
/// anonymous; a change of any component warrants an upsert.
pub fn sync_fingerprint(session: &Session) -> Option<(u64, Option<Address>, u128)> {
    let identity = session.identity.as_ref()?;
    Some((identity.fid, session.wallet, session.balance.balance.raw))
}

/// Build the backend row for the current session, if signed in.
pub fn user_row(session: &Session) -> Option<UserRow> {
    let identity = session.identity.as_ref()?;
    Some(UserRow {
        fid: identity.fid,
        username: identity.username.clone(),
        display_name: identity.display_name.clone(),
        pfp_url: identity.pfp_url.clone(),
        wallet_address: session.wallet.map(|a| a.to_string()),
        token_balance: session.balance.balance.units,
        updated_at: Some(Utc::now()),
    })
}

impl SessionClient {
    pub fn new(config: RunConfig, gates: GateConfig) -> Self {
        Self { config, gates }
    }

    /// Run the client until `cancel` is triggered.
    ///
    /// 1. Builds the collaborator clients (hub, ledger, sync, price).
    /// 2. Starts balance polling bound to the session's wallet link.
    /// 3. Opens the first sign-in attempt in the browser.
    /// 4. Enters the command loop.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), GiltError> {
        info!("starting session client");

        let client = create_client(self.config.callback_port).await?;
        let store = Arc::new(SessionStore::new(self.gates.clone()));

        info!(
            token = %client.ledger.token(),
            decimals = client.ledger.decimals(),
            poll_interval_ms = self.config.poll_interval_ms,
            sync = client.sync.is_some(),
            "CONFIG"
        );

        // Balance polling runs for the whole client lifetime; it idles
        // while no wallet is linked.
        poller::spawn(
            Arc::clone(&store),
            client.ledger.clone(),
            Duration::from_millis(self.config.poll_interval_ms),
            cancel.child_token(),
        );

        // Sign-in outcomes arrive as events so the loop never blocks on a
        // pending attempt.
        let (auth_tx, mut auth_rx) = mpsc::channel::<SignInOutcome>(4);
        let mut attempt_cancel: Option<CancellationToken> = None;

        begin_sign_in(
            &client,
            &self.config,
            &auth_tx,
            &cancel,
            &mut attempt_cancel,
        )?;
        let mut signing_in = true;

        let mut session_rx = store.subscribe();
        let mut last_session = store.snapshot();
        let mut last_synced: Option<(u64, Option<Address>, u128)> = None;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        // The immediate tick fetches the first price right away.
        let mut price_interval =
            time::interval(Duration::from_millis(self.config.price_interval_ms));
        let mut status_interval =
            time::interval(Duration::from_millis(self.config.status_interval_ms));
        status_interval.tick().await;

        println!("type 'help' for commands");

        loop {
            tokio::select! {
                // Sign-in attempt resolved.
                Some(outcome) = auth_rx.recv() => {
                    signing_in = false;
                    attempt_cancel = None;
                    apply_sign_in(&store, outcome);
                }

                // One stdin command.
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            let keep_going = handle_command(
                                parse_line(&line),
                                &client,
                                &store,
                                &self.config,
                                &auth_tx,
                                &cancel,
                                &mut signing_in,
                                &mut attempt_cancel,
                            )
                            .await;
                            if !keep_going {
                                break;
                            }
                        }
                        Ok(None) => {
                            info!("stdin closed");
                            break;
                        }
                        Err(e) => {
                            warn!(error = %e, "stdin error");
                            break;
                        }
                    }
                }

                // Session changed: log transitions, maybe sync.
                changed = session_rx.changed() => {
                    if changed.is_err() {
                        continue;
                    }
                    let next = session_rx.borrow_and_update().clone();
                    log_transitions(&last_session, &next);

                    let fingerprint = sync_fingerprint(&next);
                    if fingerprint.is_some() && fingerprint != last_synced {
                        if let Some(row) = user_row(&next) {
                            spawn_user_sync(&client, row);
                        }
                        last_synced = fingerprint;
                    }
                    last_session = next;
                }

                // Periodic price refresh.
                _ = price_interval.tick() => {
                    match client.price.fetch_price().await {
                        Ok(price) => store.set_price(price),
                        Err(e) => debug!(error = %e, "price refresh failed, keeping last"),
                    }
                }

                // Periodic status log.
                _ = status_interval.tick() => {
                    log_status(&store.snapshot());
                }

                // Shutdown.
                _ = cancel.cancelled() => {
                    info!("shutting down");
                    break;
                }
            }
        }

        if let Some(token) = attempt_cancel.take() {
            token.cancel();
        }
        info!("session closed, goodbye");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sign-in plumbing
// ---------------------------------------------------------------------------

/// Open a fresh sign-in attempt and forward its outcome into `auth_tx`.
fn begin_sign_in(
    client: &GiltClient,
    config: &RunConfig,
    auth_tx: &mpsc::Sender<SignInOutcome>,
    cancel: &CancellationToken,
    attempt_cancel: &mut Option<CancellationToken>,
) -> Result<(), GiltError> {
    let (surface, messages) = BrowserSurface::create(config.callback_port, client.app_origin.clone());
    let token = cancel.child_token();
    let pending = client
        .flow
        .begin(Box::new(surface), messages, token.clone())?;
    *attempt_cancel = Some(token);

    let tx = auth_tx.clone();
    tokio::spawn(async move {
        match pending.wait().await {
            Ok(outcome) => {
                let _ = tx.send(outcome).await;
            }
            Err(e) => debug!(error = %e, "sign-in attempt dropped"),
        }
    });
    Ok(())
}

/// Install a completed sign-in into the store. The custody address from the
/// provider is the initial wallet link when it parses; otherwise the user
/// links one manually.
fn apply_sign_in(store: &SessionStore, outcome: SignInOutcome) {
    match outcome {
        SignInOutcome::Completed(profile) => {
            info!(fid = profile.fid, username = %profile.username, "signed in");
            let custody = profile.custody_address.clone();
            store.set_identity(profile);
            match custody {
                Some(raw) => match Address::parse(&raw) {
                    Ok(address) => {
                        store.set_wallet(Some(address));
                        println!("wallet linked from profile: {address}");
                    }
                    Err(e) => {
                        warn!(error = %e, "custody address rejected");
                        println!("custody address unusable, 'link <address>' to connect a wallet");
                    }
                },
                None => {
                    println!("no wallet on profile, 'link <address>' to connect one");
                }
            }
        }
        SignInOutcome::Dismissed => {
            info!("sign-in dismissed");
            println!("sign-in window closed, type 'in' to retry");
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
async fn handle_command(
    command: ReplCommand,
    client: &GiltClient,
    store: &Arc<SessionStore>,
    config: &RunConfig,
    auth_tx: &mpsc::Sender<SignInOutcome>,
    cancel: &CancellationToken,
    signing_in: &mut bool,
    attempt_cancel: &mut Option<CancellationToken>,
) -> bool {
    match command {
        ReplCommand::Empty => {}
        ReplCommand::Help => print_help(),
        ReplCommand::Status => print_status(&store.snapshot(), store.gates()),
        ReplCommand::Quit => {
            return false;
        }

        ReplCommand::SignIn => {
            if store.phase() != SessionPhase::Anonymous {
                println!("already signed in, 'out' first");
            } else if *signing_in {
                println!("a sign-in attempt is already open ('out' cancels it)");
            } else {
                match begin_sign_in(client, config, auth_tx, cancel, attempt_cancel) {
                    Ok(()) => {
                        *signing_in = true;
                        println!("sign-in opened in your browser");
                    }
                    Err(e) => println!("error: {e}"),
                }
            }
        }

        ReplCommand::SignOut => {
            if let Some(token) = attempt_cancel.take() {
                token.cancel();
                *signing_in = false;
            }
            store.clear();
            println!("signed out");
        }

        ReplCommand::Link(raw) => {
            if raw.is_empty() {
                println!("usage: link <0x address>");
            } else {
                match Address::parse(&raw) {
                    Ok(address) => {
                        if store.set_wallet(Some(address)) {
                            println!("wallet linked: {address}");
                        } else {
                            println!("sign in before linking a wallet");
                        }
                    }
                    Err(e) => println!("invalid address: {e}"),
                }
            }
        }

        ReplCommand::Unlink => {
            if store.set_wallet(None) {
                println!("wallet unlinked");
            }
        }

        ReplCommand::Cast(text) => publish_cast(client, store, &text).await,
        ReplCommand::Golden(text) => publish_golden(client, store, &text).await,
        ReplCommand::GoldenFeed => show_golden_feed(client).await,
        ReplCommand::Like(hash) => react(client, store, ReactionKind::Like, &hash).await,
        ReplCommand::Recast(hash) => react(client, store, ReactionKind::Recast, &hash).await,
        ReplCommand::Feed => show_feed(client).await,
        ReplCommand::Board => show_leaderboard(client, store.gates()).await,

        ReplCommand::Tab(name) => match Tab::parse(&name) {
            Some(tab) => store.set_active_tab(tab),
            None => println!("tabs: home, golden, search, board, profile"),
        },
        ReplCommand::Panel => {
            let open = !store.snapshot().ui.panel_open;
            store.set_panel_open(open);
            println!("panel {}", if open { "open" } else { "closed" });
        }

        ReplCommand::Unknown(word) => {
            println!("unknown command '{word}', type 'help'");
        }
    }
    true
}

/// Publish a basic cast: capability token plus the cast gate.
async fn publish_cast(client: &GiltClient, store: &SessionStore, text: &str) {
    if text.is_empty() {
        println!("usage: cast <text>");
        return;
    }
    let session = store.snapshot();
    let Some(signer) = session.signer().map(str::to_string) else {
        println!("{}", signer_hint(&session));
        return;
    };
    if !session.entitlements.can_cast {
        let need = shortfall(store.gates().cast_gate, session.balance.balance.units);
        println!("casting locked: {need:.0} more GILT needed");
        return;
    }
    match client.hub.publish_cast(&signer, text, None).await {
        Ok(cast) => println!("cast published: {}", cast.hash),
        Err(e) => println!("publish failed: {e}"),
    }
}

/// Publish a golden cast: higher gate, crown-prefixed on the hub, and
/// recorded in the backend's golden feed.
async fn publish_golden(client: &GiltClient, store: &SessionStore, text: &str) {
    let session = store.snapshot();
    let Some(identity) = session.identity.clone() else {
        println!("sign in first ('in')");
        return;
    };
    if !session.entitlements.can_golden_cast {
        let need = shortfall(
            store.gates().golden_cast_gate,
            session.balance.balance.units,
        );
        println!("golden casts locked: {need:.0} more GILT needed");
        return;
    }

    // Publish to the hub when a capability token exists; the golden feed
    // entry is written either way.
    let mut cast_hash = format!("golden-{}-{}", identity.fid, Utc::now().timestamp_millis());
    if let Some(signer) = identity.signer_uuid.as_deref() {
        match client.hub.publish_cast(signer, &golden_text(text), None).await {
            Ok(cast) => cast_hash = cast.hash,
            Err(e) => warn!(error = %e, "hub publish failed, recording golden cast only"),
        }
    }

    let Some(sync) = client.sync.as_ref() else {
        println!("golden cast published: {cast_hash} (sync backend disabled)");
        return;
    };
    let row = GoldenCast {
        cast_hash: cast_hash.clone(),
        fid: identity.fid,
        username: identity.username.clone(),
        display_name: identity.display_name.clone(),
        pfp_url: identity.pfp_url.clone(),
        content: text.trim().to_string(),
        created_at: None,
    };
    match sync.insert_golden_cast(&row).await {
        Ok(()) => println!("golden cast published: {cast_hash}"),
        Err(e) => println!("golden cast published to hub, feed record failed: {e}"),
    }
}

async fn react(client: &GiltClient, store: &SessionStore, kind: ReactionKind, hash: &str) {
    if hash.is_empty() {
        println!("usage: {} <cast hash>", kind.as_str());
        return;
    }
    let session = store.snapshot();
    let Some(signer) = session.signer().map(str::to_string) else {
        println!("{}", signer_hint(&session));
        return;
    };
    match client.hub.react(&signer, kind, hash).await {
        Ok(true) => println!("{} recorded", kind.as_str()),
        Ok(false) => println!("{} not applied", kind.as_str()),
        Err(e) => println!("error: {e}"),
    }
}

async fn show_feed(client: &GiltClient) {
    match client.hub.fetch_feed(10, None).await {
        Ok(page) => {
            for cast in &page.casts {
                print_cast(cast);
            }
        }
        Err(e) => println!("feed error: {e}"),
    }
}

async fn show_golden_feed(client: &GiltClient) {
    let Some(sync) = client.sync.as_ref() else {
        println!("sync backend not configured, no golden feed");
        return;
    };
    match sync.golden_casts(10).await {
        Ok(rows) if rows.is_empty() => println!("no golden casts yet"),
        Ok(rows) => {
            for row in &rows {
                let when = row
                    .created_at
                    .map(|t| t.format("%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!("{when}  @{}  {}", row.username, row.content);
            }
        }
        Err(e) => println!("golden feed error: {e}"),
    }
}

async fn show_leaderboard(client: &GiltClient, gates: &GateConfig) {
    let Some(sync) = client.sync.as_ref() else {
        println!("sync backend not configured, no leaderboard");
        return;
    };
    match sync.top_users(10).await {
        Ok(rows) => crate::leaderboard::print_rows(&rows, gates),
        Err(e) => println!("leaderboard error: {e}"),
    }
}

fn signer_hint(session: &Session) -> &'static str {
    if session.identity.is_none() {
        "sign in first ('in')"
    } else {
        "this profile carries no capability token, publishing is unavailable"
    }
}

// ---------------------------------------------------------------------------
// Output + sync
// ---------------------------------------------------------------------------

fn print_help() {
    println!("  status            session, balance, gates");
    println!("  in / out          sign in (browser) / sign out");
    println!("  link <address>    link a wallet (unlink to drop)");
    println!("  cast <text>       publish a cast");
    println!("  golden [text]     golden feed, or publish a golden cast");
    println!("  like <hash>       like a cast (recast <hash> to recast)");
    println!("  feed              latest hub casts");
    println!("  board             top holders");
    println!("  tab <name>        switch tab; panel toggles the panel");
    println!("  quit              exit");
}

fn print_status(session: &Session, gates: &GateConfig) {
    match &session.identity {
        Some(p) => println!("  user      @{} (fid {})", p.username, p.fid),
        None => println!("  user      anonymous"),
    }
    println!("  phase     {}", session.phase().label());
    if let Some(wallet) = &session.wallet {
        println!("  wallet    {wallet}");
    }
    let balance = &session.balance;
    let stale = if balance.stale { " (stale)" } else { "" };
    println!("  balance   {:.4} GILT{}", balance.balance.units, stale);
    let e = &session.entitlements;
    println!(
        "  gates     cast:{} golden:{} royal:{} tier:{}",
        e.can_cast,
        e.can_golden_cast,
        e.is_royal,
        e.tier.label()
    );
    if !e.can_cast {
        let need = shortfall(gates.cast_gate, balance.balance.units);
        println!("  locked    cast needs {need:.0} more");
    }
    if !e.can_golden_cast {
        let need = shortfall(gates.golden_cast_gate, balance.balance.units);
        println!("  locked    golden needs {need:.0} more");
    }
    if let Some(price) = &session.price {
        println!(
            "  price     ${:.6} ({:+.2}% 24h)",
            price.usd, price.usd_24h_change
        );
    }
}

fn log_transitions(prev: &Session, next: &Session) {
    if prev.phase() != next.phase() {
        info!(phase = next.phase().label(), "SESSION");
    }
    if prev.entitlements != next.entitlements {
        let e = &next.entitlements;
        info!(
            cast = e.can_cast,
            golden = e.can_golden_cast,
            royal = e.is_royal,
            tier = e.tier.label(),
            "GATES"
        );
    }
    if prev.balance.balance.raw != next.balance.balance.raw {
        debug!(
            units = next.balance.balance.units,
            stale = next.balance.stale,
            "balance"
        );
    }
}

fn log_status(session: &Session) {
    let e = &session.entitlements;
    info!(
        phase = session.phase().label(),
        balance = format!("{:.4}", session.balance.balance.units),
        stale = session.balance.stale,
        cast = e.can_cast,
        golden = e.can_golden_cast,
        royal = e.is_royal,
        tier = e.tier.label(),
        "STATUS"
    );
}

/// Fire-and-forget user upsert; the session never waits on the backend.
fn spawn_user_sync(client: &GiltClient, row: UserRow) {
    let Some(sync) = client.sync.as_ref() else {
        return;
    };
    let sync = sync.clone();
    tokio::spawn(async move {
        if let Err(e) = sync.upsert_user(&row).await {
            debug!(error = %e, "user sync failed");
        }
    });
}
