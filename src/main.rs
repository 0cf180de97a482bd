mod app;
mod cli;
mod client;
mod error;
mod feed;
mod gate;
mod holdings;
mod leaderboard;
mod poller;
mod session;
mod surface;

use clap::Parser;
use cli::Command;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Initialize tracing
    let filter = cli
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Shared cancellation token + signal handlers.
    let cancel = setup_signal_handlers();

    match cli.command {
        Command::Run(args) => {
            let _ = dotenvy::dotenv(); // load .env if present

            let config = app::RunConfig {
                callback_port: args.callback_port,
                poll_interval_ms: args.poll_interval_ms,
                price_interval_ms: args.price_interval_ms,
                status_interval_ms: args.status_interval_ms,
            };

            let client = app::SessionClient::new(config, args.gates());
            if let Err(e) = client.run(cancel).await {
                tracing::error!(error = %e, "session client fatal error");
                std::process::exit(1);
            }
        }

        Command::Feed(args) => {
            let _ = dotenvy::dotenv();
            if let Err(e) = feed::run_feed(args.limit, args.cursor.as_deref(), args.fid).await {
                tracing::error!(error = %e, "feed error");
                std::process::exit(1);
            }
        }

        Command::Search(args) => {
            let _ = dotenvy::dotenv();
            if let Err(e) = feed::run_search(&args.query).await {
                tracing::error!(error = %e, "search error");
                std::process::exit(1);
            }
        }

        Command::Balance(args) => {
            let _ = dotenvy::dotenv();
            let gates = args.gates();
            if let Err(e) = holdings::run_balance(
                &args.address,
                gates,
                args.watch,
                args.json,
                args.interval_ms,
                cancel,
            )
            .await
            {
                tracing::error!(error = %e, "balance error");
                std::process::exit(1);
            }
        }

        Command::Leaderboard(args) => {
            let _ = dotenvy::dotenv();
            if let Err(e) = leaderboard::run_leaderboard(args.limit, gate::GateConfig::default()).await
            {
                tracing::error!(error = %e, "leaderboard error");
                std::process::exit(1);
            }
        }
    }
}

/// Register SIGINT and SIGTERM handlers that trigger the returned token.
fn setup_signal_handlers() -> CancellationToken {
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received SIGINT, shutting down");
        cancel_clone.cancel();
    });

    #[cfg(unix)]
    {
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            let mut sig = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to register SIGTERM handler");
            sig.recv().await;
            info!("received SIGTERM, shutting down");
            cancel_clone.cancel();
        });
    }

    cancel
}
