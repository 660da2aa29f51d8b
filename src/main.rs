use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use teamlink::store::memory::MemoryStore;
use teamlink::store::postgres::PgStore;
use teamlink::store::Store;
use teamlink::{api, auth, config, AppState};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "teamlink=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port, memory }) => run_server(cfg, port, memory).await,
        Some(cli::Commands::Session {
            user_id,
            ttl_minutes,
        }) => {
            let token = auth::issue_session_token(&cfg.secret_key, user_id, ttl_minutes)?;
            println!("Session token for user {user_id} (valid {ttl_minutes} minutes):");
            println!("{token}");
            Ok(())
        }
        None => run_server(cfg, None, false).await,
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(
    cfg: config::Config,
    port: Option<u16>,
    memory: bool,
) -> anyhow::Result<()> {
    let store: Arc<dyn Store> = if memory {
        tracing::warn!("Using the in-memory store; linked workspaces are lost on restart");
        Arc::new(MemoryStore::new())
    } else {
        tracing::info!("Connecting to database...");
        let db = PgStore::connect(&cfg.database_url).await?;
        tracing::info!("Running migrations...");
        db.migrate().await?;
        Arc::new(db)
    };

    let port = port.unwrap_or(cfg.port);
    let state = Arc::new(AppState::new(cfg, store));

    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Teamlink gateway listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
