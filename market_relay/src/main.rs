// @file: market_relay/src/main.rs
// @description: Process wiring: config, logger, live feeds, REST + subscriber servers, signal-driven shutdown.
// @author: LAS.

use log::{error, info, warn};
use market_relay::api::rest::{router, AppState};
use market_relay::api::ws_server;
use market_relay::connectors::http_client::ReqwestClient;
use market_relay::connectors::ws_transport::TungsteniteConnector;
use market_relay::connectors::{build_adapters, spawn_ingestor};
use market_relay::core::broadcaster::Broadcaster;
use market_relay::core::interfaces::{FeedConnector, UpstreamClient};
use market_relay::core::models::StreamTarget;
use market_relay::core::registry::ConnectionRegistry;
use market_relay::utils::config::AppConfig;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;


#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // #1. Environment & Config
    dotenv::dotenv().ok();
    let config: AppConfig = AppConfig::load()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str())).init();
    info!(">>> Market Relay is Starting... <<<");

    let targets: Vec<StreamTarget> = config.parsed_stream_targets()?;

    // #2. Shared Plumbing
    let broadcaster: Broadcaster = Broadcaster::new(config.broadcast_buffer_size);
    let registry: ConnectionRegistry = ConnectionRegistry::new();
    let client: Arc<dyn UpstreamClient> = Arc::new(ReqwestClient::new(config.upstream_timeout())?);
    let connector: Arc<dyn FeedConnector> = Arc::new(TungsteniteConnector);

    // #3. Live Feeds
    for target in targets {
        match spawn_ingestor(target.clone(), &config, connector.clone(), broadcaster.clone()) {
            Some(handle) => registry.register(handle).await,
            None => warn!("No trade feed for {}, skipping", target),
        }
    }
    info!("Started {} upstream feeds", registry.len().await);

    // #4. Subscriber Server
    let ws_task = tokio::spawn(ws_server::start_server(broadcaster.clone(), config.ws_bind_address.clone()));

    // #5. REST Server
    let state = AppState {
        adapters: Arc::new(build_adapters(&config, client)),
        broadcaster,
        registry: registry.clone(),
        maintenance: config.is_maintenance.then(|| config.maintenance_message.clone()),
    };
    if state.maintenance.is_some() {
        warn!("Maintenance mode is ON, every request will be answered with 503");
    }

    let listener: TcpListener = TcpListener::bind(&config.http_bind_address).await?;
    info!("HTTP server listening on: {}", listener.local_addr()?);

    let served = axum::serve(listener, router(state).into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(e) = served {
        error!("HTTP server error: {}", e);
    }

    // #6. Teardown
    ws_task.abort();
    registry.close_all().await;
    info!(">>> Market Relay stopped <<<");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("Received Ctrl+C, shutting down..."),
        _ = terminate => warn!("Received SIGTERM, shutting down..."),
    }
}
