use bookstore_api::{
    app_router,
    config::{self, AppConfig},
    db,
    events::{self, EventSender, EVENT_CHANNEL_CAPACITY},
    services::notifications::LogNotifier,
    AppState,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::{signal, sync::mpsc};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg: AppConfig = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.log_json);
    info!(environment = %cfg.environment, "starting bookstore-api");

    let pool = db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        db::run_migrations(&pool).await?;
    } else {
        info!("auto_migrate disabled; run the migration binary before serving traffic");
    }

    tokio::fs::create_dir_all(&cfg.upload_dir).await?;

    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let event_processor = tokio::spawn(events::process_events(rx, Arc::new(LogNotifier)));

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port).parse()?;
    let state = AppState::new(pool, cfg, EventSender::new(tx));
    let app = app_router(state);

    info!("bookstore-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router owned the last sender, so the processor drains and exits.
    if let Err(e) = event_processor.await {
        warn!("event processor stopped abnormally: {}", e);
    }
    info!("bookstore-api stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
