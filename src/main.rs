use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{info, warn};

use school_transport::config::database::DatabaseConfig;
use school_transport::config::EnvironmentConfig;
use school_transport::database::DatabaseConnection;
use school_transport::repositories::{EntityStore, MemoryStore, PgStore};
use school_transport::routes::create_router;
use school_transport::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();
    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    info!("🚌 School Transport - solicitudes y cupos");
    info!("=========================================");
    info!(
        transitions = ?config.allocation_policy.transitions,
        recheck_capacity = config.allocation_policy.recheck_capacity_on_reactivation,
        "⚙️ Política de servicios"
    );

    match config.database_url.clone() {
        Some(url) => {
            let connection = DatabaseConnection::connect(&DatabaseConfig::new(url)).await?;
            let store = Arc::new(PgStore::new(connection.pool().clone()));
            serve(store, config).await
        }
        None => {
            warn!("⚠️ DATABASE_URL no definida: usando almacenamiento en memoria");
            serve(Arc::new(MemoryStore::new()), config).await
        }
    }
}

async fn serve<S: EntityStore>(store: Arc<S>, config: EnvironmentConfig) -> Result<()> {
    let addr: SocketAddr = config.server_url().parse()?;
    let app = create_router(AppState::new(store, config));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("   GET    /health");
    info!("   POST   /api/routes");
    info!("   PUT    /api/routes/:id/active");
    info!("   GET    /api/routes/:id/availability");
    info!("   GET    /api/routes/:id/requests");
    info!("   POST   /api/requests");
    info!("   POST   /api/requests/:id/resolve");
    info!("   PATCH  /api/allocations/:id");
    info!("   POST   /api/students");
    info!("   DELETE /api/students/:id");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Servidor detenido");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("No se pudo escuchar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("No se pudo escuchar SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
