use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;

use signaling_relay::config::Settings;
use signaling_relay::server::{create_app, load_rustls_config, AppState};
use signaling_relay::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing
    let _telemetry = init_telemetry(&settings.logging, &settings.otel)?;
    tracing::info!("Configuration loaded");

    // Create application state
    let state = AppState::new(settings.clone());
    tracing::info!("Application state initialized");

    // Create Axum app
    let app = create_app(state);

    // Platforms that hand over PORT terminate TLS in front of us
    let hosted = std::env::var("PORT").is_ok();
    if hosted {
        tracing::info!("Production environment detected (ignoring local TLS certificates)");
    }

    let addr = settings.server_addr();
    match load_rustls_config(&settings.server, hosted).await? {
        Some(tls) => {
            let socket_addr: SocketAddr = addr.parse()?;
            tracing::info!("Server listening on {} (TLS)", addr);
            tracing::info!("Access via: https://{}:{}", local_ip(), settings.server.port);

            let handle = axum_server::Handle::new();
            let shutdown_handle = handle.clone();
            tokio::spawn(async move {
                shutdown_signal_handler().await;
                shutdown_handle.graceful_shutdown(Some(Duration::from_secs(10)));
            });

            axum_server::bind_rustls(socket_addr, tls)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            let listener = TcpListener::bind(&addr).await?;
            tracing::info!("Server listening on {}", addr);
            tracing::info!("Access via: http://{}:{}", local_ip(), settings.server.port);
            if !hosted {
                tracing::warn!("WebRTC requires HTTPS unless accessed via localhost!");
            }

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal_handler())
                .await?;
        }
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Address of the interface used for outbound traffic, for the startup banner.
/// Connecting a UDP socket sends nothing; it only selects a route.
fn local_ip() -> IpAddr {
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect((Ipv4Addr::new(10, 255, 255, 255), 1))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
