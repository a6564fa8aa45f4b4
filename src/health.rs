//! Liveness endpoint for uptime probes.

use std::io;
use std::net::SocketAddr;
use std::thread::{self, JoinHandle};

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tracing::{error, info};

const HEALTH_MESSAGE: &str = "✅ Bot is running!";

/// Builds the health router.
pub fn router() -> Router {
    Router::new().route("/", get(health_check))
}

async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, HEALTH_MESSAGE)
}

/// Serves the health endpoint until the listener fails.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server stops.
pub async fn serve(addr: SocketAddr) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Health endpoint listening on {}", listener.local_addr()?);
    axum::serve(listener, router()).await
}

/// Runs the health endpoint on a dedicated thread with its own runtime.
///
/// # Errors
///
/// Returns an error if the thread cannot be spawned.
pub fn spawn(addr: SocketAddr) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("health".to_owned())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!("Failed to start health runtime: {}", e);
                    return;
                }
            };

            if let Err(e) = runtime.block_on(serve(addr)) {
                error!("Health endpoint stopped: {}", e);
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "✅ Bot is running!");
    }

    #[tokio::test]
    async fn test_serve_responds_over_http() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router()).await.unwrap();
        });

        let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "✅ Bot is running!");
    }
}
