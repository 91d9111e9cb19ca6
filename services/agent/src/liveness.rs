//! Liveness Responder
//!
//! Answers health checks from its own OS thread and its own single-threaded
//! runtime, so a stalled or crashed session runtime cannot starve it. It
//! shares no state with sessions and logs no requests.

use axum::{Router, http::StatusCode, routing::get};
use std::{io, net::SocketAddr, thread};
use tracing::{error, info};

/// Routes served by the liveness listener.
pub fn liveness_router() -> Router {
    Router::new()
        .route("/health", get(health).head(not_found).fallback(not_found))
        .fallback(not_found)
}

async fn health() -> &'static str {
    "OK"
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// A bound, not yet serving, liveness listener.
pub struct LivenessResponder {
    listener: std::net::TcpListener,
}

impl LivenessResponder {
    /// Binds the listener. Failing here is fatal at process startup.
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        let listener = std::net::TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves health checks on a dedicated thread for the rest of the process.
    ///
    /// The runtime is built and the listener registered before the thread
    /// starts, so any failure surfaces here instead of leaving a bound port
    /// that never answers.
    pub fn spawn(self) -> io::Result<thread::JoinHandle<()>> {
        let addr = self.local_addr()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let listener = {
            let _guard = runtime.enter();
            tokio::net::TcpListener::from_std(self.listener)?
        };
        thread::Builder::new()
            .name("liveness".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    info!(%addr, "Health server running");
                    if let Err(e) = axum::serve(listener, liveness_router()).await {
                        error!(error = %e, "Health server stopped");
                    }
                });
            })
    }
}
