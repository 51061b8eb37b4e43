//! Serving the control endpoint until a stop is requested

use axum::Router;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// One-shot, cloneable stop request shared by the handlers, the OS signal
/// listener and the server loop.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: watch::Sender<bool>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Request a stop. Later calls are no-ops.
    pub fn trigger(&self) {
        self.tx.send_if_modified(|stopped| {
            let changed = !*stopped;
            *stopped = true;
            changed
        });
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once a stop has been requested
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in self, so this only ends once the flag is set
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Why [`ControlServer::serve`] returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeExit {
    /// A stop was requested and open connections drained in time
    Stopped,
    /// A stop was requested but connections were still open at the deadline
    DrainTimedOut,
    /// The listener failed; treated as a stop by the runtime
    ListenerFailed(String),
}

/// Control endpoint bound to its listener
pub struct ControlServer {
    listener: TcpListener,
    router: Router,
    stop: StopSignal,
    drain_timeout: Duration,
}

impl ControlServer {
    pub fn new(
        listener: TcpListener,
        router: Router,
        stop: StopSignal,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            listener,
            router,
            stop,
            drain_timeout,
        }
    }

    /// Bind `address:port`; port 0 asks the OS for a free one
    pub async fn bind(address: &str, port: u16) -> std::io::Result<TcpListener> {
        TcpListener::bind((address, port)).await
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until a stop is requested. In-flight requests get
    /// `drain_timeout` to finish after the stop.
    pub async fn serve(self) -> ServeExit {
        let addr = self
            .listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "<unknown>".to_string());
        info!("Control endpoint listening on {}", addr);

        let shutdown = {
            let stop = self.stop.clone();
            async move { stop.wait().await }
        };

        let server = axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .into_future();
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => return finished(result),
            _ = self.stop.wait() => {}
        }

        info!("Stop requested, draining control endpoint connections");
        match timeout(self.drain_timeout, server).await {
            Ok(result) => finished(result),
            Err(_) => {
                warn!(
                    "Control endpoint connections still open after {:?}, abandoning them",
                    self.drain_timeout
                );
                ServeExit::DrainTimedOut
            }
        }
    }
}

fn finished(result: std::io::Result<()>) -> ServeExit {
    match result {
        Ok(()) => {
            info!("Control endpoint shut down");
            ServeExit::Stopped
        }
        Err(e) => {
            error!("Control endpoint failed: {}", e);
            ServeExit::ListenerFailed(e.to_string())
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn os_shutdown_signal() {
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
