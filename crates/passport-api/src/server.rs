//! # Server Lifecycle
//!
//! ```text
//! Created → Listening → ShuttingDown → Stopped
//! ```
//!
//! The server owns its accept loop and runs every connection as a task in a
//! [`JoinSet`]. On a shutdown signal the listener is closed and open
//! connections are asked to finish their in-flight request. Connections
//! still open when the grace period elapses are aborted, which closes their
//! sockets, before the phase becomes `Stopped`.
//!
//! Each connection is also bounded by [`ConnectionTimeouts`]: a deadline for
//! reading request headers, one for producing a response, and an idle limit
//! between requests.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::Router;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto;
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tower::ServiceExt;
use tracing::{debug, info, warn};

/// Pause after a failed `accept` before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Lifecycle phase, observable through [`Server::phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerPhase {
    Created,
    Listening,
    ShuttingDown,
    Stopped,
}

/// Per-connection deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionTimeouts {
    /// Time allowed to receive a complete request head.
    pub header_read: Duration,
    /// Time allowed for the router to produce a response. The connection is
    /// closed without a response when it elapses.
    pub response: Duration,
    /// Time a connection may sit with no request in flight.
    pub idle: Duration,
}

impl Default for ConnectionTimeouts {
    fn default() -> Self {
        Self {
            header_read: Duration::from_secs(10),
            response: Duration::from_secs(10),
            idle: Duration::from_secs(120),
        }
    }
}

/// HTTP server owning the fully layered router.
#[derive(Debug)]
pub struct Server {
    router: Router,
    bind_addr: String,
    grace: Duration,
    timeouts: ConnectionTimeouts,
    phase: watch::Sender<ServerPhase>,
}

impl Server {
    pub fn new(router: Router, bind_addr: impl Into<String>, grace: Duration) -> Self {
        let (phase, _) = watch::channel(ServerPhase::Created);
        Self {
            router,
            bind_addr: bind_addr.into(),
            grace,
            timeouts: ConnectionTimeouts::default(),
            phase,
        }
    }

    /// Replace the default connection timeouts.
    pub fn with_timeouts(mut self, timeouts: ConnectionTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Subscribe to phase changes.
    pub fn phase(&self) -> watch::Receiver<ServerPhase> {
        self.phase.subscribe()
    }

    /// Bind the configured address and serve until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = match TcpListener::bind(&self.bind_addr).await {
            Ok(listener) => listener,
            Err(err) => {
                self.phase.send_replace(ServerPhase::Stopped);
                return Err(err).with_context(|| format!("binding {}", self.bind_addr));
            }
        };
        self.run_with_shutdown(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `signal` completes, then shut down.
    pub async fn run_with_shutdown<F>(self, listener: TcpListener, signal: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = listener.local_addr().context("reading listener address")?;
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut connections = JoinSet::new();
        tokio::pin!(signal);

        self.phase.send_replace(ServerPhase::Listening);
        info!(addr = %addr, "server listening");

        loop {
            tokio::select! {
                () = &mut signal => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        connections.spawn(serve_connection(
                            stream,
                            peer,
                            self.router.clone(),
                            self.timeouts,
                            stop_rx.clone(),
                        ));
                    }
                    Err(err) => {
                        warn!(error = %err, "accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }
        drop(listener);

        self.phase.send_replace(ServerPhase::ShuttingDown);
        info!(
            grace_secs = self.grace.as_secs_f64(),
            open_connections = connections.len(),
            "shutting down server"
        );
        let _ = stop_tx.send(true);

        let drained = tokio::time::timeout(self.grace, async {
            while connections.join_next().await.is_some() {}
        })
        .await;
        match drained {
            Ok(()) => info!("graceful shutdown complete"),
            Err(_) => {
                warn!(
                    remaining = connections.len(),
                    "grace period elapsed, closing remaining connections"
                );
                connections.abort_all();
                while connections.join_next().await.is_some() {}
            }
        }
        self.phase.send_replace(ServerPhase::Stopped);
        Ok(())
    }
}

/// Request bookkeeping for one connection's idle limit.
#[derive(Debug)]
struct Activity {
    in_flight: AtomicUsize,
    last: Mutex<Instant>,
}

impl Activity {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            in_flight: AtomicUsize::new(0),
            last: Mutex::new(Instant::now()),
        })
    }

    fn begin(self: &Arc<Self>) -> Busy {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        Busy(Arc::clone(self))
    }

    /// When the connection becomes idle for too long. `None` while busy.
    fn idle_deadline(&self, idle: Duration) -> Option<Instant> {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            None
        } else {
            Some(*self.last.lock() + idle)
        }
    }

    /// Completes once no request has been in flight for `idle`.
    async fn idle_elapsed(&self, idle: Duration) {
        loop {
            match self.idle_deadline(idle) {
                Some(deadline) if deadline <= Instant::now() => return,
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => tokio::time::sleep(idle).await,
            }
        }
    }
}

/// Marks one request in flight until dropped.
struct Busy(Arc<Activity>);

impl Drop for Busy {
    fn drop(&mut self) {
        *self.0.last.lock() = Instant::now();
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Serve HTTP on one accepted socket until it closes, idles out, or the
/// server stops.
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Router,
    timeouts: ConnectionTimeouts,
    mut stop: watch::Receiver<bool>,
) {
    let activity = Activity::new();
    let service = {
        let activity = Arc::clone(&activity);
        service_fn(move |mut request: Request<Incoming>| {
            request.extensions_mut().insert(ConnectInfo(peer));
            let router = router.clone();
            let busy = activity.begin();
            async move {
                let _busy = busy;
                match tokio::time::timeout(timeouts.response, router.oneshot(request)).await {
                    Ok(Ok(response)) => Ok(response),
                    Ok(Err(never)) => match never {},
                    Err(_) => {
                        warn!(peer = %peer, "response deadline elapsed, dropping connection");
                        Err(io::Error::new(io::ErrorKind::TimedOut, "response deadline elapsed"))
                    }
                }
            }
        })
    };

    let mut builder = auto::Builder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(timeouts.header_read);
    let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let reason = tokio::select! {
        result = conn.as_mut() => {
            if let Err(err) = result {
                debug!(peer = %peer, error = %err, "connection ended with error");
            }
            return;
        }
        _ = stop.wait_for(|stop| *stop) => "shutdown",
        () = activity.idle_elapsed(timeouts.idle) => "idle",
    };
    debug!(peer = %peer, reason, "closing connection");
    conn.as_mut().graceful_shutdown();
    if let Err(err) = conn.await {
        debug!(peer = %peer, error = %err, "connection ended with error");
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM.
///
/// A handler that cannot be installed is logged and never fires.
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C"),
        () = terminate => info!("received SIGTERM"),
    }
}
