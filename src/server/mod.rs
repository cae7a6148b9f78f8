//! Connection serving and the graceful shutdown coordinator.
//!
//! [`Server::run`] accepts connections until a shutdown event arrives, then
//! stops accepting, lets every connection finish its in-flight request and
//! waits up to the shutdown timeout. Connections still open after that are
//! aborted and the run reports [`ServerError::ShutdownTimeout`], or folds
//! the timeout into [`ServerError::Integrity`] when an integrity event started
//! the shutdown. Accept failures caused by resource exhaustion are retried
//! with backoff; only an unusable listener ends the run early.

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::web::AppService;

pub mod shutdown;

pub use shutdown::{channel, listen_for_signals, ShutdownEvent, ShutdownEvents, ShutdownHandle};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("binding {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("server error: {0}")]
    Listener(#[source] io::Error),
    #[error("integrity issue caused shutdown: {reason}{}", forced_note(.forced))]
    Integrity {
        reason: String,
        /// Set when connections were still open after this timeout and had
        /// to be force-closed.
        forced: Option<Duration>,
    },
    #[error("could not stop server gracefully: connections still open after {0:?} were force-closed")]
    ShutdownTimeout(Duration),
}

#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    /// Limit on reading a request's headers.
    pub read_timeout: Duration,
    /// How long in-flight requests may run once shutdown starts.
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

pub struct Server {
    listener: TcpListener,
    service: AppService,
    config: ServerConfig,
}

impl Server {
    pub async fn bind(addr: &str, service: AppService, config: ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        Ok(Self::from_listener(listener, service, config))
    }

    pub fn from_listener(listener: TcpListener, service: AppService, config: ServerConfig) -> Self {
        Self {
            listener,
            service,
            config,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until a shutdown event or a listener failure.
    pub async fn run(self, mut events: ShutdownEvents) -> Result<(), ServerError> {
        let Server {
            listener,
            service,
            config,
        } = self;

        let (drain_tx, drain_rx) = watch::channel(false);
        let mut connections = JoinSet::new();

        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "listening");
        }

        let mut backoff = AcceptBackoff::default();
        let event = 'accept: loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        backoff.reset();
                        connections.spawn(serve_connection(
                            stream,
                            remote,
                            service.clone(),
                            config.read_timeout,
                            drain_rx.clone(),
                        ));
                    }
                    Err(err) => match AcceptFailure::classify(&err) {
                        AcceptFailure::Connection => {
                            debug!(error = %err, "accept failed");
                        }
                        AcceptFailure::Resources => {
                            let delay = backoff.next_delay();
                            warn!(error = %err, ?delay, "accept failed, retrying");
                            tokio::select! {
                                _ = tokio::time::sleep(delay) => {}
                                event = events.recv() => break 'accept event,
                            }
                        }
                        // Dropping the JoinSet on return aborts open connections.
                        AcceptFailure::Fatal => return Err(ServerError::Listener(err)),
                    },
                },
                event = events.recv() => break event,
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        };

        info!(%event, open = connections.len(), "start shutdown");
        drop(listener);
        let _ = drain_tx.send(true);

        let drained = tokio::time::timeout(config.shutdown_timeout, async {
            while connections.join_next().await.is_some() {}
        })
        .await;

        let forced = match drained {
            Ok(()) => None,
            Err(_) => {
                warn!(open = connections.len(), timeout = ?config.shutdown_timeout, "graceful shutdown did not complete, closing connections");
                connections.shutdown().await;
                Some(config.shutdown_timeout)
            }
        };

        match (event, forced) {
            (ShutdownEvent::Integrity(reason), forced) => Err(ServerError::Integrity { reason, forced }),
            (_, Some(timeout)) => Err(ServerError::ShutdownTimeout(timeout)),
            (_, None) => Ok(()),
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    remote: SocketAddr,
    service: AppService,
    read_timeout: Duration,
    mut drain: watch::Receiver<bool>,
) {
    let svc = service_fn(move |req: hyper::Request<Incoming>| {
        let service = service.clone();
        async move {
            let mut req = req.map(Body::new);
            req.extensions_mut().insert(ConnectInfo(remote));
            Ok::<_, Infallible>(service.dispatch(req).await)
        }
    });

    let conn = http1::Builder::new()
        .timer(TokioTimer::new())
        .header_read_timeout(read_timeout)
        .serve_connection(TokioIo::new(stream), svc);
    tokio::pin!(conn);

    let mut draining = false;
    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(err) = result {
                    debug!(%remote, error = %err, "connection closed with error");
                }
                return;
            }
            _ = drain.wait_for(|drain| *drain), if !draining => {
                draining = true;
                conn.as_mut().graceful_shutdown();
            }
        }
    }
}

fn forced_note(forced: &Option<Duration>) -> String {
    match forced {
        Some(timeout) => format!(" (connections still open after {timeout:?} were force-closed)"),
        None => String::new(),
    }
}

/// How the accept loop treats a failed `accept`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcceptFailure {
    /// The peer went away before the connection was handed over.
    Connection,
    /// The listener is fine but the process is short of descriptors, memory
    /// or buffers.
    Resources,
    /// The listening socket itself is unusable.
    Fatal,
}

impl AcceptFailure {
    fn classify(err: &io::Error) -> Self {
        use io::ErrorKind::*;

        match err.kind() {
            // Linux reports a connection refused by firewall rules as EPERM.
            ConnectionAborted | ConnectionReset | ConnectionRefused | Interrupted | WouldBlock | TimedOut
            | PermissionDenied => Self::Connection,
            InvalidInput | NotConnected | Unsupported => Self::Fatal,
            _ => Self::Resources,
        }
    }
}

const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(5);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Retry delay after resource exhaustion: 5ms doubling up to 1s, reset by the
/// next successful accept.
#[derive(Debug, Default)]
struct AcceptBackoff {
    current: Option<Duration>,
}

impl AcceptBackoff {
    fn next_delay(&mut self) -> Duration {
        let delay = match self.current {
            None => ACCEPT_BACKOFF_MIN,
            Some(previous) => (previous * 2).min(ACCEPT_BACKOFF_MAX),
        };
        self.current = Some(delay);
        delay
    }

    fn reset(&mut self) {
        self.current = None;
    }
}
