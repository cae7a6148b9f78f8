//! Shutdown events.
//!
//! Two sources feed one channel: OS signals, registered by
//! [`listen_for_signals`], and the application itself, which raises an
//! integrity event through a [`ShutdownHandle`] when a request fails in a way
//! that means the process can no longer be trusted to keep serving.

use std::fmt;
use std::io;

use tokio::sync::mpsc;

/// Why the server is shutting down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownEvent {
    /// SIGINT
    Interrupt,
    /// SIGTERM
    Terminate,
    /// Fatal condition raised from inside the process.
    Integrity(String),
}

impl fmt::Display for ShutdownEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownEvent::Interrupt => f.write_str("interrupt"),
            ShutdownEvent::Terminate => f.write_str("terminate"),
            ShutdownEvent::Integrity(reason) => write!(f, "integrity: {reason}"),
        }
    }
}

/// Sending side, cheap to clone into the application and signal listeners.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: mpsc::UnboundedSender<ShutdownEvent>,
}

impl ShutdownHandle {
    pub fn request(&self, event: ShutdownEvent) {
        // The coordinator may already be gone.
        let _ = self.sender.send(event);
    }

    pub fn integrity(&self, reason: impl Into<String>) {
        self.request(ShutdownEvent::Integrity(reason.into()));
    }
}

/// Receiving side, owned by the coordinator.
#[derive(Debug)]
pub struct ShutdownEvents {
    receiver: mpsc::UnboundedReceiver<ShutdownEvent>,
}

impl ShutdownEvents {
    /// Events that never arrive, for listeners that are not coordinated.
    pub fn never() -> Self {
        channel().1
    }

    /// Wait for the next event. Pends forever once every handle is dropped.
    pub async fn recv(&mut self) -> ShutdownEvent {
        match self.receiver.recv().await {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }
}

pub fn channel() -> (ShutdownHandle, ShutdownEvents) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ShutdownHandle { sender }, ShutdownEvents { receiver })
}

/// Forward SIGINT and SIGTERM into `handle`. Fails if the handlers cannot be
/// registered.
#[cfg(unix)]
pub fn listen_for_signals(handle: ShutdownHandle) -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                Some(()) = sigterm.recv() => ShutdownEvent::Terminate,
                Some(()) = sigint.recv() => ShutdownEvent::Interrupt,
                else => break,
            };
            tracing::info!(%event, "received shutdown signal");
            handle.request(event);
        }
    });

    Ok(())
}

#[cfg(not(unix))]
pub fn listen_for_signals(handle: ShutdownHandle) -> io::Result<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received ctrl-c");
            handle.request(ShutdownEvent::Interrupt);
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_handle_delivers_events_in_order() {
        let (handle, mut events) = channel();

        handle.request(ShutdownEvent::Terminate);
        handle.clone().integrity("claims missing from context");

        assert_eq!(events.recv().await, ShutdownEvent::Terminate);
        assert_eq!(
            events.recv().await,
            ShutdownEvent::Integrity("claims missing from context".to_string())
        );
    }

    #[tokio::test]
    async fn test_never_does_not_resolve() {
        let mut events = ShutdownEvents::never();
        let waited = tokio::time::timeout(Duration::from_millis(20), events.recv()).await;
        assert!(waited.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ShutdownEvent::Integrity("x".into()).to_string(), "integrity: x");
        assert_eq!(ShutdownEvent::Terminate.to_string(), "terminate");
    }
}
