//! WebSocket bridge between the browser extension and the gate controller.
//!
//! The extension opens one (or more) WebSocket connections and speaks the
//! gate protocol as JSON text frames. Every inbound frame names its tab;
//! the bridge remembers which connection each tab last spoke on and routes
//! outbound messages back the same way. When a connection drops its routes
//! are forgotten; approval state is left to the gate.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use mindful_core::TargetId;
use mindful_gate::{
    BarrierUi, GateError, GateEvent, GateResult, InboundFrame, OutboundFrame, OutboundMessage,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, mpsc};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type ConnectionId = u64;

struct Route {
    connection: ConnectionId,
    tx: mpsc::UnboundedSender<OutboundFrame>,
}

/// Tab to connection routing table. This is the controller's
/// [`BarrierUi`].
#[derive(Clone, Default)]
pub struct Routes {
    inner: Arc<RwLock<HashMap<TargetId, Route>>>,
}

impl Routes {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn register(
        &self,
        target: TargetId,
        connection: ConnectionId,
        tx: &mpsc::UnboundedSender<OutboundFrame>,
    ) {
        let mut routes = self.inner.write().await;
        let current = routes.get(&target).map(|r| r.connection);
        if current != Some(connection) {
            debug!(target_id = %target, connection, "Routing tab");
            routes.insert(
                target,
                Route {
                    connection,
                    tx: tx.clone(),
                },
            );
        }
    }

    /// Forget every tab routed through `connection`; returns them.
    async fn drop_connection(&self, connection: ConnectionId) -> Vec<TargetId> {
        let mut routes = self.inner.write().await;
        let gone: Vec<TargetId> = routes
            .iter()
            .filter(|(_, r)| r.connection == connection)
            .map(|(t, _)| *t)
            .collect();
        for target in &gone {
            routes.remove(target);
        }
        gone
    }

    /// Number of routed tabs.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether no tab is routed.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl std::fmt::Debug for Routes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Routes").finish_non_exhaustive()
    }
}

#[async_trait]
impl BarrierUi for Routes {
    async fn send(&self, target: TargetId, message: OutboundMessage) -> GateResult<()> {
        let routes = self.inner.read().await;
        let Some(route) = routes.get(&target) else {
            return Err(GateError::Unreachable {
                target,
                reason: "no connection for tab".to_string(),
            });
        };
        route
            .tx
            .send(OutboundFrame::new(target, message))
            .map_err(|_| GateError::Unreachable {
                target,
                reason: "connection closed".to_string(),
            })
    }
}

/// The WebSocket listener.
pub struct BridgeServer {
    listener: TcpListener,
    routes: Routes,
}

impl BridgeServer {
    /// Bind to `addr` (`host:port`; port 0 picks a free one).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(addr: &str) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            routes: Routes::new(),
        })
    }

    /// The bound address.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket has no local address.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The routing table, to hand to the controller as its UI.
    #[must_use]
    pub fn routes(&self) -> Routes {
        self.routes.clone()
    }

    /// Accept connections until `shutdown` is cancelled, forwarding every
    /// inbound frame to `gate`.
    pub async fn serve(self, gate: mpsc::Sender<GateEvent>, shutdown: CancellationToken) {
        let next_id = AtomicU64::new(1);
        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, "Bridge listening");
        }

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let connection = next_id.fetch_add(1, Ordering::Relaxed);
                        tokio::spawn(handle_connection(
                            stream,
                            peer,
                            connection,
                            self.routes.clone(),
                            gate.clone(),
                            shutdown.clone(),
                        ));
                    },
                    Err(e) => warn!(error = %e, "Accept failed"),
                },
            }
        }
        info!("Bridge stopped");
    }
}

impl std::fmt::Debug for BridgeServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeServer")
            .field("addr", &self.listener.local_addr().ok())
            .finish_non_exhaustive()
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    connection: ConnectionId,
    routes: Routes,
    gate: mpsc::Sender<GateEvent>,
    shutdown: CancellationToken,
) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, error = %e, "WebSocket handshake failed");
            return;
        },
    };
    info!(%peer, connection, "Extension connected");

    let (mut sink, mut source) = ws.split();
    let (tx, mut outbound) = mpsc::unbounded_channel::<OutboundFrame>();

    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            },
            Some(frame) = outbound.recv() => {
                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(target_id = %frame.tab_id, error = %e, "Failed to encode frame");
                        continue;
                    },
                };
                if let Err(e) = sink.send(Message::Text(json)).await {
                    warn!(%peer, error = %e, "Send failed");
                    break;
                }
            },
            message = source.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let frame = match serde_json::from_str::<InboundFrame>(&text) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!(%peer, error = %e, "Ignoring malformed frame");
                            continue;
                        },
                    };
                    routes.register(frame.tab_id, connection, &tx).await;
                    if gate.send(GateEvent::Inbound(frame)).await.is_err() {
                        debug!(%peer, "Gate controller gone");
                        break;
                    }
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {},
                Some(Err(e)) => {
                    warn!(%peer, error = %e, "WebSocket error");
                    break;
                },
            },
        }
    }

    // Approval state outlives the transport. A tab that is really gone is
    // released when a later send to it finds no route, or on TAB_CLOSED.
    let tabs = routes.drop_connection(connection).await;
    info!(%peer, connection, tabs = tabs.len(), "Extension disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unrouted_tab_is_unreachable() {
        let routes = Routes::new();
        let err = routes
            .send(TargetId::new(4), OutboundMessage::TimeExpired)
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Unreachable { .. }));
    }

    #[tokio::test]
    async fn test_routed_tab_receives_frames() {
        let routes = Routes::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        routes.register(TargetId::new(4), 1, &tx).await;

        routes
            .send(TargetId::new(4), OutboundMessage::TimeExpired)
            .await
            .unwrap();
        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.tab_id, TargetId::new(4));
        assert_eq!(frame.message, OutboundMessage::TimeExpired);
    }

    #[tokio::test]
    async fn test_closed_connection_is_unreachable() {
        let routes = Routes::new();
        let (tx, rx) = mpsc::unbounded_channel();
        routes.register(TargetId::new(4), 1, &tx).await;
        drop(rx);

        let result = routes
            .send(TargetId::new(4), OutboundMessage::TimeExpired)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_drop_connection_returns_its_tabs_only() {
        let routes = Routes::new();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        routes.register(TargetId::new(1), 1, &tx1).await;
        routes.register(TargetId::new(2), 1, &tx1).await;
        routes.register(TargetId::new(3), 2, &tx2).await;

        let mut gone = routes.drop_connection(1).await;
        gone.sort();
        assert_eq!(gone, vec![TargetId::new(1), TargetId::new(2)]);
        assert_eq!(routes.len().await, 1);
    }
}
