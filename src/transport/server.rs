//! WebSocket server the WebChannel bridge connects to.
//!
//! # Connection Flow
//!
//! 1. Rust binds the server (random port by default)
//! 2. The bridge is pointed at [`PendingServer::ws_url`]
//! 3. The bridge connects and sends READY with the page's user agent
//! 4. Connection established, ready for WebChannel requests

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::connection::{Connection, ReadyData};
use super::options::BridgeOptions;

// ============================================================================
// PendingServer
// ============================================================================

/// A WebSocket server that is bound but not yet connected.
///
/// # Example
///
/// ```ignore
/// use firefox_profiler_connection::{BridgeOptions, PendingServer};
///
/// let server = PendingServer::bind(BridgeOptions::new()).await?;
/// println!("point the bridge at {}", server.ws_url());
///
/// let (connection, ready) = server.accept().await?;
/// ```
pub struct PendingServer {
    /// TCP listener for incoming connections.
    listener: TcpListener,
    /// Address the server is bound to.
    local_addr: SocketAddr,
    /// Timeouts and limits for the accepted connection.
    options: BridgeOptions,
}

impl PendingServer {
    /// Binds the server as described by `options`.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the options are invalid
    /// - [`Error::Io`] if binding fails
    pub async fn bind(options: BridgeOptions) -> Result<Self> {
        options.validate()?;

        let listener = TcpListener::bind(SocketAddr::new(options.ip, options.port)).await?;
        let local_addr = listener.local_addr()?;

        debug!(port = local_addr.port(), "WebSocket server bound");

        Ok(Self {
            listener,
            local_addr,
            options,
        })
    }

    /// Returns the port the server is bound to.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Returns the local socket address.
    #[inline]
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the WebSocket URL for this server.
    ///
    /// Format: `ws://{ip}:{port}`
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.local_addr)
    }

    /// Accepts the bridge and completes the handshake.
    ///
    /// Connecting and READY share [`BridgeOptions::accept_timeout`] each.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if the bridge doesn't connect or send READY in time
    /// - [`Error::Connection`] if WebSocket upgrade fails
    /// - [`Error::ConnectionClosed`] if the bridge disconnects before READY
    pub async fn accept(self) -> Result<(Connection, ReadyData)> {
        let accept_timeout = self.options.accept_timeout;

        let (stream, addr) = timeout(accept_timeout, self.listener.accept())
            .await
            .map_err(|_| Error::connection_timeout(accept_timeout.as_millis() as u64))??;

        debug!(?addr, "TCP connection accepted");

        let ws_stream = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| Error::connection(format!("WebSocket upgrade failed: {e}")))?;

        info!(port = self.local_addr.port(), "WebChannel bridge connected");

        let connection = Connection::new(
            ws_stream,
            self.options.request_timeout,
            self.options.max_pending_requests,
        );
        let ready_data = connection.wait_ready(accept_timeout).await?;

        Ok((connection, ready_data))
    }
}

// ============================================================================
// Tests
// ============================================================================
