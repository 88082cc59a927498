//! WebSocket connection to a WebChannel bridge.
//!
//! The bridge forwards profiler WebChannel messages between the host
//! browser and this process. This module correlates requests with their
//! responses and implements [`WebChannel`] on top of that.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that handles:
//!
//! - The READY handshake
//! - Responses from the host, routed by `requestId`
//! - Channel-level errors, which fail every pending request
//! - Outgoing requests from the Rust API

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, from_str, from_value, to_string};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, trace, warn};

use crate::connection::WebChannel;
use crate::error::{Error, Result};
use crate::identifiers::{RequestId, RequestIdGenerator};
use crate::protocol::{
    ChannelMessage, Inbound, InboundEnvelope, OutboundMessage, ProfileData, Request,
    StatusQueryResponse, SymbolTable, WEB_CHANNEL_ID,
};

// ============================================================================
// Constants
// ============================================================================

/// Error name reported for host-side failures.
const WEB_CHANNEL_ERROR: &str = "WebChannelError";

// ============================================================================
// Types
// ============================================================================

/// Map of request IDs to response channels.
type CorrelationMap = FxHashMap<RequestId, oneshot::Sender<Result<Value>>>;

// ============================================================================
// ReadyData
// ============================================================================

/// Data received in the READY handshake message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyData {
    /// User agent of the page the bridge runs in.
    pub user_agent: String,
}

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Write a request whose correlation entry is already registered.
    Send { message: OutboundMessage },
    /// Shutdown the connection.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// WebSocket connection to a WebChannel bridge.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync` and can be shared across tasks.
/// Clones share the same event loop.
#[derive(Clone)]
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Correlation map (shared with event loop).
    correlation: Arc<Mutex<CorrelationMap>>,
    /// READY handshake receiver, taken by the first `wait_ready`.
    ready_rx: Arc<Mutex<Option<oneshot::Receiver<ReadyData>>>>,
    /// Request id source.
    ids: Arc<RequestIdGenerator>,
    /// Time allowed for one response.
    request_timeout: Duration,
    /// Maximum requests awaiting a response.
    max_pending: usize,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("pending", &self.pending_count())
            .field("request_timeout", &self.request_timeout)
            .field("max_pending", &self.max_pending)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Creates a new connection from a WebSocket stream.
    ///
    /// Spawns the event loop task internally.
    pub(crate) fn new(
        ws_stream: WebSocketStream<TcpStream>,
        request_timeout: Duration,
        max_pending: usize,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&correlation),
            ready_tx,
        ));

        Self {
            command_tx,
            correlation,
            ready_rx: Arc::new(Mutex::new(Some(ready_rx))),
            ids: Arc::new(RequestIdGenerator::new()),
            request_timeout,
            max_pending,
        }
    }

    /// Waits for the READY handshake message.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if READY is not received in time
    /// - [`Error::ConnectionClosed`] if the connection closes first
    /// - [`Error::Protocol`] if READY was already consumed
    pub async fn wait_ready(&self, ready_timeout: Duration) -> Result<ReadyData> {
        let ready_rx = self
            .ready_rx
            .lock()
            .take()
            .ok_or_else(|| Error::protocol("READY handshake already consumed"))?;

        let ready = timeout(ready_timeout, ready_rx)
            .await
            .map_err(|_| Error::connection_timeout(ready_timeout.as_millis() as u64))?
            .map_err(|_| Error::ConnectionClosed)?;

        debug!(user_agent = %ready.user_agent, "READY handshake completed");

        Ok(ready)
    }

    /// Sends a request and waits for its response payload.
    ///
    /// If the returned future is dropped early, the correlation entry is
    /// removed and a late response is discarded.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if connection is closed
    /// - [`Error::RequestTimeout`] if response not received within timeout
    /// - [`Error::Protocol`] if too many pending requests
    /// - [`Error::Channel`] if the host answered with an error
    pub async fn send(&self, request: Request) -> Result<Value> {
        let request_id = self.ids.generate();
        let kind = request.kind();
        let (response_tx, response_rx) = oneshot::channel();

        // Registered before queuing so concurrent callers see each other.
        {
            let mut correlation = self.correlation.lock();
            if correlation.len() >= self.max_pending {
                warn!(
                    pending = correlation.len(),
                    max = self.max_pending,
                    "Too many pending requests"
                );
                return Err(Error::protocol(format!(
                    "Too many pending requests: {}/{}",
                    correlation.len(),
                    self.max_pending
                )));
            }
            correlation.insert(request_id, response_tx);
        }

        let _guard = PendingRequest {
            request_id,
            correlation: &self.correlation,
        };

        self.command_tx
            .send(ConnectionCommand::Send {
                message: OutboundMessage::new(request_id, request),
            })
            .map_err(|_| Error::ConnectionClosed)?;

        trace!(%request_id, kind, "Request queued");

        match timeout(self.request_timeout, response_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => Err(Error::request_timeout(
                request_id,
                self.request_timeout.as_millis() as u64,
            )),
        }
    }

    /// Sends `STATUS_QUERY` and parses the host's status.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::send`], plus [`Error::Json`] for a malformed
    /// status payload.
    pub async fn status_query(&self) -> Result<StatusQueryResponse> {
        let value = self.send(Request::StatusQuery).await?;
        Ok(from_value(value)?)
    }

    /// Returns the number of pending requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlation.lock().len()
    }

    /// Shuts down the connection gracefully.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        ws_stream: WebSocketStream<TcpStream>,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        correlation: Arc<Mutex<CorrelationMap>>,
        ready_tx: oneshot::Sender<ReadyData>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();
        let mut ready_tx = Some(ready_tx);

        loop {
            tokio::select! {
                // Incoming messages from the bridge
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming_message(&text, &correlation, &mut ready_tx);
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Commands from Rust API
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { message }) => {
                            Self::handle_send_command(message, &mut ws_write, &correlation).await;
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        Self::fail_pending_requests(&correlation, || Error::ConnectionClosed);

        debug!("Event loop terminated");
    }

    /// Handles an incoming text message from the bridge.
    fn handle_incoming_message(
        text: &str,
        correlation: &Arc<Mutex<CorrelationMap>>,
        ready_tx: &mut Option<oneshot::Sender<ReadyData>>,
    ) {
        let envelope = match from_str::<InboundEnvelope>(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, text = %text, "Failed to parse incoming message");
                return;
            }
        };

        if envelope.id != WEB_CHANNEL_ID {
            warn!(id = %envelope.id, "Message for another WebChannel");
            return;
        }

        match envelope.message {
            Inbound::Message(ChannelMessage::Ready { user_agent }) => match ready_tx.take() {
                Some(tx) => {
                    let _ = tx.send(ReadyData { user_agent });
                }
                None => warn!("Duplicate READY message"),
            },

            Inbound::Message(ChannelMessage::Success {
                request_id,
                response,
            }) => Self::resolve(correlation, request_id, Ok(response)),

            Inbound::Message(ChannelMessage::Failure { request_id, error }) => {
                Self::resolve(
                    correlation,
                    request_id,
                    Err(Error::channel(WEB_CHANNEL_ERROR, error)),
                );
            }

            Inbound::ChannelError { errno, error } => {
                warn!(errno, error = %error, "WebChannel error");
                Self::fail_pending_requests(correlation, || {
                    Error::channel(WEB_CHANNEL_ERROR, error.clone())
                });
            }
        }
    }

    /// Delivers a result to the waiting request, if any.
    fn resolve(
        correlation: &Arc<Mutex<CorrelationMap>>,
        request_id: RequestId,
        result: Result<Value>,
    ) {
        let tx = correlation.lock().remove(&request_id);

        if let Some(tx) = tx {
            let _ = tx.send(result);
        } else {
            warn!(%request_id, "Response for unknown request");
        }
    }

    /// Handles a send command from the Rust API.
    async fn handle_send_command(
        message: OutboundMessage,
        ws_write: &mut futures_util::stream::SplitSink<WebSocketStream<TcpStream>, Message>,
        correlation: &Arc<Mutex<CorrelationMap>>,
    ) {
        let request_id = message.request_id();

        let result = match to_string(&message) {
            Ok(json) => ws_write
                .send(Message::Text(json.into()))
                .await
                .map_err(|e| Error::connection(e.to_string())),
            Err(e) => Err(Error::Json(e)),
        };

        match result {
            Ok(()) => trace!(%request_id, "Request sent"),
            Err(e) => {
                if let Some(tx) = correlation.lock().remove(&request_id) {
                    let _ = tx.send(Err(e));
                }
            }
        }
    }

    /// Fails all pending requests.
    fn fail_pending_requests(
        correlation: &Arc<Mutex<CorrelationMap>>,
        make_error: impl Fn() -> Error,
    ) {
        let pending: Vec<_> = correlation.lock().drain().collect();
        let count = pending.len();

        for (_, tx) in pending {
            let _ = tx.send(Err(make_error()));
        }

        if count > 0 {
            debug!(count, "Failed pending requests");
        }
    }
}

// ============================================================================
// PendingRequest
// ============================================================================

/// Removes the correlation entry of a request whose caller stopped waiting.
///
/// Entries answered by the host are already gone, so removal is a no-op.
struct PendingRequest<'a> {
    request_id: RequestId,
    correlation: &'a Arc<Mutex<CorrelationMap>>,
}

impl Drop for PendingRequest<'_> {
    fn drop(&mut self) {
        if self.correlation.lock().remove(&self.request_id).is_some() {
            debug!(request_id = %self.request_id, "Removed abandoned correlation");
        }
    }
}

// ============================================================================
// WebChannel
// ============================================================================

#[async_trait]
impl WebChannel for Connection {
    async fn query_supports_direct_retrieval(&self) -> Result<bool> {
        let status = self.status_query().await?;
        debug!(version = status.version, "WebChannel status");
        Ok(status.supports_direct_retrieval())
    }

    async fn request_profile(&self) -> Result<ProfileData> {
        let value = self.send(Request::GetProfile).await?;
        ProfileData::from_response(value)
    }

    async fn request_symbol_table(
        &self,
        debug_name: &str,
        breakpad_id: &str,
    ) -> Result<SymbolTable> {
        let value = self
            .send(Request::GetSymbolTable {
                debug_name: debug_name.to_string(),
                breakpad_id: breakpad_id.to_string(),
            })
            .await?;
        SymbolTable::from_response(value)
    }
}
