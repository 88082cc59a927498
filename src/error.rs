//! Error types for the profiler browser connection.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use firefox_profiler_connection::{BrowserConnection, Result};
//!
//! async fn example(connection: &BrowserConnection) -> Result<()> {
//!     let table = connection.get_symbol_table("libxul.so", "ABCD1234").await?;
//!     println!("{} symbols", table.len());
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Negotiation | [`Error::Denied`] |
//! | Host | [`Error::Channel`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::Protocol`], [`Error::RequestTimeout`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::ChannelClosed`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::RequestId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when an operation has no usable transport, or when bridge
    /// options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Negotiation Errors
    // ========================================================================
    /// The host answered the capability query with a failure.
    ///
    /// Usually the profiler is served from a host other than the one the
    /// browser trusts for its WebChannel.
    #[error(
        "This profiler instance was unable to connect to the WebChannel. \
         This usually means that it's running on a different host from the one \
         that is specified in the preference devtools.performance.recording.ui-base-url. \
         If you would like to capture new profiles with this instance, you can go \
         to about:config and change the preference. Error: {}: {}",
        .cause.name(),
        .cause.message()
    )]
    Denied {
        /// The failure reported by the channel.
        #[source]
        cause: Box<Error>,
    },

    // ========================================================================
    // Host Errors
    // ========================================================================
    /// The host rejected a request.
    ///
    /// Returned for `ERROR_RESPONSE` replies and channel-level errors.
    #[error("WebChannel error: {name}: {message}")]
    Channel {
        /// Name of the failure as reported by the host.
        name: String,
        /// Message reported by the host.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection timeout waiting for the bridge.
    ///
    /// Returned when the bridge does not connect or send READY in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// WebSocket connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected response.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// Request timeout.
    ///
    /// Returned when the host does not answer a request in time.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wraps a capability query failure in the denial diagnostic.
    #[inline]
    pub fn denied(cause: Error) -> Self {
        Self::Denied {
            cause: Box::new(cause),
        }
    }

    /// Creates a host channel error.
    #[inline]
    pub fn channel(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Channel {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Identity
// ============================================================================

impl Error {
    /// Returns a short name identifying the kind of failure.
    ///
    /// For [`Error::Channel`] this is the name reported by the host.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Config { .. } => "ConfigurationError",
            Self::Denied { .. } => "DeniedError",
            Self::Channel { name, .. } => name,
            Self::Connection { .. } => "ConnectionError",
            Self::ConnectionTimeout { .. } => "ConnectionTimeoutError",
            Self::ConnectionClosed => "ConnectionClosedError",
            Self::Protocol { .. } => "ProtocolError",
            Self::RequestTimeout { .. } => "RequestTimeoutError",
            Self::Io(_) => "IoError",
            Self::Json(_) => "JsonError",
            Self::WebSocket(_) => "WebSocketError",
            Self::ChannelClosed(_) => "ChannelClosedError",
        }
    }

    /// Returns the failure message without the category prefix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Config { message }
            | Self::Channel { message, .. }
            | Self::Connection { message }
            | Self::Protocol { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if no transport was available for the operation.
    #[inline]
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
