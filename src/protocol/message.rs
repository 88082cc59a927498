//! Inbound WebChannel messages.
//!
//! The host answers every request with either `SUCCESS_RESPONSE` or
//! `ERROR_RESPONSE`. A channel-level error (`{errno, error}`) arrives
//! without a request id when the host refuses the channel outright, for
//! example because the page origin is not trusted.
//!
//! The bridge forwarding the channel announces itself with a `READY`
//! message carrying the page's user agent.

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::identifiers::RequestId;

// ============================================================================
// InboundEnvelope
// ============================================================================

/// A message received from the host.
///
/// # Format
///
/// ```json
/// { "id": "profiler.firefox.com", "message": { "type": "SUCCESS_RESPONSE", "requestId": 0, "response": {} } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEnvelope {
    /// WebChannel id the message was sent on.
    pub id: String,

    /// Message body.
    pub message: Inbound,
}

// ============================================================================
// Inbound
// ============================================================================

/// Body of an inbound message.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Inbound {
    /// Typed message (handshake or response).
    Message(ChannelMessage),

    /// The host refused the channel.
    ChannelError {
        /// Host error number.
        errno: i64,
        /// Host error text, e.g. `No Such Channel`.
        error: String,
    },
}

// ============================================================================
// ChannelMessage
// ============================================================================

/// Typed inbound message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ChannelMessage {
    /// Bridge handshake, sent once after connecting.
    #[serde(rename = "READY")]
    Ready {
        /// User agent of the page the bridge runs in.
        #[serde(rename = "userAgent")]
        user_agent: String,
    },

    /// Successful response to a request.
    #[serde(rename = "SUCCESS_RESPONSE")]
    Success {
        /// Id of the answered request.
        #[serde(rename = "requestId")]
        request_id: RequestId,
        /// Response payload.
        #[serde(default)]
        response: Value,
    },

    /// Failed response to a request.
    #[serde(rename = "ERROR_RESPONSE")]
    Failure {
        /// Id of the answered request.
        #[serde(rename = "requestId")]
        request_id: RequestId,
        /// Error text from the host.
        error: String,
    },
}

// ============================================================================
// StatusQueryResponse
// ============================================================================

/// Payload of a `STATUS_QUERY` response.
///
/// Hosts that predate versioning omit `version`, which reads as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct StatusQueryResponse {
    /// WebChannel protocol version.
    #[serde(default)]
    pub version: u32,

    /// Whether the profiler menu button is enabled.
    #[serde(rename = "menuButtonIsEnabled", default)]
    pub menu_button_is_enabled: bool,
}

impl StatusQueryResponse {
    /// Version 1 introduced `GET_PROFILE` and `GET_SYMBOL_TABLE`.
    #[inline]
    #[must_use]
    pub const fn supports_direct_retrieval(&self) -> bool {
        self.version >= 1
    }
}

// ============================================================================
// Tests
// ============================================================================
