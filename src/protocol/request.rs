//! Outbound WebChannel requests.
//!
//! Every request travels inside an envelope addressed to the profiler
//! WebChannel and carries a `requestId` used to correlate the response.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::identifiers::RequestId;

use super::WEB_CHANNEL_ID;

// ============================================================================
// Request
// ============================================================================

/// A request the profiler can send to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Ask which WebChannel version the host implements.
    #[serde(rename = "STATUS_QUERY")]
    StatusQuery,

    /// Retrieve the captured profile.
    #[serde(rename = "GET_PROFILE")]
    GetProfile,

    /// Retrieve the symbol table for one binary module.
    #[serde(rename = "GET_SYMBOL_TABLE")]
    GetSymbolTable {
        /// Module name, e.g. `libxul.so`.
        #[serde(rename = "debugName")]
        debug_name: String,
        /// Content-derived build identifier of the module.
        #[serde(rename = "breakpadId")]
        breakpad_id: String,
    },
}

impl Request {
    /// Returns the wire name of the request type.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::StatusQuery => "STATUS_QUERY",
            Self::GetProfile => "GET_PROFILE",
            Self::GetSymbolTable { .. } => "GET_SYMBOL_TABLE",
        }
    }
}

// ============================================================================
// OutboundMessage
// ============================================================================

/// A request wrapped for delivery over the WebChannel.
///
/// # Format
///
/// ```json
/// {
///   "id": "profiler.firefox.com",
///   "message": { "type": "GET_SYMBOL_TABLE", "requestId": 3, "debugName": "...", "breakpadId": "..." }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    /// WebChannel id, always [`WEB_CHANNEL_ID`].
    pub id: &'static str,

    /// Request body.
    pub message: RequestMessage,
}

/// Request body with its correlation id.
#[derive(Debug, Clone, Serialize)]
pub struct RequestMessage {
    /// Correlation id echoed back in the response.
    #[serde(rename = "requestId")]
    pub request_id: RequestId,

    /// The request itself.
    #[serde(flatten)]
    pub request: Request,
}

impl OutboundMessage {
    /// Wraps a request for the profiler WebChannel.
    #[inline]
    #[must_use]
    pub fn new(request_id: RequestId, request: Request) -> Self {
        Self {
            id: WEB_CHANNEL_ID,
            message: RequestMessage {
                request_id,
                request,
            },
        }
    }

    /// Returns the correlation id.
    #[inline]
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.message.request_id
    }
}

// ============================================================================
// Tests
// ============================================================================
