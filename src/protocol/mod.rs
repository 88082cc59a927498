//! WebChannel protocol message types.
//!
//! This module defines the message format spoken between the profiler
//! (Rust) and the host browser's `profiler.firefox.com` WebChannel.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | [`OutboundMessage`] | Profiler → Host | Request with correlation id |
//! | [`InboundEnvelope`] | Host → Profiler | Handshake, response, or channel error |
//!
//! # Request Types
//!
//! - `STATUS_QUERY`
//! - `GET_PROFILE`
//! - `GET_SYMBOL_TABLE`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `data` | Profile and symbol table payloads |
//! | `message` | Inbound envelopes and responses |
//! | `request` | Outbound requests |

// ============================================================================
// Constants
// ============================================================================

/// Identifier of the profiler WebChannel registered by Firefox.
pub const WEB_CHANNEL_ID: &str = "profiler.firefox.com";

// ============================================================================
// Submodules
// ============================================================================

/// Profile and symbol table payloads.
pub mod data;

/// Inbound message types.
pub mod message;

/// Outbound request types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use data::{ProfileData, SymbolTable};
pub use message::{ChannelMessage, Inbound, InboundEnvelope, StatusQueryResponse};
pub use request::{OutboundMessage, Request};
