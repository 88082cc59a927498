//! WebSocket transport for the profiler WebChannel.
//!
//! A bridge running next to the host browser forwards WebChannel traffic
//! over a WebSocket. This module accepts that bridge and exposes it as a
//! [`WebChannel`](crate::connection::WebChannel).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Profiler       │                              │  Bridge         │
//! │  (Rust)         │         WebSocket            │  (page)         │
//! │  PendingServer  │◄────────────────────────────►│                 │
//! │  → Connection   │      localhost:PORT          │  WebChannel ⇄   │
//! │                 │                              │  Firefox        │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `PendingServer::bind` - Bind with [`BridgeOptions`]
//! 2. Point the bridge at `PendingServer::ws_url`
//! 3. `PendingServer::accept` - Wait for the bridge and its READY message
//! 4. `Connection` - Send WebChannel requests, receive responses
//! 5. `Connection::shutdown` - Close the connection
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |
//! | `options` | Bridge configuration |
//! | `server` | WebSocket server binding and acceptance |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// Bridge configuration.
pub mod options;

/// WebSocket server the bridge connects to.
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, ReadyData};
pub use options::BridgeOptions;
pub use server::PendingServer;
