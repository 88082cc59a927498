//! Firefox Profiler browser connection.
//!
//! This library negotiates how a profiler front-end talks to the host
//! Firefox, so the rest of the application can fetch the captured profile
//! and symbol tables without caring which transport won.
//!
//! # Architecture
//!
//! - **Capability probe**: one `STATUS_QUERY` over the WebChannel, raced
//!   against a 5 second timer, classified into a [`ConnectionOutcome`]
//! - **Connection facade**: [`BrowserConnection`] serves profiles and
//!   symbol tables from the WebChannel when the host supports it, and
//!   from the legacy in-page profiler object otherwise
//! - **Bridge transport**: a WebSocket server that a page-side bridge
//!   connects to, implementing [`WebChannel`]
//!
//! Negotiation never fails with an error: not-Firefox, denied, timed out
//! and established are all [`ConnectionOutcome`] variants.
//!
//! # Quick Start
//!
//! ```no_run
//! use firefox_profiler_connection::{
//!     BridgeOptions, ConnectionOutcome, PendingServer, Result, establish_with_bridge,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let server = PendingServer::bind(BridgeOptions::new()).await?;
//!     println!("Bridge URL: {}", server.ws_url());
//!
//!     match establish_with_bridge(server).await? {
//!         ConnectionOutcome::Established(connection) => {
//!             let table = connection.get_symbol_table("libxul.so", "ABCD1234").await?;
//!             println!("{} symbols", table.len());
//!         }
//!         other => println!("No connection: {}", other.status()),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`connection`] | Probe, [`ConnectionOutcome`], [`BrowserConnection`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | WebChannel message types |
//! | [`transport`] | WebSocket bridge transport |

// ============================================================================
// Modules
// ============================================================================

/// Capability probe and connection facade.
///
/// - [`establish`] - Negotiates once and returns a [`ConnectionOutcome`]
/// - [`BrowserConnection`] - Uniform profile and symbol table access
pub mod connection;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// WebChannel protocol message types.
pub mod protocol;

/// WebSocket bridge transport.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Connection types
pub use connection::{
    BrowserConnection, ConnectionOutcome, LEGACY_PROFILER_TIMEOUT, LegacyProfiler, PROBE_TIMEOUT,
    WebChannel, establish, establish_with_bridge, is_firefox,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::RequestId;

// Protocol types
pub use protocol::{ProfileData, SymbolTable};

// Transport types
pub use transport::{BridgeOptions, Connection, PendingServer, ReadyData};
