//! Browser connection negotiation.
//!
//! This module decides, once per process, how the profiler talks to the
//! host Firefox, and hides that decision behind [`BrowserConnection`].
//!
//! # Flow
//!
//! 1. [`establish`] checks the user agent and sends one capability query
//! 2. The query races a fixed 5 second timer
//! 3. The result is classified into a [`ConnectionOutcome`]
//! 4. [`ConnectionOutcome::Established`] carries the [`BrowserConnection`]
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `browser` | The [`BrowserConnection`] facade |
//! | `channel` | Transport traits consumed by the facade |
//! | `probe` | Capability probe and [`ConnectionOutcome`] |

// ============================================================================
// Submodules
// ============================================================================

/// Connection facade with direct and legacy retrieval paths.
pub mod browser;

/// Transport traits.
pub mod channel;

/// Capability probe.
pub mod probe;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use browser::{BrowserConnection, LEGACY_PROFILER_TIMEOUT};
pub use channel::{LegacyProfiler, WebChannel};
pub use probe::{ConnectionOutcome, PROBE_TIMEOUT, establish, establish_with_bridge, is_firefox};
