//! Transport traits consumed by the connection facade.
//!
//! [`WebChannel`] is the message-passing channel to the host process.
//! [`LegacyProfiler`] is the older in-page object that hosts without direct
//! retrieval support expose instead.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::{ProfileData, SymbolTable};

// ============================================================================
// WebChannel
// ============================================================================

/// Message channel between the profiler and the host browser.
#[async_trait]
pub trait WebChannel: Send + Sync {
    /// Asks whether the channel can deliver profiles and symbol tables itself.
    ///
    /// # Errors
    ///
    /// Fails if the host denies the channel or never validates the origin.
    async fn query_supports_direct_retrieval(&self) -> Result<bool>;

    /// Retrieves the captured profile.
    async fn request_profile(&self) -> Result<ProfileData>;

    /// Retrieves the symbol table of one binary module.
    async fn request_symbol_table(
        &self,
        debug_name: &str,
        breakpad_id: &str,
    ) -> Result<SymbolTable>;
}

// ============================================================================
// LegacyProfiler
// ============================================================================

/// In-page profiler object exposed by hosts that predate direct retrieval.
#[async_trait]
pub trait LegacyProfiler: Send + Sync {
    /// Retrieves the captured profile.
    async fn get_profile(&self) -> Result<ProfileData>;

    /// Retrieves the symbol table of one binary module.
    async fn get_symbol_table(&self, debug_name: &str, breakpad_id: &str) -> Result<SymbolTable>;
}
