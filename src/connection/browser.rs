//! The connection facade handed out once negotiation succeeds.
//!
//! A [`BrowserConnection`] only exists when a WebChannel answered the
//! capability query. That WebChannel may still be an old one that cannot
//! deliver profiles or symbol tables, so the facade can also fall back to the
//! in-page [`LegacyProfiler`] object.
//!
//! # Dispatch
//!
//! Each retrieval picks its path per call:
//!
//! 1. Direct WebChannel request, if the host advertised support
//! 2. The legacy profiler, if one was recorded
//! 3. Otherwise [`Error::Config`]
//!
//! The direct path wins even when a legacy profiler is also present.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::{ProfileData, SymbolTable};

use super::channel::{LegacyProfiler, WebChannel};

// ============================================================================
// Constants
// ============================================================================

/// How long to wait for the legacy profiler before notifying the caller.
pub const LEGACY_PROFILER_TIMEOUT: Duration = Duration::from_millis(30_000);

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the connection.
struct BrowserConnectionInner {
    /// Whether the WebChannel serves profiles and symbol tables itself.
    supports_direct_retrieval: bool,

    /// The negotiated WebChannel.
    channel: Arc<dyn WebChannel>,

    /// Legacy profiler, recorded at most once.
    legacy: OnceLock<Arc<dyn LegacyProfiler>>,
}

// ============================================================================
// BrowserConnection
// ============================================================================

/// Uniform access to the host browser's profile and symbol tables.
///
/// Cloning is cheap and every clone shares the recorded legacy profiler.
///
/// # Example
///
/// ```ignore
/// if let ConnectionOutcome::Established(connection) = establish(user_agent, channel).await {
///     let table = connection.get_symbol_table("libxul.so", "ABCD1234").await?;
/// }
/// ```
#[derive(Clone)]
pub struct BrowserConnection {
    /// Shared inner state.
    inner: Arc<BrowserConnectionInner>,
}

// ============================================================================
// BrowserConnection - Display
// ============================================================================

impl fmt::Debug for BrowserConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserConnection")
            .field(
                "supports_direct_retrieval",
                &self.inner.supports_direct_retrieval,
            )
            .field("has_legacy_profiler", &self.has_legacy_profiler())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// BrowserConnection - Construction
// ============================================================================

impl BrowserConnection {
    /// Creates a connection over `channel`.
    ///
    /// `supports_direct_retrieval` is the capability query's answer and is
    /// fixed for the lifetime of the connection.
    #[must_use]
    pub fn new(supports_direct_retrieval: bool, channel: Arc<dyn WebChannel>) -> Self {
        Self {
            inner: Arc::new(BrowserConnectionInner {
                supports_direct_retrieval,
                channel,
                legacy: OnceLock::new(),
            }),
        }
    }

    /// Returns `true` if the WebChannel serves profiles and symbol tables.
    #[inline]
    #[must_use]
    pub fn supports_direct_retrieval(&self) -> bool {
        self.inner.supports_direct_retrieval
    }

    /// Returns `true` once a legacy profiler has been recorded.
    #[inline]
    #[must_use]
    pub fn has_legacy_profiler(&self) -> bool {
        self.inner.legacy.get().is_some()
    }
}

// ============================================================================
// BrowserConnection - Legacy Profiler
// ============================================================================

impl BrowserConnection {
    /// Waits for the host page's legacy profiler and records it.
    ///
    /// Only needed when the profile must come from the browser. `legacy`
    /// resolves to the object the page exposes, or `None` if it has none.
    /// If it is still pending after [`LEGACY_PROFILER_TIMEOUT`],
    /// `on_long_timeout` is invoked once and waiting continues.
    ///
    /// A profiler recorded by an earlier call is never replaced. Each call
    /// arms its own timer.
    pub async fn connect_via_legacy_if_needed<F, T>(&self, legacy: F, on_long_timeout: T)
    where
        F: Future<Output = Option<Arc<dyn LegacyProfiler>>>,
        T: FnOnce(),
    {
        debug!("Waiting for legacy profiler");

        tokio::pin!(legacy);

        let resolved = tokio::select! {
            profiler = &mut legacy => profiler,
            () = sleep(LEGACY_PROFILER_TIMEOUT) => {
                warn!(
                    timeout_ms = LEGACY_PROFILER_TIMEOUT.as_millis() as u64,
                    "Legacy profiler still pending"
                );
                on_long_timeout();
                legacy.await
            }
        };

        let Some(profiler) = resolved else {
            debug!("Host exposed no legacy profiler");
            return;
        };

        if self.inner.legacy.set(profiler).is_ok() {
            info!("Legacy profiler recorded");
        } else {
            debug!("Legacy profiler already recorded, keeping the first one");
        }
    }
}

// ============================================================================
// BrowserConnection - Retrieval
// ============================================================================

impl BrowserConnection {
    /// Gets the profile for this tab from the browser.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if there is neither direct support nor a legacy profiler
    /// - Any error from the transport that served the request, unchanged
    pub async fn get_profile(&self) -> Result<ProfileData> {
        if self.inner.supports_direct_retrieval {
            debug!(path = "webchannel", "Requesting profile");
            return self.inner.channel.request_profile().await;
        }

        if let Some(legacy) = self.inner.legacy.get() {
            debug!(path = "legacy", "Requesting profile");
            return legacy.get_profile().await;
        }

        Err(Error::config(
            "Cannot obtain a profile: have neither WebChannel nor a GeckoProfiler object",
        ))
    }

    /// Gets a symbol table from the browser.
    ///
    /// # Arguments
    ///
    /// * `debug_name` - Module name, e.g. `libxul.so`
    /// * `breakpad_id` - Content-derived build identifier of the module
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if there is neither direct support nor a legacy profiler
    /// - Any error from the transport that served the request, unchanged
    pub async fn get_symbol_table(
        &self,
        debug_name: &str,
        breakpad_id: &str,
    ) -> Result<SymbolTable> {
        if self.inner.supports_direct_retrieval {
            debug!(path = "webchannel", debug_name, breakpad_id, "Requesting symbol table");
            return self
                .inner
                .channel
                .request_symbol_table(debug_name, breakpad_id)
                .await;
        }

        if let Some(legacy) = self.inner.legacy.get() {
            debug!(path = "legacy", debug_name, breakpad_id, "Requesting symbol table");
            return legacy.get_symbol_table(debug_name, breakpad_id).await;
        }

        Err(Error::config(
            "Cannot obtain a symbol table: have neither WebChannel nor a GeckoProfiler object",
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
