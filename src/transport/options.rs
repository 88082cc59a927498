//! WebChannel bridge configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use firefox_profiler_connection::BridgeOptions;
//!
//! let options = BridgeOptions::new()
//!     .with_port(9120)
//!     .with_request_timeout(Duration::from_secs(60));
//!
//! options.validate()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default time to wait for the bridge to connect and send READY.
pub const DEFAULT_ACCEPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time to wait for the host to answer one request.
///
/// Profiles can be large, so this is generous.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Default limit on requests awaiting a response.
pub const DEFAULT_MAX_PENDING_REQUESTS: usize = 100;

// ============================================================================
// BridgeOptions
// ============================================================================

/// Where the bridge server listens and how long it waits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Address to bind to.
    pub ip: IpAddr,

    /// Port to bind to (0 = OS-assigned).
    pub port: u16,

    /// Time allowed for the bridge to connect and complete READY.
    pub accept_timeout: Duration,

    /// Time allowed for the host to answer a single request.
    pub request_timeout: Duration,

    /// Requests allowed in flight at once.
    pub max_pending_requests: usize,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl BridgeOptions {
    /// Creates options bound to a random localhost port.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            accept_timeout: DEFAULT_ACCEPT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_pending_requests: DEFAULT_MAX_PENDING_REQUESTS,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl BridgeOptions {
    /// Sets the bind address.
    #[inline]
    #[must_use]
    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ip = ip;
        self
    }

    /// Sets the bind port.
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the accept timeout.
    #[inline]
    #[must_use]
    pub fn with_accept_timeout(mut self, timeout: Duration) -> Self {
        self.accept_timeout = timeout;
        self
    }

    /// Sets the per-request timeout.
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the pending request limit.
    #[inline]
    #[must_use]
    pub fn with_max_pending_requests(mut self, max: usize) -> Self {
        self.max_pending_requests = max;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl BridgeOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a timeout is zero or no request may be
    /// pending.
    pub fn validate(&self) -> Result<()> {
        if self.accept_timeout.is_zero() {
            return Err(Error::config("Accept timeout must be greater than zero"));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::config("Request timeout must be greater than zero"));
        }
        if self.max_pending_requests == 0 {
            return Err(Error::config(
                "Pending request limit must be greater than zero",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BridgeOptions::default();
        assert_eq!(options.ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(options.port, 0);
        assert_eq!(options.accept_timeout, DEFAULT_ACCEPT_TIMEOUT);
        assert_eq!(options.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(options.max_pending_requests, 100);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let options = BridgeOptions::new()
            .with_ip(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
            .with_port(9120)
            .with_accept_timeout(Duration::from_secs(5))
            .with_request_timeout(Duration::from_secs(10))
            .with_max_pending_requests(4);

        assert_eq!(options.port, 9120);
        assert_eq!(options.accept_timeout.as_secs(), 5);
        assert_eq!(options.request_timeout.as_secs(), 10);
        assert_eq!(options.max_pending_requests, 4);
    }

    #[test]
    fn test_validate_zero_request_timeout() {
        let options = BridgeOptions::new().with_request_timeout(Duration::ZERO);
        let err = options.validate().unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_validate_zero_accept_timeout() {
        let options = BridgeOptions::new().with_accept_timeout(Duration::ZERO);
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_validate_zero_pending_limit() {
        let options = BridgeOptions::new().with_max_pending_requests(0);
        assert!(options.validate().is_err());
    }
}
