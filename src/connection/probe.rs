//! Capability probe.
//!
//! Decides which transport the host browser supports and reports the
//! decision as a [`ConnectionOutcome`]. Every failure is encoded as a
//! variant, so callers handle all paths with one `match`.
//!
//! # Classification
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | User agent is not Firefox | [`ConnectionOutcome::NotFirefox`] |
//! | Query answered with `v` | [`ConnectionOutcome::Established`] (flag `v`) |
//! | Query failed | [`ConnectionOutcome::Denied`] |
//! | No answer within [`PROBE_TIMEOUT`] | [`ConnectionOutcome::TimedOut`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::transport::PendingServer;

use super::browser::BrowserConnection;
use super::channel::WebChannel;

// ============================================================================
// Constants
// ============================================================================

/// How long the host gets to answer the capability query.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Matches a versioned Firefox token, e.g. `Firefox/115.0`.
static FIREFOX_USER_AGENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Firefox/\d+\.\d+").expect("Firefox user agent pattern is valid")
});

// ============================================================================
// ConnectionOutcome
// ============================================================================

/// Result of negotiating with the host browser.
pub enum ConnectionOutcome {
    /// Not running in Firefox, so no connection was attempted.
    NotFirefox,

    /// A capability query is in flight.
    ///
    /// [`establish`] never returns this; it exists for callers that publish
    /// the status before the probe resolves.
    Waiting,

    /// The WebChannel answered with an error.
    ///
    /// Usually the profiler is served from a host other than the one in
    /// `devtools.performance.recording.ui-base-url`.
    Denied {
        /// [`Error::Denied`] wrapping the channel's failure.
        error: Error,
    },

    /// The WebChannel did not answer within [`PROBE_TIMEOUT`].
    ///
    /// Most likely a Firefox older than 76, which has no profiler WebChannel.
    TimedOut,

    /// A WebChannel exists.
    Established(BrowserConnection),
}

impl ConnectionOutcome {
    /// Returns the status name, e.g. `ESTABLISHED`.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::NotFirefox => "NOT_FIREFOX",
            Self::Waiting => "WAITING",
            Self::Denied { .. } => "DENIED",
            Self::TimedOut => "TIMED_OUT",
            Self::Established(_) => "ESTABLISHED",
        }
    }

    /// Returns `true` if a connection was established.
    #[inline]
    #[must_use]
    pub const fn is_established(&self) -> bool {
        matches!(self, Self::Established(_))
    }

    /// Returns the connection, if one was established.
    #[must_use]
    pub fn into_connection(self) -> Option<BrowserConnection> {
        match self {
            Self::Established(connection) => Some(connection),
            _ => None,
        }
    }
}

impl fmt::Debug for ConnectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Denied { error } => f.debug_struct("Denied").field("error", error).finish(),
            Self::Established(connection) => {
                f.debug_tuple("Established").field(connection).finish()
            }
            other => f.write_str(other.status()),
        }
    }
}

// ============================================================================
// Probe
// ============================================================================

/// Returns `true` if `user_agent` names a versioned Firefox.
#[inline]
#[must_use]
pub fn is_firefox(user_agent: &str) -> bool {
    FIREFOX_USER_AGENT.is_match(user_agent)
}

/// Negotiates with the host browser over `channel`.
///
/// Sends exactly one capability query and races it against
/// [`PROBE_TIMEOUT`]. Whichever finishes first decides the outcome; the
/// loser is dropped, so a late answer has no effect.
///
/// Meant to run once per process. Failed attempts are not retried.
pub async fn establish(user_agent: &str, channel: Arc<dyn WebChannel>) -> ConnectionOutcome {
    if !is_firefox(user_agent) {
        debug!(user_agent, "Not Firefox, skipping WebChannel");
        return ConnectionOutcome::NotFirefox;
    }

    debug!(
        timeout_ms = PROBE_TIMEOUT.as_millis() as u64,
        "Querying WebChannel capabilities"
    );

    let result = timeout(PROBE_TIMEOUT, channel.query_supports_direct_retrieval()).await;

    match result {
        Ok(Ok(supports_direct_retrieval)) => {
            info!(supports_direct_retrieval, "WebChannel connection established");
            ConnectionOutcome::Established(BrowserConnection::new(
                supports_direct_retrieval,
                channel,
            ))
        }
        Ok(Err(cause)) => {
            // Every non-timeout failure is reported as a denial.
            warn!(error_name = cause.name(), error = %cause, "WebChannel denied");
            ConnectionOutcome::Denied {
                error: Error::denied(cause),
            }
        }
        Err(_elapsed) => {
            warn!(
                timeout_ms = PROBE_TIMEOUT.as_millis() as u64,
                "WebChannel did not respond"
            );
            ConnectionOutcome::TimedOut
        }
    }
}

/// Accepts a WebChannel bridge and negotiates over it.
///
/// The user agent comes from the bridge's READY handshake.
///
/// # Errors
///
/// Returns an error only if the bridge itself cannot be accepted; the
/// negotiation result is always an [`Ok`] outcome.
pub async fn establish_with_bridge(server: PendingServer) -> Result<ConnectionOutcome> {
    let (connection, ready) = server.accept().await?;
    Ok(establish(&ready.user_agent, Arc::new(connection)).await)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tokio::sync::oneshot;
    use tokio::time::{Instant, sleep};

    use crate::connection::testing::{Call, FIREFOX_115, FakeChannel, QueryReply, direct_table};
    use crate::transport::BridgeOptions;
    use crate::transport::testing::{FakeBridge, HostReply};

    const CHROME_120: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                              (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    #[test]
    fn test_is_firefox() {
        assert!(is_firefox(FIREFOX_115));
        assert!(is_firefox("Firefox/76.0a1"));
        assert!(!is_firefox(CHROME_120));
        assert!(!is_firefox("Firefox/"));
        assert!(!is_firefox("Firefox/115"));
        assert!(!is_firefox(""));
    }

    #[tokio::test]
    async fn test_not_firefox_sends_nothing() {
        let channel = Arc::new(FakeChannel::new(QueryReply::After(Duration::ZERO, true)));

        let outcome = establish(CHROME_120, channel.clone()).await;

        assert!(matches!(outcome, ConnectionOutcome::NotFirefox));
        assert!(channel.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_established_carries_capability_flag() {
        for value in [true, false] {
            let channel = Arc::new(FakeChannel::new(QueryReply::After(
                Duration::from_millis(10),
                value,
            )));

            let connection = establish(FIREFOX_115, channel.clone())
                .await
                .into_connection()
                .expect("established");

            assert_eq!(connection.supports_direct_retrieval(), value);
            assert_eq!(channel.calls(), vec![Call::Query]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_established_symbol_table_scenario() {
        let channel = Arc::new(FakeChannel::new(QueryReply::After(
            Duration::from_millis(10),
            true,
        )));
        let started = Instant::now();

        let outcome = establish(FIREFOX_115, channel.clone()).await;
        assert!(started.elapsed() < PROBE_TIMEOUT);
        assert_eq!(outcome.status(), "ESTABLISHED");

        let connection = outcome.into_connection().expect("established");
        let table = connection
            .get_symbol_table("libxul.so", "ABCD1234")
            .await
            .expect("symbol table");

        assert_eq!(table, direct_table());
        assert_eq!(
            channel.calls(),
            vec![
                Call::Query,
                Call::SymbolTable("libxul.so".into(), "ABCD1234".into())
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_host_times_out() {
        let channel = Arc::new(FakeChannel::new(QueryReply::Never));
        let started = Instant::now();

        let outcome = establish(FIREFOX_115, channel.clone()).await;

        assert!(matches!(outcome, ConnectionOutcome::TimedOut));
        assert!(started.elapsed() >= PROBE_TIMEOUT);
        assert_eq!(channel.calls(), vec![Call::Query]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_answer_has_no_effect() {
        let (tx, rx) = oneshot::channel();
        let channel = Arc::new(FakeChannel::new(QueryReply::Pending(rx)));

        let outcome = establish(FIREFOX_115, channel).await;
        assert!(matches!(outcome, ConnectionOutcome::TimedOut));

        // The query future was dropped along with its receiver.
        assert!(tx.send(true).is_err());
        sleep(PROBE_TIMEOUT).await;
        assert!(matches!(outcome, ConnectionOutcome::TimedOut));
    }

    #[tokio::test]
    async fn test_rejection_is_denied_with_cause() {
        let channel = Arc::new(FakeChannel::new(QueryReply::Fail(Error::channel(
            "WebChannelError",
            "No Such Channel",
        ))));

        let outcome = establish(FIREFOX_115, channel).await;

        let error = match outcome {
            ConnectionOutcome::Denied { error } => error,
            other => panic!("expected denied, got {other:?}"),
        };
        let text = error.to_string();
        assert!(text.contains("WebChannelError"));
        assert!(text.contains("No Such Channel"));
        assert!(text.contains("devtools.performance.recording.ui-base-url"));
    }

    #[tokio::test]
    async fn test_any_failure_counts_as_denial() {
        let channel = Arc::new(FakeChannel::new(QueryReply::Fail(Error::ConnectionClosed)));

        let outcome = establish(FIREFOX_115, channel).await;

        let error = match outcome {
            ConnectionOutcome::Denied { error } => error,
            other => panic!("expected denied, got {other:?}"),
        };
        assert!(error.to_string().contains("ConnectionClosedError: Connection closed"));
    }

    #[tokio::test]
    async fn test_establish_with_bridge() {
        let server = PendingServer::bind(BridgeOptions::new()).await.expect("bind");
        FakeBridge::new(FIREFOX_115)
            .on("STATUS_QUERY", HostReply::Success(json!({"version": 1})))
            .on("GET_SYMBOL_TABLE", HostReply::EchoSymbolTable)
            .spawn(server.ws_url());

        let connection = establish_with_bridge(server)
            .await
            .expect("bridge accepted")
            .into_connection()
            .expect("established");
        assert!(connection.supports_direct_retrieval());

        let table = connection
            .get_symbol_table("libxul.so", "ABCD1234")
            .await
            .expect("symbol table");
        assert_eq!(table.buffer, b"libxul.so/ABCD1234".to_vec());
    }

    #[tokio::test]
    async fn test_establish_with_bridge_denied() {
        let server = PendingServer::bind(BridgeOptions::new()).await.expect("bind");
        FakeBridge::new(FIREFOX_115)
            .on("STATUS_QUERY", HostReply::ChannelError("No Such Channel".into()))
            .spawn(server.ws_url());

        let outcome = establish_with_bridge(server).await.expect("bridge accepted");

        assert_eq!(outcome.status(), "DENIED");
        assert!(format!("{outcome:?}").contains("No Such Channel"));
    }

    #[tokio::test]
    async fn test_silent_bridge_times_out_and_drops_request() {
        let server = PendingServer::bind(BridgeOptions::new()).await.expect("bind");
        FakeBridge::new(FIREFOX_115)
            .on("STATUS_QUERY", HostReply::Ignore)
            .spawn(server.ws_url());
        let (connection, _ready) = server.accept().await.expect("accept");

        let outcome = establish(FIREFOX_115, Arc::new(connection.clone())).await;

        assert!(matches!(outcome, ConnectionOutcome::TimedOut));
        assert_eq!(connection.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_establish_with_bridge_not_firefox() {
        let server = PendingServer::bind(BridgeOptions::new()).await.expect("bind");
        FakeBridge::new(CHROME_120).spawn(server.ws_url());

        let outcome = establish_with_bridge(server).await.expect("bridge accepted");

        assert!(matches!(outcome, ConnectionOutcome::NotFirefox));
    }

    #[test]
    fn test_outcome_helpers() {
        assert_eq!(ConnectionOutcome::Waiting.status(), "WAITING");
        assert_eq!(format!("{:?}", ConnectionOutcome::TimedOut), "TIMED_OUT");
        assert!(!ConnectionOutcome::NotFirefox.is_established());
        assert!(ConnectionOutcome::TimedOut.into_connection().is_none());
    }
}
