//! Scripted transports for connection tests.

use std::future::pending;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::oneshot;
use tokio::time::sleep;

use crate::error::{Error, Result};
use crate::protocol::{ProfileData, SymbolTable};

use super::channel::{LegacyProfiler, WebChannel};

pub(crate) const FIREFOX_115: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0";

/// A call observed by a fake transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Query,
    Profile,
    SymbolTable(String, String),
}

/// How the fake channel answers the capability query.
pub(crate) enum QueryReply {
    After(Duration, bool),
    Fail(Error),
    Pending(oneshot::Receiver<bool>),
    Never,
}

pub(crate) struct FakeChannel {
    reply: Mutex<Option<QueryReply>>,
    calls: Mutex<Vec<Call>>,
    retrieval_error: Option<fn() -> Error>,
}

impl FakeChannel {
    pub(crate) fn new(reply: QueryReply) -> Self {
        Self {
            reply: Mutex::new(Some(reply)),
            calls: Mutex::new(Vec::new()),
            retrieval_error: None,
        }
    }

    /// Makes profile and symbol table requests fail with `make_error()`.
    pub(crate) fn with_retrieval_error(mut self, make_error: fn() -> Error) -> Self {
        self.retrieval_error = Some(make_error);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl WebChannel for FakeChannel {
    async fn query_supports_direct_retrieval(&self) -> Result<bool> {
        self.calls.lock().push(Call::Query);
        let reply = self.reply.lock().take();

        match reply {
            Some(QueryReply::After(delay, value)) => {
                sleep(delay).await;
                Ok(value)
            }
            Some(QueryReply::Fail(err)) => Err(err),
            Some(QueryReply::Pending(rx)) => Ok(rx.await?),
            Some(QueryReply::Never) | None => pending().await,
        }
    }

    async fn request_profile(&self) -> Result<ProfileData> {
        self.calls.lock().push(Call::Profile);
        match self.retrieval_error {
            Some(make_error) => Err(make_error()),
            None => Ok(ProfileData::Bytes(b"direct".to_vec())),
        }
    }

    async fn request_symbol_table(
        &self,
        debug_name: &str,
        breakpad_id: &str,
    ) -> Result<SymbolTable> {
        self.calls
            .lock()
            .push(Call::SymbolTable(debug_name.to_string(), breakpad_id.to_string()));
        match self.retrieval_error {
            Some(make_error) => Err(make_error()),
            None => Ok(direct_table()),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeLegacy {
    calls: Mutex<Vec<Call>>,
    error: Option<fn() -> Error>,
}

impl FakeLegacy {
    /// A legacy profiler whose every call fails with `make_error()`.
    pub(crate) fn failing(make_error: fn() -> Error) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            error: Some(make_error),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl LegacyProfiler for FakeLegacy {
    async fn get_profile(&self) -> Result<ProfileData> {
        self.calls.lock().push(Call::Profile);
        match self.error {
            Some(make_error) => Err(make_error()),
            None => Ok(ProfileData::Object(json!({ "source": "legacy" }))),
        }
    }

    async fn get_symbol_table(&self, debug_name: &str, breakpad_id: &str) -> Result<SymbolTable> {
        self.calls
            .lock()
            .push(Call::SymbolTable(debug_name.to_string(), breakpad_id.to_string()));
        match self.error {
            Some(make_error) => Err(make_error()),
            None => Ok(legacy_table()),
        }
    }
}

pub(crate) fn direct_table() -> SymbolTable {
    SymbolTable::from((vec![0x1000], vec![0, 4], b"main".to_vec()))
}

pub(crate) fn legacy_table() -> SymbolTable {
    SymbolTable::from((vec![0x2000], vec![0, 3], b"old".to_vec()))
}
