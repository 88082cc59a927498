//! Profile and symbol table payloads.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// ProfileData
// ============================================================================

/// A captured profile as delivered by the host.
///
/// Newer hosts send the gzipped profile as raw bytes; older ones send the
/// profile JSON as an object. This crate does not look inside either.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileData {
    /// Raw (usually gzipped) profile bytes.
    Bytes(Vec<u8>),
    /// Profile as a structured object.
    Object(Value),
}

impl ProfileData {
    /// Converts a `GET_PROFILE` response payload.
    ///
    /// Strings carry base64-encoded bytes; objects are kept as-is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the string is not valid base64 or the
    /// payload is neither a string nor an object.
    pub fn from_response(value: Value) -> Result<Self> {
        match value {
            Value::String(encoded) => Base64Standard
                .decode(encoded.as_bytes())
                .map(Self::Bytes)
                .map_err(|e| Error::protocol(format!("Invalid base64 profile: {e}"))),
            Value::Object(_) => Ok(Self::Object(value)),
            other => Err(Error::protocol(format!(
                "Unexpected profile payload: {}",
                json_kind(&other)
            ))),
        }
    }

    /// Returns the bytes if this is a byte buffer.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::Object(_) => None,
        }
    }

    /// Returns the object if this is a structured profile.
    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&Value> {
        match self {
            Self::Object(value) => Some(value),
            Self::Bytes(_) => None,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// SymbolTable
// ============================================================================

/// Wire shape of a symbol table: `[addrs, index, buffer]`.
pub type SymbolTableTuple = (Vec<u32>, Vec<u32>, Vec<u8>);

/// Address-to-symbol mapping for one binary module.
///
/// `addrs[i]` is the start address of symbol `i`; its name is
/// `buffer[index[i]..index[i + 1]]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SymbolTableTuple", into = "SymbolTableTuple")]
pub struct SymbolTable {
    /// Symbol start addresses, sorted.
    pub addrs: Vec<u32>,
    /// Offsets into `buffer`, one more than `addrs`.
    pub index: Vec<u32>,
    /// Concatenated symbol names.
    pub buffer: Vec<u8>,
}

impl SymbolTable {
    /// Converts a `GET_SYMBOL_TABLE` response payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the payload is not a three-element array.
    pub fn from_response(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Returns the number of symbols.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    /// Returns `true` if the table has no symbols.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }
}

impl From<SymbolTableTuple> for SymbolTable {
    fn from((addrs, index, buffer): SymbolTableTuple) -> Self {
        Self {
            addrs,
            index,
            buffer,
        }
    }
}

impl From<SymbolTable> for SymbolTableTuple {
    fn from(table: SymbolTable) -> Self {
        (table.addrs, table.index, table.buffer)
    }
}

// ============================================================================
// Tests
// ============================================================================
