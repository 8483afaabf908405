//! Opaque position tokens for keyset pagination.
//!
//! A [`Position`] is the `(created_at, id)` pair of the last row a client has
//! seen. The token is URL-safe base64 without padding over a two-field JSON
//! object with single-letter keys, so clients cannot rely on its shape.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors decoding a position token.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("cursor is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("cursor payload is malformed: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("cursor timestamp is out of range: {0}")]
    OutOfRange(i64),
}

/// Where a descending `(created_at, id)` scan resumes. Rows strictly before
/// the position in that order come next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    key: DateTime<Utc>,
    id: i64,
}

impl Position {
    /// Creates a position, truncating `key` to the microsecond precision the
    /// database stores.
    pub fn new(key: DateTime<Utc>, id: i64) -> Self {
        let micros = key.timestamp_micros();
        let key = DateTime::from_timestamp_micros(micros).unwrap_or(key);
        Self { key, id }
    }

    /// The position before the first row: the largest key and id.
    pub fn start() -> Self {
        Self::new(DateTime::<Utc>::MAX_UTC, i64::MAX)
    }

    /// Returns true for [`Position::start`].
    pub fn is_start(&self) -> bool {
        *self == Self::start()
    }

    pub fn key(&self) -> DateTime<Utc> {
        self.key
    }

    pub fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Serialize, Deserialize)]
struct Token {
    #[serde(rename = "k")]
    key_micros: i64,
    #[serde(rename = "i")]
    id: i64,
}

/// Encodes a position as an opaque token.
pub fn encode(position: &Position) -> String {
    let token = Token {
        key_micros: position.key.timestamp_micros(),
        id: position.id,
    };
    // Two integer fields always serialize.
    let json = serde_json::to_vec(&token).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decodes a token produced by [`encode`].
pub fn decode(token: &str) -> Result<Position, CursorError> {
    let bytes = URL_SAFE_NO_PAD.decode(token.trim())?;
    let token: Token = serde_json::from_slice(&bytes)?;
    let key = DateTime::from_timestamp_micros(token.key_micros)
        .ok_or(CursorError::OutOfRange(token.key_micros))?;
    Ok(Position { key, id: token.id })
}

/// Decodes an optional token; absent or blank means [`Position::start`].
pub fn decode_or_start(token: Option<&str>) -> Result<Position, CursorError> {
    match token.map(str::trim) {
        None | Some("") => Ok(Position::start()),
        Some(token) => decode(token),
    }
}
