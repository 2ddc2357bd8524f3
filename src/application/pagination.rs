//! Shared pagination types and the opaque offer cursor.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct OfferCursorPayload {
    id: i64,
    key: Option<OffsetDateTime>,
}

/// Keyset cursor for offer listings: the last-seen row id plus the secondary
/// ordering key it was serving under. Clients pass the encoded form back
/// verbatim; its internals are not part of the public contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferCursor {
    id: i64,
    key: Option<OffsetDateTime>,
}

impl OfferCursor {
    /// Construct a cursor from a real row. Cursors are never fabricated from
    /// anything else.
    pub fn new(id: i64, key: Option<OffsetDateTime>) -> Self {
        Self { id, key }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn key(&self) -> Option<OffsetDateTime> {
        self.key
    }

    pub fn encode(&self) -> String {
        let payload = OfferCursorPayload {
            id: self.id,
            key: self.key,
        };
        let serialized =
            serde_json::to_vec(&payload).expect("serializing offer cursor payload should succeed");
        URL_SAFE_NO_PAD.encode(serialized)
    }

    /// Decode a client-supplied token. Any failure (bad base64, bad JSON,
    /// wrong shape) yields `None`, which callers treat exactly like "no
    /// cursor supplied": the listing restarts from the beginning.
    pub fn decode(cursor: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(cursor).ok()?;
        let payload: OfferCursorPayload = serde_json::from_slice(&bytes).ok()?;
        Some(Self {
            id: payload.id,
            key: payload.key,
        })
    }
}

/// One page of a keyset listing. No total is computed in this mode.
///
/// `has_more` is a heuristic: a page that came back full reports `true`
/// without probing past its end, so a result set whose size is an exact
/// multiple of the limit serves one trailing empty page as its legitimate
/// final response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T> CursorPage<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
            has_more: false,
        }
    }

    pub fn new(items: Vec<T>, next_cursor: Option<String>, has_more: bool) -> Self {
        Self {
            items,
            next_cursor,
            has_more,
        }
    }
}
