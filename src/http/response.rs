//! Completed HTTP response.

use crate::base::error::Error;
use crate::http::accumulator::ResponseParts;
use crate::transfer::TransferHandle;
use bytes::Bytes;
use http::StatusCode;

/// Result of a successful transfer: status, headers, body and the handle
/// that produced them. Immutable once built.
#[derive(Debug)]
pub struct Response {
    status: Option<StatusCode>,
    headers: Vec<(String, String)>,
    body: Bytes,
    handle: TransferHandle,
}

impl Response {
    pub(crate) fn new(parts: ResponseParts, handle: TransferHandle) -> Self {
        // The engine's own response code beats whatever status line we parsed.
        let status = handle
            .response_code()
            .ok()
            .flatten()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .or(parts.status);
        Self {
            status,
            headers: parts.headers,
            body: parts.body,
            handle,
        }
    }

    /// HTTP status, when the protocol produced one.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Header lines in arrival order, split at the first colon.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header whose name matches case-insensitively, with surrounding
    /// whitespace removed from the value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim())
    }

    /// The collected body. Empty when a write callback consumed it.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consumes the response, returning the body.
    pub fn bytes(self) -> Bytes {
        self.body
    }

    /// The body as UTF-8 text.
    pub fn text(&self) -> Result<String, Error> {
        String::from_utf8(self.body.to_vec()).map_err(|_| Error::InvalidUtf8)
    }

    /// Deserializes the body as JSON.
    #[cfg(feature = "json")]
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// The handle that performed the transfer; its info getters are valid.
    pub fn handle(&self) -> &TransferHandle {
        &self.handle
    }

    /// Consumes the response, returning the handle for reuse.
    pub fn into_handle(self) -> TransferHandle {
        self.handle
    }
}
