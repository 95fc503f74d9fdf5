//! Response assembly while a transfer is in flight.

use bytes::{Bytes, BytesMut};
use http::StatusCode;
use std::cell::RefCell;
use std::rc::Rc;

pub(crate) type SharedAccumulator = Rc<RefCell<ResponseAccumulator>>;

/// Collects body bytes and header lines as the engine delivers them.
///
/// Body chunks concatenate in arrival order, so feeding a payload in any
/// number of pieces yields the same body as feeding it at once.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    body: BytesMut,
    headers: Vec<(String, String)>,
    status: Option<StatusCode>,
}

/// Immutable result of an accumulator once the transfer has finished.
#[derive(Debug, Clone, Default)]
pub struct ResponseParts {
    pub status: Option<StatusCode>,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ResponseAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one piece of body data in arrival order.
    pub fn append_body(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }

    /// Records one raw header line as delivered by the engine.
    ///
    /// The trailing line terminator is dropped and terminator-only lines
    /// (the blank line ending a header block) are skipped. A status line
    /// (`HTTP/...`) also updates the parsed status; with redirects or
    /// interim responses the last status line wins.
    pub fn append_header_line(&mut self, line: &[u8]) {
        let line = String::from_utf8_lossy(line);
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return;
        }
        if let Some(status) = parse_status_line(line) {
            self.status = Some(status);
        }
        self.headers.push(split_header_line(line));
    }

    /// Body bytes received so far.
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Header lines received so far.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Status from the last status line seen.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Freezes the accumulated state.
    pub fn finish(&mut self) -> ResponseParts {
        ResponseParts {
            status: self.status.take(),
            headers: std::mem::take(&mut self.headers),
            body: self.body.split().freeze(),
        }
    }
}

/// Splits a header line at the first colon.
///
/// Neither side is trimmed, so `"Content-Type: text/plain"` yields
/// `("Content-Type", " text/plain")`. A line without a colon becomes the
/// name with an empty value.
pub fn split_header_line(line: &str) -> (String, String) {
    match line.split_once(':') {
        Some((name, value)) => (name.to_owned(), value.to_owned()),
        None => (line.to_owned(), String::new()),
    }
}

fn parse_status_line(line: &str) -> Option<StatusCode> {
    if !line.starts_with("HTTP/") {
        return None;
    }
    let code = line.split_ascii_whitespace().nth(1)?;
    code.parse::<u16>().ok().and_then(|c| StatusCode::from_u16(c).ok())
}
