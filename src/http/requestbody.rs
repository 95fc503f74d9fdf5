//! Request body for POST/PUT.

use bytes::{Buf, Bytes};

/// Request body for POST/PUT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// In-memory body.
    Bytes(Bytes),
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::Bytes(Bytes::from(s))
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(v: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(v))
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        RequestBody::Bytes(Bytes::from(s.to_owned()))
    }
}

impl From<Bytes> for RequestBody {
    fn from(b: Bytes) -> Self {
        RequestBody::Bytes(b)
    }
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        match self {
            RequestBody::Empty => 0,
            RequestBody::Bytes(b) => b.len(),
        }
    }

    /// The body as one buffer. Cloning `Bytes` does not copy.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            RequestBody::Empty => Bytes::new(),
            RequestBody::Bytes(b) => b.clone(),
        }
    }

    /// A read cursor over the body, for uploads driven by the engine's
    /// read callback.
    pub fn cursor(&self) -> BodyCursor {
        BodyCursor {
            remaining: self.to_bytes(),
        }
    }
}

/// Hands out the body in buffer-sized pieces. Once exhausted every read
/// returns `0`.
#[derive(Debug, Clone)]
pub struct BodyCursor {
    remaining: Bytes,
}

impl BodyCursor {
    /// Copies the next piece into `buf` and returns its length.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.remaining.len());
        buf[..n].copy_from_slice(&self.remaining[..n]);
        self.remaining.advance(n);
        n
    }

    /// Bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}
