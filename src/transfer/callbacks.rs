//! User callbacks attached to a transfer handle.
//!
//! Callbacks live behind a shared cell so the engine-side [`TransferIo`]
//! adapter and the owning handle see the same set, the way the engine would
//! hand its user-data slots back into a callback.
//!
//! [`TransferIo`]: crate::engine::TransferIo

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Consumes a chunk of response body. Returning fewer bytes than offered
/// aborts the transfer with a write error.
pub type WriteFn = Box<dyn FnMut(&[u8]) -> usize>;
/// Fills an upload buffer. Returning `0` signals end of body.
pub type ReadFn = Box<dyn FnMut(&mut [u8]) -> usize>;
/// Receives one raw header line. Returning `false` aborts the transfer.
pub type HeaderFn = Box<dyn FnMut(&[u8]) -> bool>;
/// Receives transfer progress. Returning `false` aborts the transfer.
pub type ProgressFn = Box<dyn FnMut(Progress) -> bool>;

/// Byte counters reported by the engine's progress callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Total bytes expected to download, `0` if unknown.
    pub download_total: f64,
    /// Bytes downloaded so far.
    pub downloaded: f64,
    /// Total bytes expected to upload, `0` if unknown.
    pub upload_total: f64,
    /// Bytes uploaded so far.
    pub uploaded: f64,
}

/// User callbacks installed on a handle.
#[derive(Default)]
pub struct Callbacks {
    pub(crate) write: Option<WriteFn>,
    pub(crate) read: Option<ReadFn>,
    pub(crate) header: Option<HeaderFn>,
    pub(crate) progress: Option<ProgressFn>,
}

impl Callbacks {
    /// Whether no callback is installed.
    pub fn is_empty(&self) -> bool {
        self.write.is_none() && self.read.is_none() && self.header.is_none() && self.progress.is_none()
    }

    pub(crate) fn clear(&mut self) {
        *self = Callbacks::default();
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("write", &self.write.is_some())
            .field("read", &self.read.is_some())
            .field("header", &self.header.is_some())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

pub(crate) type SharedCallbacks = Rc<RefCell<Callbacks>>;
