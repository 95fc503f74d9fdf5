use crate::http::accumulator::SharedAccumulator;
use crate::transfer::callbacks::{Progress, SharedCallbacks};
use std::fmt;

/// Engine-facing view of a transfer's data paths.
///
/// Engines call these from inside their own calls whenever bytes move.
/// Body bytes go to the installed write callback, or into the response
/// accumulator when none is installed. Header lines always reach the
/// accumulator and are forwarded to the header callback as well.
#[derive(Clone)]
pub struct TransferIo {
    callbacks: SharedCallbacks,
    response: SharedAccumulator,
}

impl TransferIo {
    pub(crate) fn new(callbacks: SharedCallbacks, response: SharedAccumulator) -> Self {
        Self {
            callbacks,
            response,
        }
    }

    /// Returns the number of bytes consumed. Anything short of `data.len()`
    /// means the transfer must be aborted.
    pub fn write(&self, data: &[u8]) -> usize {
        let mut callbacks = self.callbacks.borrow_mut();
        match callbacks.write.as_mut() {
            Some(write) => write(data),
            None => {
                self.response.borrow_mut().append_body(data);
                data.len()
            }
        }
    }

    /// Fills `buf` with upload data. `0` ends the upload.
    pub fn read(&self, buf: &mut [u8]) -> usize {
        let mut callbacks = self.callbacks.borrow_mut();
        match callbacks.read.as_mut() {
            Some(read) => read(buf),
            None => 0,
        }
    }

    /// Returns `false` to abort the transfer.
    pub fn header(&self, line: &[u8]) -> bool {
        self.response.borrow_mut().append_header_line(line);
        let mut callbacks = self.callbacks.borrow_mut();
        match callbacks.header.as_mut() {
            Some(header) => header(line),
            None => true,
        }
    }

    /// Returns `false` to abort the transfer.
    pub fn progress(&self, progress: Progress) -> bool {
        let mut callbacks = self.callbacks.borrow_mut();
        match callbacks.progress.as_mut() {
            Some(report) => report(progress),
            None => true,
        }
    }
}

impl fmt::Debug for TransferIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferIo")
            .field("callbacks", &*self.callbacks.borrow())
            .finish()
    }
}
