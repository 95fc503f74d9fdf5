//! Ergonomic error context helpers.
//!
//! Provides an extension trait for turning reactor IO failures into
//! context-rich [`Error::Reactor`] values.

use crate::base::error::Error;
use std::io;

/// Extension trait for adding context to reactor IO Results.
pub trait ReactorResultExt<T> {
    /// Tag an IO error with the reactor operation that produced it.
    ///
    /// # Example
    /// ```ignore
    /// use multinet::base::context::ReactorResultExt;
    ///
    /// reactor.start_timer(delay, on_fire).reactor_context("start timer")?;
    /// // Error: "reactor failed to start timer: ..."
    /// ```
    fn reactor_context(self, op: &'static str) -> Result<T, Error>;
}

impl<T> ReactorResultExt<T> for Result<T, io::Error> {
    fn reactor_context(self, op: &'static str) -> Result<T, Error> {
        self.map_err(|source| Error::Reactor { op, source })
    }
}
