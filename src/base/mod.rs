//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): per-transfer result codes reported by the engine
//! - [`MultiError`](multierror::MultiError): multi-handle result codes
//! - [`Error`](error::Error): the crate error, classified by [`ErrorKind`](error::ErrorKind)

pub mod context;
pub mod error;
pub mod multierror;
pub mod neterror;

pub use error::{Error, ErrorKind};
pub use multierror::MultiError;
pub use neterror::NetError;

#[cfg(test)]
mod tests;
