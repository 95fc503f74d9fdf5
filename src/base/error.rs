use crate::base::multierror::MultiError;
use crate::base::neterror::NetError;
use crate::transfer::info::InfoCode;
use crate::transfer::option::OptionCode;
use crate::transfer::TransferId;
use std::io;
use thiserror::Error;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The engine finished the transfer unsuccessfully (DNS, TLS, connect,
    /// protocol). Delivered through the transfer's future, never retried.
    Transfer,
    /// The engine and the coordinator disagree about transfer state. These
    /// indicate a bug in the integration, not a network failure.
    Integration,
    /// The caller misused the API. Raised synchronously, before the engine
    /// or the reactor is touched.
    Usage,
    /// The transfer was removed before the engine reported completion.
    Cancelled,
    /// A reactor primitive (socket watch, timer) failed.
    Reactor,
    /// A completed response body could not be decoded as requested.
    Decode,
}

/// Errors produced by the coordinator, its collaborators and the HTTP layer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("transfer failed: {code}{}", fmt_description(.description))]
    Transfer { code: NetError, description: String },

    #[error("multi handle error: {0}")]
    Multi(#[from] MultiError),

    // Integration errors
    #[error("transfer engine requested unknown socket action {0}")]
    UnknownSocketAction(i32),
    #[error("transfer {id} completed without an attached {what}")]
    MissingAttachment { id: TransferId, what: &'static str },
    #[error("completion reported for unregistered transfer {0}")]
    UnknownTransfer(TransferId),

    // Usage errors
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("option {0} is reserved for internal bookkeeping")]
    ReservedOption(OptionCode),
    #[error("option {0} is a callback slot; install callbacks through the handle")]
    CallbackOption(OptionCode),
    #[error("request URL must not be empty")]
    EmptyUrl,
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
    #[error("transfer {0} is already registered")]
    AlreadyRegistered(TransferId),
    #[error("transfer info is unavailable before the transfer completes")]
    NotStarted,
    #[error("info {code} holds a {actual} value")]
    InfoType { code: InfoCode, actual: &'static str },
    #[error("coordinator re-entered from inside a transfer callback")]
    Reentrant,

    #[error("transfer was cancelled")]
    Cancelled,

    #[error("reactor failed to {op}: {source}")]
    Reactor {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("response body is not valid UTF-8")]
    InvalidUtf8,
    #[cfg(feature = "json")]
    #[error("response body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn fmt_description(description: &str) -> String {
    if description.is_empty() {
        String::new()
    } else {
        format!(" ({description})")
    }
}

impl Error {
    /// Builds a transfer error from an engine result code and the engine's
    /// error buffer contents.
    pub fn transfer(code: NetError, description: impl Into<String>) -> Self {
        Error::Transfer {
            code,
            description: description.into(),
        }
    }

    /// Classifies the error for callers that only care about its origin.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transfer { .. } => ErrorKind::Transfer,
            Error::Multi(_)
            | Error::UnknownSocketAction(_)
            | Error::MissingAttachment { .. }
            | Error::UnknownTransfer(_) => ErrorKind::Integration,
            Error::InvalidArgument(_)
            | Error::ReservedOption(_)
            | Error::CallbackOption(_)
            | Error::EmptyUrl
            | Error::UnsupportedMethod(_)
            | Error::AlreadyRegistered(_)
            | Error::NotStarted
            | Error::InfoType { .. }
            | Error::Reentrant => ErrorKind::Usage,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Reactor { .. } => ErrorKind::Reactor,
            Error::InvalidUtf8 => ErrorKind::Decode,
            #[cfg(feature = "json")]
            Error::Json(_) => ErrorKind::Decode,
        }
    }

    /// The engine result code, for transfer errors.
    pub fn code(&self) -> Option<NetError> {
        match self {
            Error::Transfer { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the transfer was removed before it completed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_display() {
        let err = Error::transfer(NetError::CouldntResolveHost, "Could not resolve host: nope");
        assert_eq!(
            err.to_string(),
            "transfer failed: Could not resolve host name (Could not resolve host: nope)"
        );
        assert_eq!(err.kind(), ErrorKind::Transfer);
        assert_eq!(err.code(), Some(NetError::CouldntResolveHost));
    }

    #[test]
    fn test_transfer_error_without_description() {
        let err = Error::transfer(NetError::OperationTimedout, "");
        assert_eq!(err.to_string(), "transfer failed: Timeout was reached");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::UnknownSocketAction(9).kind(), ErrorKind::Integration);
        assert_eq!(Error::EmptyUrl.kind(), ErrorKind::Usage);
        assert_eq!(Error::ReservedOption(OptionCode::PRIVATE).kind(), ErrorKind::Usage);
        assert_eq!(Error::Cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(Error::Multi(MultiError::BadSocket).kind(), ErrorKind::Integration);
        assert_eq!(Error::Reentrant.kind(), ErrorKind::Usage);
        assert_eq!(Error::InvalidUtf8.kind(), ErrorKind::Decode);
        assert!(Error::Cancelled.is_cancelled());
    }
}
