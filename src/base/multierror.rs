use thiserror::Error;

/// Multi-handle level result codes (libcurl `CURLMcode` numbering).
///
/// These come back from registration, deregistration and step calls on the
/// engine's multi handle, as opposed to [`NetError`](super::neterror::NetError)
/// which describes how an individual transfer ended.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy, Hash)]
pub enum MultiError {
    #[error("Please call perform again")]
    CallMultiPerform,
    #[error("Invalid multi handle")]
    BadHandle,
    #[error("Invalid easy handle")]
    BadEasyHandle,
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Internal error")]
    InternalError,
    #[error("Invalid socket argument")]
    BadSocket,
    #[error("Unknown option")]
    UnknownOption,
    #[error("The easy handle is already added to a multi handle")]
    AddedAlready,
    #[error("API function called from within callback")]
    RecursiveApiCall,
    #[error("Wakeup is unavailable or failed")]
    WakeupFailure,
    #[error("A libcurl function was given a bad argument")]
    BadFunctionArgument,
    #[error("Operation was aborted by an application callback")]
    AbortedByCallback,
    #[error("Unrecoverable error in select/poll")]
    UnrecoverablePoll,

    #[error("Unknown multi error: {0}")]
    Unknown(i32),
}

impl MultiError {
    /// Numeric multi-handle code.
    pub fn as_i32(&self) -> i32 {
        match self {
            MultiError::CallMultiPerform => -1,
            MultiError::BadHandle => 1,
            MultiError::BadEasyHandle => 2,
            MultiError::OutOfMemory => 3,
            MultiError::InternalError => 4,
            MultiError::BadSocket => 5,
            MultiError::UnknownOption => 6,
            MultiError::AddedAlready => 7,
            MultiError::RecursiveApiCall => 8,
            MultiError::WakeupFailure => 9,
            MultiError::BadFunctionArgument => 10,
            MultiError::AbortedByCallback => 11,
            MultiError::UnrecoverablePoll => 12,
            MultiError::Unknown(code) => *code,
        }
    }
}

impl From<i32> for MultiError {
    fn from(code: i32) -> Self {
        match code {
            -1 => MultiError::CallMultiPerform,
            1 => MultiError::BadHandle,
            2 => MultiError::BadEasyHandle,
            3 => MultiError::OutOfMemory,
            4 => MultiError::InternalError,
            5 => MultiError::BadSocket,
            6 => MultiError::UnknownOption,
            7 => MultiError::AddedAlready,
            8 => MultiError::RecursiveApiCall,
            9 => MultiError::WakeupFailure,
            10 => MultiError::BadFunctionArgument,
            11 => MultiError::AbortedByCallback,
            12 => MultiError::UnrecoverablePoll,
            _ => MultiError::Unknown(code),
        }
    }
}
