use thiserror::Error;

/// Per-transfer result codes reported by the transfer engine.
///
/// Numbering follows libcurl's `CURLcode`, so codes coming from a real
/// engine round-trip through [`NetError::as_i32`] and `From<i32>` without a
/// lookup table on the engine side. Code `0` (success) is not an error and
/// has no variant; [`NetError::from_code`] maps it to `None`.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy, Hash)]
pub enum NetError {
    // Setup Errors
    #[error("Unsupported protocol")]
    UnsupportedProtocol,
    #[error("Failed to initialize")]
    FailedInit,
    #[error("URL using bad/illegal format")]
    UrlMalformat,
    #[error("Feature not built in")]
    NotBuiltIn,
    #[error("Unknown option")]
    UnknownOption,
    #[error("Malformed option syntax")]
    SetoptOptionSyntax,
    #[error("Bad function argument")]
    BadFunctionArgument,
    #[error("Out of memory")]
    OutOfMemory,
    #[error("API function called from within callback")]
    RecursiveApiCall,

    // Connection Errors
    #[error("Could not resolve proxy name")]
    CouldntResolveProxy,
    #[error("Could not resolve host name")]
    CouldntResolveHost,
    #[error("Could not connect to server")]
    CouldntConnect,
    #[error("Failed binding local connection end")]
    InterfaceFailed,
    #[error("Timeout was reached")]
    OperationTimedout,
    #[error("Failed sending data to the peer")]
    SendError,
    #[error("Failure when receiving data from the peer")]
    RecvError,
    #[error("Socket not ready for send/recv")]
    Again,
    #[error("Proxy handshake error")]
    Proxy,
    #[error("Unrecoverable error in select/poll")]
    UnrecoverablePoll,

    // TLS Errors
    #[error("SSL connect error")]
    SslConnectError,
    #[error("SSL crypto engine not found")]
    SslEngineNotFound,
    #[error("Can not set SSL crypto engine as default")]
    SslEngineSetFailed,
    #[error("Problem with the local SSL certificate")]
    SslCertProblem,
    #[error("Could not use specified SSL cipher")]
    SslCipher,
    #[error("SSL peer certificate or SSH remote key was not OK")]
    PeerFailedVerification,
    #[error("Requested SSL level failed")]
    UseSslFailed,
    #[error("Failed to initialise SSL crypto engine")]
    SslEngineInitFailed,
    #[error("Problem with the SSL CA cert (path? access rights?)")]
    SslCacertBadFile,
    #[error("Failed to shut down the SSL connection")]
    SslShutdownFailed,
    #[error("Failed to load CRL file (path? access rights?, format?)")]
    SslCrlBadFile,
    #[error("Issuer check against peer certificate failed")]
    SslIssuerError,
    #[error("SSL public key does not match pinned public key")]
    SslPinnedPubkeyNotMatch,
    #[error("SSL server certificate status verification FAILED")]
    SslInvalidCertStatus,
    #[error("SSL Client Certificate required")]
    SslClientCert,

    // HTTP Errors
    #[error("Weird server reply")]
    WeirdServerReply,
    #[error("Access denied to remote resource")]
    RemoteAccessDenied,
    #[error("Error in the HTTP2 framing layer")]
    Http2,
    #[error("Transferred a partial file")]
    PartialFile,
    #[error("HTTP response code said error")]
    HttpReturnedError,
    #[error("Failed writing received data to disk/application")]
    WriteError,
    #[error("Upload failed")]
    UploadFailed,
    #[error("Failed to open/read local data from file/application")]
    ReadError,
    #[error("Requested range was not delivered by the server")]
    RangeError,
    #[error("Internal problem setting up the POST")]
    HttpPostError,
    #[error("Could not resume download")]
    BadDownloadResume,
    #[error("Couldn't read a file:// file")]
    FileCouldntReadFile,
    #[error("Operation was aborted by an application callback")]
    AbortedByCallback,
    #[error("Number of redirects hit maximum amount")]
    TooManyRedirects,
    #[error("Server returned nothing (no headers, no data)")]
    GotNothing,
    #[error("Unrecognized or bad HTTP Content or Transfer-Encoding")]
    BadContentEncoding,
    #[error("Maximum file size exceeded")]
    FilesizeExceeded,
    #[error("Send failed since rewinding of the data stream failed")]
    SendFailRewind,
    #[error("Login denied")]
    LoginDenied,
    #[error("Remote file not found")]
    RemoteFileNotFound,
    #[error("Chunk callback failed")]
    ChunkFailed,
    #[error("Stream error in the HTTP/2 framing layer")]
    Http2Stream,
    #[error("An authentication function returned an error")]
    AuthError,
    #[error("HTTP/3 error")]
    Http3,
    #[error("QUIC connection error")]
    QuicConnectError,

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    /// Maps a raw engine result to an error, treating `0` as success.
    pub fn from_code(code: i32) -> Option<Self> {
        if code == 0 {
            None
        } else {
            Some(NetError::from(code))
        }
    }

    /// Numeric engine result code.
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::UnsupportedProtocol => 1,
            NetError::FailedInit => 2,
            NetError::UrlMalformat => 3,
            NetError::NotBuiltIn => 4,
            NetError::CouldntResolveProxy => 5,
            NetError::CouldntResolveHost => 6,
            NetError::CouldntConnect => 7,
            NetError::WeirdServerReply => 8,
            NetError::RemoteAccessDenied => 9,
            NetError::Http2 => 16,
            NetError::PartialFile => 18,
            NetError::HttpReturnedError => 22,
            NetError::WriteError => 23,
            NetError::UploadFailed => 25,
            NetError::ReadError => 26,
            NetError::OutOfMemory => 27,
            NetError::OperationTimedout => 28,
            NetError::RangeError => 33,
            NetError::HttpPostError => 34,
            NetError::SslConnectError => 35,
            NetError::BadDownloadResume => 36,
            NetError::FileCouldntReadFile => 37,
            NetError::AbortedByCallback => 42,
            NetError::BadFunctionArgument => 43,
            NetError::InterfaceFailed => 45,
            NetError::TooManyRedirects => 47,
            NetError::UnknownOption => 48,
            NetError::SetoptOptionSyntax => 49,
            NetError::GotNothing => 52,
            NetError::SslEngineNotFound => 53,
            NetError::SslEngineSetFailed => 54,
            NetError::SendError => 55,
            NetError::RecvError => 56,
            NetError::SslCertProblem => 58,
            NetError::SslCipher => 59,
            NetError::PeerFailedVerification => 60,
            NetError::BadContentEncoding => 61,
            NetError::FilesizeExceeded => 63,
            NetError::UseSslFailed => 64,
            NetError::SendFailRewind => 65,
            NetError::SslEngineInitFailed => 66,
            NetError::LoginDenied => 67,
            NetError::SslCacertBadFile => 77,
            NetError::RemoteFileNotFound => 78,
            NetError::SslShutdownFailed => 80,
            NetError::Again => 81,
            NetError::SslCrlBadFile => 82,
            NetError::SslIssuerError => 83,
            NetError::ChunkFailed => 88,
            NetError::SslPinnedPubkeyNotMatch => 90,
            NetError::SslInvalidCertStatus => 91,
            NetError::Http2Stream => 92,
            NetError::RecursiveApiCall => 93,
            NetError::AuthError => 94,
            NetError::Http3 => 95,
            NetError::QuicConnectError => 96,
            NetError::Proxy => 97,
            NetError::SslClientCert => 98,
            NetError::UnrecoverablePoll => 99,
            NetError::Unknown(code) => *code,
        }
    }

    /// True for failures raised while establishing the connection
    /// (name resolution, TCP connect, proxy or TLS handshake).
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            NetError::CouldntResolveProxy
                | NetError::CouldntResolveHost
                | NetError::CouldntConnect
                | NetError::InterfaceFailed
                | NetError::SslConnectError
                | NetError::PeerFailedVerification
                | NetError::Proxy
        )
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            1 => NetError::UnsupportedProtocol,
            2 => NetError::FailedInit,
            3 => NetError::UrlMalformat,
            4 => NetError::NotBuiltIn,
            5 => NetError::CouldntResolveProxy,
            6 => NetError::CouldntResolveHost,
            7 => NetError::CouldntConnect,
            8 => NetError::WeirdServerReply,
            9 => NetError::RemoteAccessDenied,
            16 => NetError::Http2,
            18 => NetError::PartialFile,
            22 => NetError::HttpReturnedError,
            23 => NetError::WriteError,
            25 => NetError::UploadFailed,
            26 => NetError::ReadError,
            27 => NetError::OutOfMemory,
            28 => NetError::OperationTimedout,
            33 => NetError::RangeError,
            34 => NetError::HttpPostError,
            35 => NetError::SslConnectError,
            36 => NetError::BadDownloadResume,
            37 => NetError::FileCouldntReadFile,
            42 => NetError::AbortedByCallback,
            43 => NetError::BadFunctionArgument,
            45 => NetError::InterfaceFailed,
            47 => NetError::TooManyRedirects,
            48 => NetError::UnknownOption,
            49 => NetError::SetoptOptionSyntax,
            52 => NetError::GotNothing,
            53 => NetError::SslEngineNotFound,
            54 => NetError::SslEngineSetFailed,
            55 => NetError::SendError,
            56 => NetError::RecvError,
            58 => NetError::SslCertProblem,
            59 => NetError::SslCipher,
            60 => NetError::PeerFailedVerification,
            61 => NetError::BadContentEncoding,
            63 => NetError::FilesizeExceeded,
            64 => NetError::UseSslFailed,
            65 => NetError::SendFailRewind,
            66 => NetError::SslEngineInitFailed,
            67 => NetError::LoginDenied,
            77 => NetError::SslCacertBadFile,
            78 => NetError::RemoteFileNotFound,
            80 => NetError::SslShutdownFailed,
            81 => NetError::Again,
            82 => NetError::SslCrlBadFile,
            83 => NetError::SslIssuerError,
            88 => NetError::ChunkFailed,
            90 => NetError::SslPinnedPubkeyNotMatch,
            91 => NetError::SslInvalidCertStatus,
            92 => NetError::Http2Stream,
            93 => NetError::RecursiveApiCall,
            94 => NetError::AuthError,
            95 => NetError::Http3,
            96 => NetError::QuicConnectError,
            97 => NetError::Proxy,
            98 => NetError::SslClientCert,
            99 => NetError::UnrecoverablePoll,
            _ => NetError::Unknown(code),
        }
    }
}
