//! Post-completion transfer information.
//!
//! Codes follow libcurl's `CURLINFO_*` numbering: the high bits carry the
//! value type, the low bits the item number.

use std::collections::HashMap;
use std::fmt;

const STRING: u32 = 0x10_0000;
const LONG: u32 = 0x20_0000;
const DOUBLE: u32 = 0x30_0000;
const SLIST: u32 = 0x40_0000;
const OFF_T: u32 = 0x60_0000;
const TYPEMASK: u32 = 0xf0_0000;

/// Value type of an info item, derived from its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoKind {
    String,
    Long,
    Double,
    List,
    OffT,
}

/// Engine info item, numbered like `CURLINFO_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InfoCode(u32);

macro_rules! info_codes {
    ($($name:ident = $base:ident + $n:expr;)*) => {
        impl InfoCode {
            $(pub const $name: InfoCode = InfoCode($base + $n);)*

            /// Name of a known code.
            pub fn name(&self) -> Option<&'static str> {
                match *self {
                    $(InfoCode::$name => Some(stringify!($name)),)*
                    _ => None,
                }
            }
        }
    };
}

info_codes! {
    EFFECTIVE_URL = STRING + 1;
    RESPONSE_CODE = LONG + 2;
    TOTAL_TIME = DOUBLE + 3;
    NAMELOOKUP_TIME = DOUBLE + 4;
    CONNECT_TIME = DOUBLE + 5;
    PRETRANSFER_TIME = DOUBLE + 6;
    SIZE_UPLOAD = DOUBLE + 7;
    SIZE_DOWNLOAD = DOUBLE + 8;
    SPEED_DOWNLOAD = DOUBLE + 9;
    SPEED_UPLOAD = DOUBLE + 10;
    HEADER_SIZE = LONG + 11;
    REQUEST_SIZE = LONG + 12;
    SSL_VERIFYRESULT = LONG + 13;
    FILETIME = LONG + 14;
    CONTENT_LENGTH_DOWNLOAD = DOUBLE + 15;
    CONTENT_LENGTH_UPLOAD = DOUBLE + 16;
    STARTTRANSFER_TIME = DOUBLE + 17;
    CONTENT_TYPE = STRING + 18;
    REDIRECT_TIME = DOUBLE + 19;
    REDIRECT_COUNT = LONG + 20;
    HTTP_CONNECTCODE = LONG + 22;
    OS_ERRNO = LONG + 25;
    NUM_CONNECTS = LONG + 26;
    COOKIELIST = SLIST + 28;
    REDIRECT_URL = STRING + 31;
    PRIMARY_IP = STRING + 32;
    PRIMARY_PORT = LONG + 40;
    LOCAL_IP = STRING + 41;
    LOCAL_PORT = LONG + 42;
    SIZE_DOWNLOAD_T = OFF_T + 8;
    SIZE_UPLOAD_T = OFF_T + 7;
}

impl InfoCode {
    /// Wraps a raw info number.
    pub const fn from_raw(code: u32) -> Self {
        InfoCode(code)
    }

    /// The raw info number.
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Value type encoded in the code.
    pub fn kind(&self) -> InfoKind {
        match self.0 & TYPEMASK {
            STRING => InfoKind::String,
            LONG => InfoKind::Long,
            DOUBLE => InfoKind::Double,
            SLIST => InfoKind::List,
            _ => InfoKind::OffT,
        }
    }
}

impl fmt::Display for InfoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "info {:#x}", self.0),
        }
    }
}

/// One reported info value.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoValue {
    /// `long` item.
    Long(i64),
    /// `double` item.
    Double(f64),
    /// String item; `None` when the engine reported null.
    Str(Option<String>),
    /// List-of-strings item.
    List(Vec<String>),
}

impl InfoValue {
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            InfoValue::Long(_) => "long",
            InfoValue::Double(_) => "double",
            InfoValue::Str(_) => "string",
            InfoValue::List(_) => "list",
        }
    }
}

/// Snapshot of the info items an engine reported when a transfer was
/// detached from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferInfo {
    values: HashMap<InfoCode, InfoValue>,
}

impl TransferInfo {
    /// An empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` for `code`.
    pub fn insert(&mut self, code: InfoCode, value: InfoValue) {
        self.values.insert(code, value);
    }

    /// Builder form of [`TransferInfo::insert`].
    pub fn with(mut self, code: InfoCode, value: InfoValue) -> Self {
        self.insert(code, value);
        self
    }

    /// Value for `code`, if reported.
    pub fn get(&self, code: InfoCode) -> Option<&InfoValue> {
        self.values.get(&code)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
