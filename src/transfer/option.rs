//! Transfer option codes and values.
//!
//! Codes follow libcurl's `CURLOPT_*` numbering: the code's base
//! (`code / 10_000`) encodes the value class (long, object, function, off_t).

use crate::base::error::Error;
use bytes::Bytes;
use std::fmt;
use std::path::{Path, PathBuf};

const LONG: u32 = 0;
const OBJECT: u32 = 10_000;
const FUNCTION: u32 = 20_000;
const OFF_T: u32 = 30_000;

/// Value class of an option, derived from its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionClass {
    Long,
    Object,
    Function,
    OffT,
}

/// Numeric option code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionCode(u32);

macro_rules! option_codes {
    ($($name:ident = $base:ident + $n:expr;)*) => {
        impl OptionCode {
            $(pub const $name: OptionCode = OptionCode($base + $n);)*

            /// Symbolic name, for known codes.
            pub fn name(&self) -> Option<&'static str> {
                match *self {
                    $(OptionCode::$name => Some(stringify!($name)),)*
                    _ => None,
                }
            }
        }
    };
}

option_codes! {
    WRITEDATA = OBJECT + 1;
    URL = OBJECT + 2;
    PORT = LONG + 3;
    PROXY = OBJECT + 4;
    USERPWD = OBJECT + 5;
    PROXYUSERPWD = OBJECT + 6;
    RANGE = OBJECT + 7;
    READDATA = OBJECT + 9;
    ERRORBUFFER = OBJECT + 10;
    WRITEFUNCTION = FUNCTION + 11;
    READFUNCTION = FUNCTION + 12;
    TIMEOUT = LONG + 13;
    INFILESIZE = LONG + 14;
    POSTFIELDS = OBJECT + 15;
    REFERER = OBJECT + 16;
    USERAGENT = OBJECT + 18;
    HTTPHEADER = OBJECT + 23;
    SSLCERT = OBJECT + 25;
    HEADERDATA = OBJECT + 29;
    CUSTOMREQUEST = OBJECT + 36;
    VERBOSE = LONG + 41;
    NOPROGRESS = LONG + 43;
    NOBODY = LONG + 44;
    FAILONERROR = LONG + 45;
    UPLOAD = LONG + 46;
    POST = LONG + 47;
    FOLLOWLOCATION = LONG + 52;
    PROGRESSFUNCTION = FUNCTION + 56;
    PROGRESSDATA = OBJECT + 57;
    AUTOREFERER = LONG + 58;
    PROXYPORT = LONG + 59;
    POSTFIELDSIZE = LONG + 60;
    INTERFACE = OBJECT + 62;
    SSL_VERIFYPEER = LONG + 64;
    CAINFO = OBJECT + 65;
    MAXREDIRS = LONG + 68;
    CONNECTTIMEOUT = LONG + 78;
    HEADERFUNCTION = FUNCTION + 79;
    HTTPGET = LONG + 80;
    SSL_VERIFYHOST = LONG + 81;
    SSLKEY = OBJECT + 87;
    CAPATH = OBJECT + 97;
    ACCEPT_ENCODING = OBJECT + 102;
    PRIVATE = OBJECT + 103;
    HTTPAUTH = LONG + 107;
    IPRESOLVE = LONG + 113;
    MAXFILESIZE = LONG + 114;
    INFILESIZE_LARGE = OFF_T + 115;
    POSTFIELDSIZE_LARGE = OFF_T + 120;
    TIMEOUT_MS = LONG + 155;
    CONNECTTIMEOUT_MS = LONG + 156;
    COPYPOSTFIELDS = OBJECT + 165;
    USERNAME = OBJECT + 173;
    PASSWORD = OBJECT + 174;
    PROXYUSERNAME = OBJECT + 175;
    PROXYPASSWORD = OBJECT + 176;
    NOPROXY = OBJECT + 177;
    XFERINFOFUNCTION = FUNCTION + 219;
}

impl OptionCode {
    /// Wraps a raw option number.
    pub const fn from_raw(code: u32) -> Self {
        OptionCode(code)
    }

    /// The raw option number.
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Value class encoded in the code.
    pub fn class(&self) -> OptionClass {
        match self.0 / 10_000 {
            0 => OptionClass::Long,
            1 => OptionClass::Object,
            2 => OptionClass::Function,
            _ => OptionClass::OffT,
        }
    }

    /// Slots the coordinator and the handle use for their own bookkeeping:
    /// the user-data pointers handed back to callbacks, the private-storage
    /// slot and the error buffer.
    pub fn is_reserved(&self) -> bool {
        matches!(
            *self,
            OptionCode::WRITEDATA
                | OptionCode::READDATA
                | OptionCode::HEADERDATA
                | OptionCode::PROGRESSDATA
                | OptionCode::PRIVATE
                | OptionCode::ERRORBUFFER
        )
    }
}

impl fmt::Display for OptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "option {}", self.0),
        }
    }
}

/// Value carried by an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Long(i64),
    OffT(i64),
    Str(String),
    Bytes(Bytes),
    List(Vec<String>),
}

impl OptionValue {
    fn fits(&self, class: OptionClass) -> bool {
        match self {
            OptionValue::Long(_) => matches!(class, OptionClass::Long | OptionClass::OffT),
            OptionValue::OffT(_) => class == OptionClass::OffT,
            OptionValue::Str(_) | OptionValue::Bytes(_) | OptionValue::List(_) => {
                class == OptionClass::Object
            }
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Long(_) => "long",
            OptionValue::OffT(_) => "off_t",
            OptionValue::Str(_) => "string",
            OptionValue::Bytes(_) => "bytes",
            OptionValue::List(_) => "list",
        }
    }

    /// Integer payload of `Long` and `OffT` values.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            OptionValue::Long(v) | OptionValue::OffT(v) => Some(*v),
            _ => None,
        }
    }

    /// String payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Byte payload.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            OptionValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// List payload.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            OptionValue::List(l) => Some(l),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Long(i64::from(v))
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        OptionValue::Long(v)
    }
}

impl From<u32> for OptionValue {
    fn from(v: u32) -> Self {
        OptionValue::Long(i64::from(v))
    }
}

impl From<u16> for OptionValue {
    fn from(v: u16) -> Self {
        OptionValue::Long(i64::from(v))
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Str(s.to_owned())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Str(s)
    }
}

impl From<&Path> for OptionValue {
    fn from(p: &Path) -> Self {
        OptionValue::Str(p.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for OptionValue {
    fn from(p: PathBuf) -> Self {
        OptionValue::from(p.as_path())
    }
}

impl From<Bytes> for OptionValue {
    fn from(b: Bytes) -> Self {
        OptionValue::Bytes(b)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(l: Vec<String>) -> Self {
        OptionValue::List(l)
    }
}

/// Checks that `code` may be set by a caller and that `value` matches its class.
pub(crate) fn validate(code: OptionCode, value: &OptionValue) -> Result<(), Error> {
    if code.is_reserved() {
        return Err(Error::ReservedOption(code));
    }
    let class = code.class();
    if class == OptionClass::Function {
        return Err(Error::CallbackOption(code));
    }
    if !value.fits(class) {
        return Err(Error::InvalidArgument(format!(
            "{code} does not accept a {} value",
            value.type_name()
        )));
    }
    Ok(())
}

/// Ordered option list. Setting a code twice replaces the earlier value in
/// place, the way the engine keeps only the last value per option.
#[derive(Debug, Clone, Default)]
pub(crate) struct OptionList {
    entries: Vec<(OptionCode, OptionValue)>,
}

impl OptionList {
    pub(crate) fn set(&mut self, code: OptionCode, value: OptionValue) {
        if let Some((_, v)) = self.entries.iter_mut().find(|(c, _)| *c == code) {
            *v = value;
        } else {
            self.entries.push((code, value));
        }
    }

    pub(crate) fn get(&self, code: OptionCode) -> Option<&OptionValue> {
        self.entries.iter().find(|(c, _)| *c == code).map(|(_, v)| v)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (OptionCode, &OptionValue)> {
        self.entries.iter().map(|(c, v)| (*c, v))
    }

    pub(crate) fn to_vec(&self) -> Vec<(OptionCode, OptionValue)> {
        self.entries.clone()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
