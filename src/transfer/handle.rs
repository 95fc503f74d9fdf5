use crate::base::error::Error;
use crate::engine::{EasyRequest, TransferIo};
use crate::http::accumulator::SharedAccumulator;
use crate::transfer::callbacks::{Callbacks, Progress, SharedCallbacks};
use crate::transfer::info::{InfoCode, InfoKind, InfoValue, TransferInfo};
use crate::transfer::option::{self, OptionCode, OptionList, OptionValue};
use crate::transfer::sidetable::SideTable;
use crate::transfer::TransferId;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// One configurable transfer.
///
/// A handle is configured by the caller, handed to the
/// [`Coordinator`](crate::multi::Coordinator) for the duration of the
/// transfer and returned through the [`Response`](crate::http::Response)
/// (or through [`Coordinator::remove`](crate::multi::Coordinator::remove)).
/// Info getters are meaningful only after the transfer has completed.
pub struct TransferHandle {
    id: TransferId,
    options: OptionList,
    callbacks: SharedCallbacks,
    side_table: SideTable,
    info: Option<TransferInfo>,
    error_buffer: String,
}

impl TransferHandle {
    /// Creates an unconfigured handle with a fresh id.
    pub fn new() -> Self {
        Self {
            id: TransferId::next(),
            options: OptionList::default(),
            callbacks: Rc::new(RefCell::new(Callbacks::default())),
            side_table: SideTable::default(),
            info: None,
            error_buffer: String::new(),
        }
    }

    /// Process-unique id, kept across [`TransferHandle::reset`].
    pub fn id(&self) -> TransferId {
        self.id
    }

    /// Sets an option. Reserved bookkeeping slots and callback slots are
    /// rejected; a value of the wrong class is an invalid argument.
    pub fn set_option(&mut self, code: OptionCode, value: impl Into<OptionValue>) -> Result<(), Error> {
        let value = value.into();
        option::validate(code, &value)?;
        self.options.set(code, value);
        Ok(())
    }

    /// The value set for `code`.
    pub fn option(&self, code: OptionCode) -> Option<&OptionValue> {
        self.options.get(code)
    }

    /// Options in the order they were first set.
    pub fn options(&self) -> impl Iterator<Item = (OptionCode, &OptionValue)> {
        self.options.iter()
    }

    /// Receives body data. Returning fewer bytes than given aborts the transfer.
    /// While set, the body is not collected into the response.
    pub fn set_write_function(&mut self, f: impl FnMut(&[u8]) -> usize + 'static) {
        self.callbacks.borrow_mut().write = Some(Box::new(f));
    }

    /// Supplies upload data. Returning `0` ends the upload.
    pub fn set_read_function(&mut self, f: impl FnMut(&mut [u8]) -> usize + 'static) {
        self.callbacks.borrow_mut().read = Some(Box::new(f));
    }

    /// Receives raw header lines. Returning `false` aborts the transfer.
    pub fn set_header_function(&mut self, f: impl FnMut(&[u8]) -> bool + 'static) {
        self.callbacks.borrow_mut().header = Some(Box::new(f));
    }

    /// Receives progress updates. Returning `false` aborts the transfer.
    pub fn set_progress_function(&mut self, f: impl FnMut(Progress) -> bool + 'static) {
        self.callbacks.borrow_mut().progress = Some(Box::new(f));
    }

    /// Whether a write callback is installed.
    pub fn has_write_function(&self) -> bool {
        self.callbacks.borrow().write.is_some()
    }

    /// Whether a read callback is installed.
    pub fn has_read_function(&self) -> bool {
        self.callbacks.borrow().read.is_some()
    }

    /// Drops every callback; options are kept.
    pub fn clear_callbacks(&mut self) {
        self.callbacks.borrow_mut().clear();
    }

    /// Coordinator attachments of this handle.
    pub fn side_table(&self) -> &SideTable {
        &self.side_table
    }

    pub(crate) fn side_table_mut(&mut self) -> &mut SideTable {
        &mut self.side_table
    }

    /// Restores the freshly-created state: options, callbacks, info and the
    /// error buffer are cleared. The id is kept.
    pub fn reset(&mut self) {
        self.options.clear();
        self.callbacks.borrow_mut().clear();
        self.side_table = SideTable::default();
        self.info = None;
        self.error_buffer.clear();
    }

    /// Engine-provided description of the last failure, if any.
    pub fn error_description(&self) -> Option<&str> {
        if self.error_buffer.is_empty() {
            None
        } else {
            Some(&self.error_buffer)
        }
    }

    /// Whether the handle holds info from a finished transfer.
    pub fn is_completed(&self) -> bool {
        self.info.is_some()
    }

    /// Everything the engine reported for the last transfer.
    pub fn info(&self) -> Result<&TransferInfo, Error> {
        self.info.as_ref().ok_or(Error::NotStarted)
    }

    fn lookup(&self, code: InfoCode, expected: &[InfoKind]) -> Result<Option<&InfoValue>, Error> {
        let info = self.info()?;
        if !expected.contains(&code.kind()) {
            return Err(Error::InfoType {
                code,
                actual: kind_name(code.kind()),
            });
        }
        Ok(info.get(code))
    }

    /// Integer-valued info. `Ok(None)` when the engine did not report it.
    pub fn int_info(&self, code: InfoCode) -> Result<Option<i64>, Error> {
        match self.lookup(code, &[InfoKind::Long, InfoKind::OffT])? {
            None => Ok(None),
            Some(InfoValue::Long(v)) => Ok(Some(*v)),
            Some(other) => Err(Error::InfoType {
                code,
                actual: other.type_name(),
            }),
        }
    }

    /// Float-valued info. `Ok(None)` when the engine did not report it.
    pub fn double_info(&self, code: InfoCode) -> Result<Option<f64>, Error> {
        match self.lookup(code, &[InfoKind::Double])? {
            None => Ok(None),
            Some(InfoValue::Double(v)) => Ok(Some(*v)),
            Some(other) => Err(Error::InfoType {
                code,
                actual: other.type_name(),
            }),
        }
    }

    /// String-valued info. `Ok(None)` when the engine did not report it.
    pub fn string_info(&self, code: InfoCode) -> Result<Option<&str>, Error> {
        match self.lookup(code, &[InfoKind::String])? {
            None | Some(InfoValue::Str(None)) => Ok(None),
            Some(InfoValue::Str(Some(s))) => Ok(Some(s)),
            Some(other) => Err(Error::InfoType {
                code,
                actual: other.type_name(),
            }),
        }
    }

    /// List-valued info. `Ok(None)` when the engine did not report it.
    pub fn list_info(&self, code: InfoCode) -> Result<Option<&[String]>, Error> {
        match self.lookup(code, &[InfoKind::List])? {
            None => Ok(None),
            Some(InfoValue::List(l)) => Ok(Some(l)),
            Some(other) => Err(Error::InfoType {
                code,
                actual: other.type_name(),
            }),
        }
    }

    /// Last HTTP status, or `None` when no response was received.
    pub fn response_code(&self) -> Result<Option<u16>, Error> {
        Ok(self
            .int_info(InfoCode::RESPONSE_CODE)?
            .and_then(|code| u16::try_from(code).ok())
            .filter(|code| *code != 0))
    }

    /// URL of the last request, after redirects.
    pub fn effective_url(&self) -> Result<Option<&str>, Error> {
        self.string_info(InfoCode::EFFECTIVE_URL)
    }

    /// Clears results of any previous run and produces what the engine needs
    /// to start this one.
    pub(crate) fn begin_transfer(&mut self, response: SharedAccumulator) -> EasyRequest {
        self.info = None;
        self.error_buffer.clear();
        EasyRequest {
            options: self.options.to_vec(),
            io: TransferIo::new(self.callbacks.clone(), response),
        }
    }

    pub(crate) fn finish_transfer(&mut self, info: TransferInfo, description: &str) {
        self.info = Some(info);
        self.error_buffer.clear();
        self.error_buffer.push_str(description);
    }

    pub(crate) fn abandon_transfer(&mut self) {
        self.side_table = SideTable::default();
        self.info = None;
    }
}

fn kind_name(kind: InfoKind) -> &'static str {
    match kind {
        InfoKind::String => "string",
        InfoKind::Long => "long",
        InfoKind::Double => "double",
        InfoKind::List => "list",
        InfoKind::OffT => "off_t",
    }
}

impl Default for TransferHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TransferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferHandle")
            .field("id", &self.id)
            .field("options", &self.options.len())
            .field("callbacks", &*self.callbacks.borrow())
            .field("side_table", &self.side_table)
            .field("completed", &self.info.is_some())
            .finish()
    }
}
