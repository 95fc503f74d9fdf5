//! Transfer handles and the state attached to them.

pub mod callbacks;
pub mod handle;
pub mod info;
pub mod option;
pub mod sidetable;

pub use callbacks::Progress;
pub use handle::TransferHandle;
pub use info::{InfoCode, InfoValue, TransferInfo};
pub use option::{OptionCode, OptionValue};
pub use sidetable::SideTable;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique transfer identity.
///
/// Used as the registry key and as the token the engine carries for each
/// transfer, so completion messages can be matched back to their handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransferId(u64);

impl TransferId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        TransferId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Rebuilds an id from an engine token.
    pub fn from_token(token: u64) -> Self {
        TransferId(token)
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
