//! The transfer coordinator and the futures it resolves.

pub mod coordinator;
pub mod future;

pub use coordinator::{Coordinator, CoordinatorBuilder, DEFAULT_TIMER_FLOOR};
pub use future::{Outcome, ResponseFuture};
