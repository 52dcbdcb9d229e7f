//! Dispatch layer for Polyglot
//!
//! One source text goes out to every enabled translate instance at once. Each
//! instance gets a slot with its own generation counter, and only the result
//! of a slot's newest request is ever committed.
//!
//! - [`ServiceInvoker`] resolves builtin and plugin backends behind the
//!   service traits and negotiates languages before any call
//! - [`DispatchCoordinator`] turns user signals into slot commands
//! - [`Effect`] is everything the layer asks the outside world to do

pub mod coordinator;
pub mod effects;
pub mod invoker;
pub mod request;
mod slot;

pub use coordinator::{CoordinatorError, CoordinatorResult, DispatchCoordinator};
pub use effects::{Effect, HistoryRecord, CLIPBOARD_NOTIFY_TITLE};
pub use invoker::ServiceInvoker;
pub use request::{SourceInput, Translation, TranslationRequest};
pub use slot::{SlotStatus, SlotView};
