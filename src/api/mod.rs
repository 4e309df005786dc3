//! Engine-facing API
//!
//! [`PositioningEngine`] is the thread-safe entry point: lifecycle calls,
//! observation batches, snapshot reads and event callbacks.
//! [`EngineMailbox`] puts a single worker thread in front of it for hosts
//! that deliver radio callbacks on arbitrary threads.

pub mod callback;
pub mod engine;
pub mod mailbox;
pub mod types;

pub use callback::{CallbackHandle, EventCallback};
pub use engine::PositioningEngine;
pub use mailbox::{EngineCommand, EngineMailbox, MailboxHandle};
pub use types::{EngineError, EngineEvent, EngineResult, Notice};
