//! Observation batch processing

pub mod session;

pub use session::{ScanSession, SessionState, SessionStats, StartRejection};
