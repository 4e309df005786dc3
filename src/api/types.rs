//! Common API types and data structures

use crate::core::EngineSnapshot;
use crate::processing::StartRejection;
use crate::sources::{CatalogAdvisory, CatalogError};
use crate::utils::ConfigError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine construction and mailbox errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// No catalog source could be loaded
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Configuration rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The mailbox worker thread could not be started
    #[error("failed to spawn engine worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// The mailbox worker is no longer accepting commands
    #[error("engine worker has stopped")]
    WorkerStopped,
}

/// User-facing advisory emitted alongside snapshots
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    ScanningStarted,
    ScanningStopped,
    StartRejected(StartRejection),
    /// Scanning was forced off by the host
    Interrupted { reason: String },
    Catalog(CatalogAdvisory),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::ScanningStarted => write!(f, "Scanning beacons..."),
            Notice::ScanningStopped => write!(f, "Stopped scanning beacons"),
            Notice::StartRejected(rejection) => write!(f, "{}", rejection),
            Notice::Interrupted { reason } => write!(f, "{}. Scanning stopped.", reason),
            Notice::Catalog(advisory) => write!(f, "{}", advisory),
        }
    }
}

/// Event delivered to registered callbacks
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    SnapshotPublished(Arc<EngineSnapshot>),
    Notice(Notice),
}

impl EngineEvent {
    pub fn snapshot(&self) -> Option<&Arc<EngineSnapshot>> {
        match self {
            EngineEvent::SnapshotPublished(snapshot) => Some(snapshot),
            EngineEvent::Notice(_) => None,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            EngineEvent::Notice(notice) => Some(notice),
            EngineEvent::SnapshotPublished(_) => None,
        }
    }
}
