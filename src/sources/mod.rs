//! Data sources: the reference catalog, observation feeds and replays

pub mod catalog;
pub mod error;
pub mod observation;
pub mod replay;

pub use catalog::{
    Catalog, CatalogAdvisory, CatalogLoad, CatalogLoader, JsonCatalogFiles, StaticCatalog,
};
pub use error::{CatalogError, CatalogResult};
pub use observation::{ObservationSource, QueuedObservationSource};
pub use replay::{ReplayError, ReplayScript, ReplayStep};
