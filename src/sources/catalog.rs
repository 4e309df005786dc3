//! Reference beacon catalog and its loaders

use crate::core::BeaconRecord;
use crate::sources::error::{CatalogError, CatalogResult};
use crate::validation::DataValidator;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Non-fatal problem found while building the catalog
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogAdvisory {
    /// A whole source could not be loaded
    SourceFailed { source: String, reason: String },
    /// One entry was malformed and skipped
    RecordDropped { source: String, reason: String },
    /// A second record reused an id; the first one is kept
    DuplicateBeacon { source: String, beacon_id: String },
    /// Loading succeeded but produced no beacons
    EmptyCatalog,
}

impl fmt::Display for CatalogAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogAdvisory::SourceFailed { source, reason } => {
                write!(f, "Error loading beacon data: {}: {}", source, reason)
            }
            CatalogAdvisory::RecordDropped { source, reason } => {
                write!(f, "Skipped beacon entry in {}: {}", source, reason)
            }
            CatalogAdvisory::DuplicateBeacon { source, beacon_id } => {
                write!(f, "Duplicate beacon {} in {} ignored", beacon_id, source)
            }
            CatalogAdvisory::EmptyCatalog => write!(f, "No reference beacons loaded"),
        }
    }
}

/// Immutable id -> record lookup shared by the engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    records: BTreeMap<String, BeaconRecord>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog, dropping malformed and duplicate records
    pub fn from_records<I>(records: I, source: &str) -> (Self, Vec<CatalogAdvisory>)
    where
        I: IntoIterator<Item = BeaconRecord>,
    {
        let mut catalog = Self::empty();
        let advisories = catalog.extend(records, source);
        (catalog, advisories)
    }

    fn extend<I>(&mut self, records: I, source: &str) -> Vec<CatalogAdvisory>
    where
        I: IntoIterator<Item = BeaconRecord>,
    {
        let validator = DataValidator::new();
        let mut advisories = Vec::new();

        for record in records {
            if let Err(error) = validator.validate_record(&record) {
                warn!(source, %error, "dropping malformed beacon record");
                advisories.push(CatalogAdvisory::RecordDropped {
                    source: source.to_string(),
                    reason: error.to_string(),
                });
                continue;
            }

            if self.records.contains_key(&record.id) {
                warn!(source, beacon_id = %record.id, "duplicate beacon record ignored");
                advisories.push(CatalogAdvisory::DuplicateBeacon {
                    source: source.to_string(),
                    beacon_id: record.id,
                });
                continue;
            }

            self.records.insert(record.id.clone(), record);
        }

        advisories
    }

    pub fn get(&self, id: &str) -> Option<&BeaconRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &BeaconRecord> {
        self.records.values()
    }
}

/// A loaded catalog together with everything worth telling the user
#[derive(Debug, Clone, Default)]
pub struct CatalogLoad {
    pub catalog: Catalog,
    pub advisories: Vec<CatalogAdvisory>,
}

/// One-shot provider of the reference catalog
pub trait CatalogLoader {
    /// Load every configured source.
    ///
    /// Individual entry and source failures are reported as advisories.
    /// An error is returned only when no source could be loaded at all.
    fn load_catalog(&self) -> CatalogResult<CatalogLoad>;
}

/// In-memory catalog source
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    records: Vec<BeaconRecord>,
}

impl StaticCatalog {
    pub fn new(records: Vec<BeaconRecord>) -> Self {
        Self { records }
    }
}

impl CatalogLoader for StaticCatalog {
    fn load_catalog(&self) -> CatalogResult<CatalogLoad> {
        let (catalog, mut advisories) = Catalog::from_records(self.records.clone(), "static");
        if catalog.is_empty() {
            advisories.push(CatalogAdvisory::EmptyCatalog);
        }
        Ok(CatalogLoad {
            catalog,
            advisories,
        })
    }
}

/// Paged catalog document as exported by the beacon registry
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogPage {
    items: Vec<serde_json::Value>,
    #[serde(default)]
    total_items_count: Option<u64>,
}

/// Catalog assembled from a list of JSON page files
#[derive(Debug, Clone, Default)]
pub struct JsonCatalogFiles {
    paths: Vec<PathBuf>,
}

impl JsonCatalogFiles {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Read one page, decoding each item on its own so a bad entry
    /// does not take the rest of the page with it
    fn load_page(path: &Path) -> CatalogResult<(Vec<BeaconRecord>, Vec<CatalogAdvisory>)> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let page: CatalogPage =
            serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let label = path.display().to_string();
        let mut records = Vec::with_capacity(page.items.len());
        let mut advisories = Vec::new();

        for item in page.items {
            match serde_json::from_value::<BeaconRecord>(item) {
                Ok(record) => records.push(record),
                Err(error) => {
                    warn!(source = %label, %error, "skipping undecodable beacon entry");
                    advisories.push(CatalogAdvisory::RecordDropped {
                        source: label.clone(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        if let Some(total) = page.total_items_count {
            debug!(source = %label, total, decoded = records.len(), "catalog page read");
        }

        Ok((records, advisories))
    }
}

impl CatalogLoader for JsonCatalogFiles {
    fn load_catalog(&self) -> CatalogResult<CatalogLoad> {
        let mut load = CatalogLoad::default();
        let mut loaded_sources = 0usize;

        for path in &self.paths {
            let label = path.display().to_string();
            match Self::load_page(path) {
                Ok((records, advisories)) => {
                    loaded_sources += 1;
                    load.advisories.extend(advisories);
                    let dropped = load.catalog.extend(records, &label);
                    load.advisories.extend(dropped);
                }
                Err(error) => {
                    warn!(source = %label, %error, "catalog page unavailable");
                    load.advisories.push(CatalogAdvisory::SourceFailed {
                        source: label,
                        reason: error.to_string(),
                    });
                }
            }
        }

        if !self.paths.is_empty() && loaded_sources == 0 {
            return Err(CatalogError::NoUsableSources {
                attempted: self.paths.len(),
            });
        }

        if load.catalog.is_empty() {
            warn!("reference catalog is empty");
            load.advisories.push(CatalogAdvisory::EmptyCatalog);
        }

        info!(
            beacons = load.catalog.len(),
            sources = loaded_sources,
            advisories = load.advisories.len(),
            "reference catalog loaded"
        );
        Ok(load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn page_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_from_records_drops_bad_entries() {
        let records = vec![
            BeaconRecord::new("A", 0.0, 0.0, 1),
            BeaconRecord::new("B", f64::NAN, 0.0, 1),
            BeaconRecord::new("A", 1.0, 1.0, 2),
        ];
        let (catalog, advisories) = Catalog::from_records(records, "test");

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("A").unwrap().floor_id, 1);
        assert_eq!(advisories.len(), 2);
        assert!(matches!(advisories[0], CatalogAdvisory::RecordDropped { .. }));
        assert!(matches!(advisories[1], CatalogAdvisory::DuplicateBeacon { .. }));
    }

    #[test]
    fn test_json_pages_merge() {
        let first = page_file(
            r#"{"items": [{"beaconUid": "A", "latitude": 52.0, "longitude": 21.0, "floorId": 0}],
                "totalPages": 1, "itemsFrom": 0, "itemsTo": 1, "totalItemsCount": 1}"#,
        );
        let second = page_file(
            r#"{"items": [
                {"beaconUid": "B", "latitude": 52.1, "longitude": 21.1, "floorId": 1},
                {"beaconUid": "C", "latitude": 52.2}
            ]}"#,
        );

        let loader = JsonCatalogFiles::new([first.path(), second.path()]);
        let load = loader.load_catalog().unwrap();

        assert_eq!(load.catalog.len(), 2);
        assert!(load.catalog.contains("A"));
        assert!(load.catalog.contains("B"));
        assert_eq!(load.advisories.len(), 1);
        assert!(matches!(load.advisories[0], CatalogAdvisory::RecordDropped { .. }));
    }

    #[test]
    fn test_partial_source_failure_is_advisory() {
        let good = page_file(
            r#"{"items": [{"beaconUid": "A", "latitude": 52.0, "longitude": 21.0, "floorId": 0}]}"#,
        );
        let loader = JsonCatalogFiles::new([
            good.path().to_path_buf(),
            PathBuf::from("/nonexistent/beacons_gg9.txt"),
        ]);

        let load = loader.load_catalog().unwrap();
        assert_eq!(load.catalog.len(), 1);
        assert!(matches!(
            load.advisories.as_slice(),
            [CatalogAdvisory::SourceFailed { .. }]
        ));
    }

    #[test]
    fn test_total_failure_is_error() {
        let broken = page_file("not json");
        let loader = JsonCatalogFiles::new([
            broken.path().to_path_buf(),
            PathBuf::from("/nonexistent/beacons_gg9.txt"),
        ]);

        match loader.load_catalog() {
            Err(CatalogError::NoUsableSources { attempted }) => assert_eq!(attempted, 2),
            other => panic!("expected NoUsableSources, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_catalog_advisory() {
        let load = StaticCatalog::default().load_catalog().unwrap();
        assert!(load.catalog.is_empty());
        assert_eq!(load.advisories, vec![CatalogAdvisory::EmptyCatalog]);
    }
}
