//! Recorded session replay
//!
//! A replay script is JSON Lines, one step per line:
//!
//! ```text
//! {"op":"start","ready":true}
//! {"op":"batch","observations":[{"beacon_id":"A","rssi":-59}]}
//! {"op":"interrupt","reason":"Bluetooth turned off"}
//! {"op":"stop"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use crate::api::PositioningEngine;
use crate::core::Observation;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// One recorded host interaction
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ReplayStep {
    Start {
        ready: bool,
    },
    Batch {
        #[serde(default)]
        observations: Vec<Observation>,
    },
    Stop,
    Interrupt {
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read replay script: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid replay step on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Ordered list of steps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayScript {
    steps: Vec<ReplayStep>,
}

impl ReplayScript {
    pub fn new(steps: Vec<ReplayStep>) -> Self {
        Self { steps }
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ReplayError> {
        let mut steps = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let step = serde_json::from_str(trimmed).map_err(|source| ReplayError::Parse {
                line: index + 1,
                source,
            })?;
            steps.push(step);
        }
        Ok(Self { steps })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ReplayError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn steps(&self) -> &[ReplayStep] {
        &self.steps
    }

    /// Apply every step to `engine` in order
    pub fn run(&self, engine: &PositioningEngine) {
        for step in &self.steps {
            debug!(?step, "replaying");
            match step {
                ReplayStep::Start { ready } => {
                    engine.start(*ready);
                }
                ReplayStep::Batch { observations } => engine.on_observation_batch(observations),
                ReplayStep::Stop => engine.stop(),
                ReplayStep::Interrupt { reason } => engine.interrupt(reason),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BeaconRecord;
    use crate::sources::StaticCatalog;
    use crate::utils::EngineConfig;
    use std::io::Cursor;

    const SCRIPT: &str = r#"
# two beacons on floor 1
{"op":"start","ready":true}
{"op":"batch","observations":[{"beacon_id":"A","rssi":-59},{"beacon_id":"B","rssi":-69,"reported_distance":1.8}]}

{"op":"stop"}
"#;

    #[test]
    fn test_parse_script() {
        let script = ReplayScript::from_reader(Cursor::new(SCRIPT)).unwrap();
        assert_eq!(script.steps().len(), 3);
        assert_eq!(script.steps()[0], ReplayStep::Start { ready: true });
        match &script.steps()[1] {
            ReplayStep::Batch { observations } => {
                assert_eq!(observations.len(), 2);
                assert_eq!(observations[1].reported_distance, Some(1.8));
            }
            other => panic!("unexpected step {:?}", other),
        }
        assert_eq!(script.steps()[2], ReplayStep::Stop);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let input = "{\"op\":\"start\",\"ready\":true}\n{\"op\":\"jump\"}\n";
        let error = ReplayScript::from_reader(Cursor::new(input)).unwrap_err();
        assert!(matches!(error, ReplayError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_run_against_engine() {
        let catalog = StaticCatalog::new(vec![
            BeaconRecord::new("A", 0.0, 0.0, 1),
            BeaconRecord::new("B", 0.0, 2.0, 1),
        ]);
        let engine = PositioningEngine::from_loader(&catalog, EngineConfig::default()).unwrap();

        ReplayScript::from_reader(Cursor::new(SCRIPT))
            .unwrap()
            .run(&engine);

        let snapshot = engine.current_snapshot();
        assert!(!snapshot.scanning);
        assert_eq!(snapshot.floor.current, Some(1));
        assert_eq!(snapshot.sequence, 3);
    }
}
