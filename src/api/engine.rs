//! Thread-safe positioning engine
//!
//! Every mutating call goes through one mutex around the [`ScanSession`].
//! The latest snapshot and the session counters sit behind separate locks
//! that are only held for a copy, so readers never wait on batch
//! processing and never see a half-built snapshot.

use crate::api::callback::{CallbackHandle, CallbackRegistry, EventCallback};
use crate::api::types::{EngineEvent, EngineResult, Notice};
use crate::core::{EngineSnapshot, Observation};
use crate::processing::{ScanSession, SessionStats};
use crate::sources::{Catalog, CatalogAdvisory, CatalogLoad, CatalogLoader, ObservationSource};
use crate::utils::EngineConfig;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{info, warn};

/// Positioning and beacon-state engine. Share it with `Arc`.
///
/// Callbacks run on the thread performing the operation while the engine
/// is locked, so events arrive in order. Callbacks may read state through
/// `current_snapshot`, `is_scanning`, `stats`, `catalog` and `advisories`.
/// They must not call `start`, `stop`, `interrupt`, `on_observation_batch`
/// or the callback registration methods on the same engine; route
/// mutations through an [`EngineMailbox`](crate::api::EngineMailbox).
pub struct PositioningEngine {
    session: Mutex<ScanSession>,
    latest: RwLock<Arc<EngineSnapshot>>,
    stats: RwLock<SessionStats>,
    callbacks: Mutex<CallbackRegistry>,
    catalog: Arc<Catalog>,
    advisories: Vec<CatalogAdvisory>,
}

impl PositioningEngine {
    /// Build an engine around an already loaded catalog
    pub fn new(load: CatalogLoad, config: EngineConfig) -> EngineResult<Self> {
        let config = config.checked()?;
        for warning in config.validate().warnings {
            warn!(%warning, "engine configuration");
        }

        let catalog = Arc::new(load.catalog);
        let session = ScanSession::new(Arc::clone(&catalog), &config);
        let latest = RwLock::new(session.snapshot());
        let stats = RwLock::new(session.stats());

        info!(
            beacons = catalog.len(),
            advisories = load.advisories.len(),
            "positioning engine ready"
        );

        Ok(Self {
            session: Mutex::new(session),
            latest,
            stats,
            callbacks: Mutex::new(CallbackRegistry::default()),
            catalog,
            advisories: load.advisories,
        })
    }

    /// Load the catalog once through `loader` and build the engine
    pub fn from_loader(loader: &dyn CatalogLoader, config: EngineConfig) -> EngineResult<Self> {
        let load = loader.load_catalog()?;
        Self::new(load, config)
    }

    /// Build the engine from the catalog files named in the config
    pub fn from_config(config: EngineConfig) -> EngineResult<Self> {
        let loader = config.catalog_loader();
        Self::from_loader(&loader, config)
    }

    /// Latest snapshot, never blocked by batch processing
    pub fn current_snapshot(&self) -> Arc<EngineSnapshot> {
        Arc::clone(&self.latest.read())
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Advisories collected while loading the catalog
    pub fn advisories(&self) -> &[CatalogAdvisory] {
        &self.advisories
    }

    /// Scanning flag of the latest snapshot
    pub fn is_scanning(&self) -> bool {
        self.latest.read().scanning
    }

    pub fn stats(&self) -> SessionStats {
        *self.stats.read()
    }

    /// Register an event callback. The catalog advisories are delivered to
    /// it immediately, before this returns.
    pub fn register_event_callback(&self, callback: EventCallback) -> CallbackHandle {
        for advisory in &self.advisories {
            callback(&EngineEvent::Notice(Notice::Catalog(advisory.clone())));
        }
        self.callbacks.lock().register(callback)
    }

    pub fn unregister_callback(&self, handle: CallbackHandle) -> bool {
        self.callbacks.lock().unregister(handle)
    }

    /// Start scanning if `ready`. Returns `false` when already scanning or
    /// not ready; the reason is published as a notice.
    pub fn start(&self, ready: bool) -> bool {
        let mut session = self.session.lock();
        match session.start(ready) {
            Ok(snapshot) => {
                self.publish(&session, Some(Notice::ScanningStarted), snapshot);
                true
            }
            Err(rejection) => {
                warn!(%rejection, "start rejected");
                self.notify(Notice::StartRejected(rejection));
                false
            }
        }
    }

    /// Stop scanning. No-op when idle.
    pub fn stop(&self) {
        let mut session = self.session.lock();
        if let Some(snapshot) = session.stop() {
            self.publish(&session, Some(Notice::ScanningStopped), snapshot);
        }
    }

    /// Forced stop reported by the host, e.g. radio switched off.
    /// No-op when idle.
    pub fn interrupt(&self, reason: &str) {
        let mut session = self.session.lock();
        if let Some(snapshot) = session.interrupt(reason) {
            let notice = Notice::Interrupted {
                reason: reason.to_string(),
            };
            self.publish(&session, Some(notice), snapshot);
        }
    }

    /// Feed one observation batch. Ignored unless scanning.
    pub fn on_observation_batch(&self, batch: &[Observation]) {
        let mut session = self.session.lock();
        match session.on_observation_batch(batch) {
            Some(snapshot) => self.publish(&session, None, snapshot),
            None => *self.stats.write() = session.stats(),
        }
    }

    /// Drain every queued batch from `source` into the engine
    pub fn pump(&self, source: &mut dyn ObservationSource) -> usize {
        let mut batches = 0;
        while let Some(batch) = source.next_batch() {
            self.on_observation_batch(&batch);
            batches += 1;
        }
        batches
    }

    /// Swap in the new snapshot and counters, then notify. Called with the
    /// session locked.
    fn publish(&self, session: &ScanSession, notice: Option<Notice>, snapshot: Arc<EngineSnapshot>) {
        *self.latest.write() = Arc::clone(&snapshot);
        *self.stats.write() = session.stats();

        let callbacks = self.callbacks.lock();
        if let Some(notice) = notice {
            callbacks.dispatch(&EngineEvent::Notice(notice));
        }
        callbacks.dispatch(&EngineEvent::SnapshotPublished(snapshot));
    }

    fn notify(&self, notice: Notice) {
        self.callbacks.lock().dispatch(&EngineEvent::Notice(notice));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BeaconRecord, FloorState};
    use crate::processing::StartRejection;
    use crate::sources::{QueuedObservationSource, StaticCatalog};
    use std::collections::BTreeSet;
    use std::thread;

    fn scenario_records() -> Vec<BeaconRecord> {
        vec![
            BeaconRecord::new("A", 0.0, 0.0, 1),
            BeaconRecord::new("B", 0.0, 2.0, 1),
            BeaconRecord::new("C", 5.0, 5.0, 2),
        ]
    }

    fn engine() -> PositioningEngine {
        PositioningEngine::from_loader(
            &StaticCatalog::new(scenario_records()),
            EngineConfig::default(),
        )
        .unwrap()
    }

    fn recorder(engine: &PositioningEngine) -> Arc<Mutex<Vec<EngineEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        engine.register_event_callback(Box::new(move |event| sink.lock().push(event.clone())));
        events
    }

    fn assert_partition(snapshot: &EngineSnapshot, catalog: &Catalog) {
        let classification = &snapshot.classification;
        let detected = classification.detected();
        let same_floor = classification.same_floor();
        let other = classification.other();

        let all: BTreeSet<&str> = detected
            .union(&same_floor)
            .copied()
            .collect::<BTreeSet<_>>()
            .union(&other)
            .copied()
            .collect();
        assert_eq!(all, catalog.ids().collect::<BTreeSet<_>>());
        assert_eq!(detected.len() + same_floor.len() + other.len(), catalog.len());
    }

    #[test]
    fn test_scenario_two_beacons() {
        let engine = engine();
        assert!(engine.start(true));

        engine.on_observation_batch(&[Observation::new("A", -59), Observation::new("B", -69)]);
        let snapshot = engine.current_snapshot();

        assert_eq!(snapshot.floor, FloorState::on(1));
        assert_eq!(snapshot.classification.detected(), BTreeSet::from(["A", "B"]));
        assert!(snapshot.classification.same_floor().is_empty());
        assert_eq!(snapshot.classification.other(), BTreeSet::from(["C"]));

        // Inverse-square centroid of A (d = 1) and B (d = 10^0.25)
        let d_b = 10f64.powf(0.25);
        let w_b = 1.0 / (d_b * d_b);
        let expected_lon = 2.0 * w_b / (1.0 + w_b);
        assert!(snapshot.position.lat.abs() < 1e-12);
        assert!((snapshot.position.lon - expected_lon).abs() < 1e-12);
        assert!(snapshot.position.lon < 1.0);
        assert_partition(&snapshot, engine.catalog());
    }

    #[test]
    fn test_scenario_unknown_beacon() {
        let engine = engine();
        engine.start(true);
        engine.on_observation_batch(&[Observation::new("A", -59), Observation::new("B", -69)]);
        let before = engine.current_snapshot();

        engine.on_observation_batch(&[Observation::new("Z", -70)]);
        let after = engine.current_snapshot();

        assert!(after.classification.detected().is_empty());
        assert_eq!(after.floor, before.floor);
        assert_eq!(after.position, before.position);
        assert_partition(&after, engine.catalog());
    }

    #[test]
    fn test_scenario_not_ready() {
        let engine = engine();
        let events = recorder(&engine);
        let initial = engine.current_snapshot();

        assert!(!engine.start(false));
        assert!(!engine.is_scanning());

        engine.on_observation_batch(&[Observation::new("A", -59)]);
        assert_eq!(engine.current_snapshot(), initial);

        assert!(engine.start(true));
        engine.on_observation_batch(&[Observation::new("A", -59)]);
        assert_ne!(engine.current_snapshot(), initial);

        let events = events.lock();
        assert_eq!(
            events[0],
            EngineEvent::Notice(Notice::StartRejected(StartRejection::NotReady))
        );
        assert_eq!(events[1], EngineEvent::Notice(Notice::ScanningStarted));
    }

    #[test]
    fn test_stop_twice_same_snapshot() {
        let engine = engine();
        let events = recorder(&engine);
        engine.start(true);
        engine.on_observation_batch(&[Observation::new("A", -59)]);

        engine.stop();
        let once = engine.current_snapshot();
        let event_count = events.lock().len();

        engine.stop();
        assert_eq!(engine.current_snapshot(), once);
        assert_eq!(events.lock().len(), event_count);
        assert!(!once.scanning);
    }

    #[test]
    fn test_interrupt_emits_notice_once() {
        let engine = engine();
        let events = recorder(&engine);
        engine.start(true);

        engine.interrupt("Bluetooth turned off");
        engine.interrupt("Bluetooth turned off");

        let interrupts = events
            .lock()
            .iter()
            .filter(|e| matches!(e.notice(), Some(Notice::Interrupted { .. })))
            .count();
        assert_eq!(interrupts, 1);
        assert!(!engine.current_snapshot().scanning);
    }

    #[test]
    fn test_notice_precedes_snapshot() {
        let engine = engine();
        let events = recorder(&engine);
        engine.start(true);

        let events = events.lock();
        assert_eq!(events.len(), 2);
        assert!(events[0].notice().is_some());
        assert_eq!(events[1].snapshot().unwrap().sequence, 1);
    }

    #[test]
    fn test_one_event_per_snapshot() {
        let engine = engine();
        let events = recorder(&engine);
        engine.start(true);
        engine.on_observation_batch(&[]);
        engine.on_observation_batch(&[Observation::new("C", -60)]);
        engine.stop();

        let sequences: Vec<u64> = events
            .lock()
            .iter()
            .filter_map(|e| e.snapshot().map(|s| s.sequence))
            .collect();
        assert_eq!(sequences, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_catalog_advisories_replayed_on_register() {
        let mut records = scenario_records();
        records.push(BeaconRecord::new("D", f64::NAN, 0.0, 1));
        let engine =
            PositioningEngine::from_loader(&StaticCatalog::new(records), EngineConfig::default())
                .unwrap();

        assert_eq!(engine.catalog().len(), 3);
        assert_eq!(engine.advisories().len(), 1);

        let events = recorder(&engine);
        assert!(matches!(
            events.lock()[0],
            EngineEvent::Notice(Notice::Catalog(CatalogAdvisory::RecordDropped { .. }))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            min_distance_m: -1.0,
            ..Default::default()
        };
        let result = PositioningEngine::from_loader(&StaticCatalog::new(scenario_records()), config);
        assert!(matches!(result, Err(crate::api::EngineError::Config(_))));
    }

    #[test]
    fn test_callback_reads_engine_state() {
        use std::sync::mpsc;
        use std::time::Duration;

        let engine = Arc::new(engine());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&engine);
        let sink = Arc::clone(&seen);
        engine.register_event_callback(Box::new(move |event| {
            if let (Some(snapshot), Some(engine)) = (event.snapshot(), weak.upgrade()) {
                let stats = engine.stats();
                sink.lock().push((
                    snapshot.sequence,
                    engine.is_scanning(),
                    stats.batches_processed,
                    engine.current_snapshot().sequence,
                ));
            }
        }));

        let (done, finished) = mpsc::channel();
        let worker = {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                engine.start(true);
                engine.on_observation_batch(&[Observation::new("A", -59)]);
                engine.stop();
                let _ = done.send(());
            })
        };
        assert!(finished.recv_timeout(Duration::from_secs(5)).is_ok());
        worker.join().unwrap();

        assert_eq!(
            *seen.lock(),
            vec![(1, true, 0, 1), (2, true, 1, 2), (3, false, 1, 3)]
        );
    }

    #[test]
    fn test_ignored_batch_counted() {
        let engine = engine();
        engine.on_observation_batch(&[Observation::new("A", -59)]);
        assert_eq!(engine.stats().batches_ignored, 1);
        assert!(!engine.is_scanning());
    }

    #[test]
    fn test_unregister_stops_delivery() {
        let engine = engine();
        let events = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&events);
        let handle = engine.register_event_callback(Box::new(move |_| *sink.lock() += 1));

        engine.start(true);
        assert!(engine.unregister_callback(handle));
        engine.stop();
        assert_eq!(*events.lock(), 2);
    }

    #[test]
    fn test_pump_drains_source() {
        let engine = engine();
        engine.start(true);

        let mut source: QueuedObservationSource = vec![
            vec![Observation::new("A", -59)],
            vec![Observation::new("C", -59)],
        ]
        .into_iter()
        .collect();

        assert_eq!(engine.pump(&mut source), 2);
        assert_eq!(engine.current_snapshot().floor, FloorState::on(2));
        assert_eq!(engine.stats().batches_processed, 2);
    }

    #[test]
    fn test_concurrent_batches_and_readers() {
        let engine = Arc::new(engine());
        engine.start(true);

        let writers: Vec<_> = (0..4)
            .map(|i| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for _ in 0..50 {
                        let id = if i % 2 == 0 { "A" } else { "C" };
                        engine.on_observation_batch(&[Observation::new(id, -60)]);
                    }
                })
            })
            .collect();

        let reader = {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..200 {
                    let snapshot = engine.current_snapshot();
                    assert_partition(&snapshot, engine.catalog());
                    let detected = snapshot.classification.detected();
                    assert!(detected.len() <= 1);
                }
            })
        };

        for writer in writers {
            writer.join().unwrap();
        }
        reader.join().unwrap();

        let stats = engine.stats();
        assert_eq!(stats.batches_processed, 200);
        assert_eq!(engine.current_snapshot().sequence, 201);
    }
}
