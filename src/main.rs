use beacon_positioning::sources::ReplayStep;
use beacon_positioning::utils::logging;
use beacon_positioning::{
    BeaconRecord, EngineConfig, EngineEvent, Observation, PositioningEngine, ReplayScript,
    StaticCatalog,
};
use tracing::{error, info};

/// Print every published snapshot as one JSON line and log notices
fn attach_printer(engine: &PositioningEngine) {
    engine.register_event_callback(Box::new(|event| match event {
        EngineEvent::SnapshotPublished(snapshot) => match serde_json::to_string(&**snapshot) {
            Ok(line) => println!("{}", line),
            Err(e) => error!(error = %e, "failed to encode snapshot"),
        },
        EngineEvent::Notice(notice) => info!(%notice, "notice"),
    }));
}

/// Three beacons, two of them on floor 1, seen through a short session
fn demo_script() -> (Vec<BeaconRecord>, ReplayScript) {
    let catalog = vec![
        BeaconRecord::new("A", 0.0, 0.0, 1),
        BeaconRecord::new("B", 0.0, 2.0, 1),
        BeaconRecord::new("C", 5.0, 5.0, 2),
    ];

    let script = ReplayScript::new(vec![
        ReplayStep::Start { ready: false },
        ReplayStep::Start { ready: true },
        ReplayStep::Batch {
            observations: vec![Observation::new("A", -59), Observation::new("B", -69)],
        },
        ReplayStep::Batch {
            observations: vec![Observation::new("Z", -70)],
        },
        ReplayStep::Stop,
        ReplayStep::Stop,
    ]);

    (catalog, script)
}

fn run_demo() -> Result<(), Box<dyn std::error::Error>> {
    let (records, script) = demo_script();
    let engine = PositioningEngine::from_loader(&StaticCatalog::new(records), EngineConfig::default())?;
    attach_printer(&engine);
    script.run(&engine);
    Ok(())
}

fn run_replay(config_path: &str, script_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::from_file(config_path)?;
    let script = ReplayScript::from_file(script_path)?;

    let engine = PositioningEngine::from_config(config)?;
    attach_printer(&engine);
    script.run(&engine);

    let stats = engine.stats();
    info!(
        batches = stats.batches_processed,
        ignored = stats.batches_ignored,
        snapshots = stats.snapshots_published,
        "replay finished"
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init()?;

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map_or("beacon-replay", |s| s.as_str());

    if args.len() == 2 && args[1] == "--demo" {
        return run_demo();
    }

    if args.len() != 3 {
        eprintln!("Usage: {} <config.json> <script.jsonl>", program);
        eprintln!("   or: {} --demo", program);
        return Err("Invalid arguments".into());
    }

    if let Err(e) = run_replay(&args[1], &args[2]) {
        error!(error = %e, "replay failed");
        return Err(e);
    }
    Ok(())
}
