//! CLI runner: captures for a fixed duration, emitting pipeline events as
//! newline-delimited JSON on stdout. Level readings are interleaved at a
//! coarse cadence so a consumer can drive a visualizer from the same pipe.

use anyhow::Result;
use livemic::{
    init_logging, init_tracing, list_input_devices, log_debug, log_panic, AppConfig, ModelKind,
    NdjsonSink, Orchestrator,
};
use serde_json::json;
use std::thread;
use std::time::{Duration, Instant};

const LEVEL_PRINT_INTERVAL: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    init_logging(&config);
    init_tracing(&config);
    std::panic::set_hook(Box::new(|info| log_panic(info)));

    if config.list_input_devices {
        match list_input_devices() {
            Ok(devices) if devices.is_empty() => {
                println!("No audio input devices detected.");
            }
            Ok(devices) => {
                println!("Detected audio input devices:");
                for name in devices {
                    println!("  {name}");
                }
            }
            Err(err) => {
                println!("Failed to list audio input devices: {err:#}");
            }
        }
        return Ok(());
    }

    if config.list_models {
        println!("{}", serde_json::to_string_pretty(&ModelKind::catalogue())?);
        return Ok(());
    }

    log_debug(&format!(
        "starting pipeline: model={} sample_rate={} seconds={}",
        config.model.id(),
        config.sample_rate,
        config.seconds
    ));

    let orchestrator = Orchestrator::new(config.fallback_policy(), Box::new(NdjsonSink::stdout()));
    orchestrator.start(config.session_config())?;

    let deadline = Instant::now() + Duration::from_secs(config.seconds);
    while Instant::now() < deadline {
        thread::sleep(LEVEL_PRINT_INTERVAL);
        let sample = orchestrator.level();
        let state = orchestrator.state();
        println!(
            "{}",
            json!({
                "level": sample.value,
                "synthetic": sample.synthetic,
                "state": state.label(),
            })
        );
    }

    orchestrator.stop();
    let report = orchestrator.metrics_report();
    println!("{}", json!({ "metrics": report }));
    log_debug(&format!(
        "pipeline_metrics|dropped_events={}|final_state={}",
        orchestrator.dropped_events(),
        orchestrator.state().label()
    ));
    Ok(())
}
