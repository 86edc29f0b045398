// demos/streaming_demo.rs
//! Drives the pipeline with a simulated lossy 10 Hz stream.
//!
//! Run with: cargo run --example streaming_demo

use emg_stream::config::PipelineConfig;
use emg_stream::utils::time::SystemTimeProvider;
use emg_stream::worker::PipelineWorker;
use rand::Rng;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let worker = PipelineWorker::spawn(
        PipelineConfig::default(),
        Arc::new(SystemTimeProvider::new()),
    )?;
    let handle = worker.handle();
    let mut rng = rand::thread_rng();

    handle.on_connected()?;
    handle.start_recording()?;

    // 30 seconds of nominal 10 Hz delivery with ~15% loss
    for i in 0..300 {
        if rng.gen::<f32>() < 0.15 {
            continue;
        }
        let arrival_time = i as f64 * 0.1;
        let phase = arrival_time * std::f64::consts::TAU * 0.2;
        let amplitude = (phase.sin().abs() * 800.0) as i16;
        let payload = amplitude.to_le_bytes().to_vec();
        handle.on_notification(payload, arrival_time);
    }

    std::thread::sleep(std::time::Duration::from_millis(200));

    let snapshot = handle.snapshot()?;
    println!("SAR: {:.1}%", snapshot.sar);
    println!("raw points: {}", snapshot.raw_series.len());
    println!("envelope points: {}", snapshot.envelope_series.len());
    if let Some(&(t, v)) = snapshot.envelope_series.last() {
        println!("latest envelope: {:.4} at t={:.1}s", v, t);
    }

    let export = handle.stop_recording()?;
    for line in export.lines().take(8) {
        println!("{}", line);
    }
    println!("... ({} rows total)", export.lines().count() - 2);

    Ok(())
}
