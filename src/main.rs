// src/main.rs
//
// Replay runner: feeds recorded pose streams through the detectors and
// writes the resulting safety events.

use anyhow::{Context, Result};
use pose_safety_detection::pose_source::{PoseSource, Recording};
use pose_safety_detection::{Config, ConfirmationRequest, DetectionSession, SessionSummary};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let config_found = Path::new(&config_path).exists();
    let config = if config_found {
        Config::load(&config_path)?
    } else {
        Config::default()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("pose_safety_detection={}", config.logging.level))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🧍 Pose Safety Detection starting");
    if config_found {
        info!("✓ Configuration loaded from {}", config_path);
    } else {
        info!("{} not found, using default configuration", config_path);
    }

    let d = &config.detection;
    info!(
        "Detectors: fall={} ground={} hands_raised={} head_tilt={} | min keypoint score {:.2}",
        d.fall.enabled, d.ground.enabled, d.hands_raised.enabled, d.head_tilt.enabled, d.min_keypoint_score
    );

    let source = PoseSource::new(&config.replay);
    let recordings = source.find_recordings()?;
    if recordings.is_empty() {
        error!("No pose recordings found in {}", config.replay.input_dir);
        return Ok(());
    }

    // Streams are independent; each gets its own session on its own worker.
    let handles: Vec<_> = recordings
        .into_iter()
        .map(|recording| {
            let config = config.clone();
            let path = recording.path.clone();
            let handle =
                tokio::task::spawn_blocking(move || process_recording(&recording, &config));
            (path, handle)
        })
        .collect();

    let mut total_events = 0;
    for (path, handle) in handles {
        match handle.await {
            Ok(Ok(summary)) => {
                total_events += summary.total_events();
                log_summary(&summary);
            }
            Ok(Err(e)) => error!("Failed to process {}: {:#}", path.display(), e),
            Err(e) => error!("Worker for {} panicked: {}", path.display(), e),
        }
    }

    info!("✓ Replay complete: {} events in total", total_events);
    Ok(())
}

/// Line-per-record output files for one stream.
struct StreamOutputs {
    events: BufWriter<File>,
    confirmations: BufWriter<File>,
}

impl StreamOutputs {
    fn create(config: &Config, stream: &str) -> Result<Self> {
        std::fs::create_dir_all(&config.replay.output_dir).with_context(|| {
            format!("Failed to create output directory {}", config.replay.output_dir)
        })?;
        let events_path = output_path(config, stream, "events.jsonl");
        let confirmations_path = output_path(config, stream, "confirmations.jsonl");
        info!("💾 Events will be written to: {}", events_path.display());

        Ok(Self {
            events: create_writer(&events_path)?,
            confirmations: create_writer(&confirmations_path)?,
        })
    }

    fn flush(&mut self) -> Result<()> {
        self.events.flush().context("Failed to flush events file")?;
        self.confirmations
            .flush()
            .context("Failed to flush confirmations file")?;
        Ok(())
    }
}

fn create_writer(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn process_recording(recording: &Recording, config: &Config) -> Result<SessionSummary> {
    let stream = recording.stream.as_str();
    let mut reader = PoseSource::new(&config.replay).open(&recording.path)?;
    let mut session = DetectionSession::new(stream, config);

    let mut outputs = if config.replay.write_events {
        Some(StreamOutputs::create(config, stream)?)
    } else {
        None
    };

    while let Some(frame) = reader.read_frame()? {
        session.process_frame(&frame);

        for event in session.drain_events() {
            let request =
                ConfirmationRequest::from_event(&event, config.detection.min_keypoint_score);
            debug!(
                "[{}] confirmation payload ready for {} at {}",
                stream,
                request.event_type.as_str(),
                request.timestamp
            );
            if let Some(out) = outputs.as_mut() {
                save_line(&event, &mut out.events)?;
                save_line(&request.to_json()?, &mut out.confirmations)?;
            }
        }
    }

    if reader.lines_skipped() > 0 {
        warn!(
            "[{}] {} malformed lines skipped ({} frames read)",
            stream,
            reader.lines_skipped(),
            reader.frames_read()
        );
    }

    if let Some(mut out) = outputs {
        out.flush()?;
    }

    let summary = session.finish();

    if config.replay.write_events {
        let summary_path = output_path(config, stream, "summary.json");
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(&summary_path, json)
            .with_context(|| format!("Failed to write {}", summary_path.display()))?;
        info!("💾 Summary saved to {}", summary_path.display());
    }

    Ok(summary)
}

fn output_path(config: &Config, stream: &str, suffix: &str) -> PathBuf {
    Path::new(&config.replay.output_dir).join(format!("{}_{}", stream, suffix))
}

fn save_line(record: &impl Serialize, file: &mut impl Write) -> Result<()> {
    let json_line = serde_json::to_string(record)?;
    writeln!(file, "{}", json_line)?;
    Ok(())
}

fn log_summary(summary: &SessionSummary) {
    info!("\n========================================");
    info!("Stream '{}' ({})", summary.stream, summary.id);
    info!("========================================");
    info!(
        "  Frames: {} processed, {} rejected",
        summary.frames_processed, summary.frames_rejected
    );
    info!("  Stream duration: {:.1}s", summary.duration_secs);
    for (event_type, count) in &summary.events_by_type {
        if *count > 0 {
            warn!("  🚨 {}: {}", event_type.as_str(), count);
        } else {
            info!("  {}: 0", event_type.as_str());
        }
    }
}
