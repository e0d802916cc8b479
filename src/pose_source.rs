// src/pose_source.rs
//
// Pose recordings on disk: one JSON object per line, each a PoseFrame
// ({"timestamp": .., "keypoints": [..], "frame_size": {..}}). Every file
// is an independent stream.

use crate::types::{PoseFrame, ReplayConfig};
use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

const RECORDING_EXTENSIONS: [&str; 2] = ["jsonl", "ndjson"];

pub struct PoseSource {
    input_dir: PathBuf,
}

/// A recording file and the stream label its outputs are named after.
/// Labels are unique within one `find_recordings` result.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub path: PathBuf,
    pub stream: String,
}

impl PoseSource {
    pub fn new(config: &ReplayConfig) -> Self {
        Self {
            input_dir: PathBuf::from(&config.input_dir),
        }
    }

    /// All recordings under the input directory, sorted by path.
    pub fn find_recordings(&self) -> Result<Vec<Recording>> {
        if !self.input_dir.is_dir() {
            anyhow::bail!("Input directory not found: {}", self.input_dir.display());
        }

        let mut recordings: Vec<PathBuf> = WalkDir::new(&self.input_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| is_recording(p))
            .collect();
        recordings.sort();

        info!(
            "Found {} pose recordings in {}",
            recordings.len(),
            self.input_dir.display()
        );

        let streams = stream_names(&self.input_dir, &recordings);
        Ok(recordings
            .into_iter()
            .zip(streams)
            .map(|(path, stream)| Recording { path, stream })
            .collect())
    }

    pub fn open(&self, path: &Path) -> Result<PoseReader> {
        PoseReader::open(path)
    }
}

fn is_recording(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            RECORDING_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Stream label for a recording: its path below `root`, extension
/// dropped, components joined with `_` (`a/cam.jsonl` -> `a_cam`).
pub fn stream_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path).with_extension("");
    let name = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("_");

    if name.is_empty() {
        "stream".to_string()
    } else {
        name
    }
}

/// Unique labels for `paths`, in order. Recordings that differ only by
/// extension keep it as a suffix (`cam_jsonl`, `cam_ndjson`); any label
/// still taken gets a counter.
pub fn stream_names(root: &Path, paths: &[PathBuf]) -> Vec<String> {
    let base: Vec<String> = paths.iter().map(|p| stream_name(root, p)).collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in &base {
        *counts.entry(name.as_str()).or_default() += 1;
    }

    let mut taken = HashSet::new();
    paths
        .iter()
        .zip(&base)
        .map(|(path, name)| {
            let first_choice = if counts[name.as_str()] > 1 {
                let ext = path
                    .extension()
                    .map(|e| e.to_string_lossy().to_lowercase())
                    .unwrap_or_default();
                format!("{}_{}", name, ext)
            } else {
                name.clone()
            };

            let mut label = first_choice.clone();
            let mut n = 2;
            while taken.contains(&label) {
                label = format!("{}_{}", first_choice, n);
                n += 1;
            }
            if label != *name {
                warn!(
                    "Stream label '{}' is shared by several recordings, using '{}' for {}",
                    name,
                    label,
                    path.display()
                );
            }
            taken.insert(label.clone());
            label
        })
        .collect()
}

pub struct PoseReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
    frames_read: u64,
    lines_skipped: u64,
}

impl PoseReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open pose recording: {}", path.display()))?;
        info!("Opening pose recording: {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            line_no: 0,
            frames_read: 0,
            lines_skipped: 0,
        })
    }

    /// Next frame in the file. Blank lines are ignored; malformed lines
    /// are logged and skipped. Only I/O failures are errors.
    pub fn read_frame(&mut self) -> Result<Option<PoseFrame>> {
        loop {
            let line = match self.lines.next() {
                Some(line) => line.with_context(|| {
                    format!(
                        "Failed to read line {} of {}",
                        self.line_no + 1,
                        self.path.display()
                    )
                })?,
                None => return Ok(None),
            };
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<PoseFrame>(trimmed) {
                Ok(frame) => {
                    self.frames_read += 1;
                    return Ok(Some(frame));
                }
                Err(e) => {
                    self.lines_skipped += 1;
                    warn!(
                        "{}:{}: skipping malformed pose frame: {}",
                        self.path.display(),
                        self.line_no,
                        e
                    );
                }
            }
        }
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    pub fn lines_skipped(&self) -> u64 {
        self.lines_skipped
    }
}
