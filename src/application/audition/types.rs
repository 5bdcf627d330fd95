use std::{
    fs, io,
    path::{Path, PathBuf},
};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Serialize;
use thiserror::Error;

use crate::domain::types::AudioFormat;
use crate::infra::process::ToolError;
use crate::presentation::views;

/// Capability to serialize oneself as standard MIDI at a given path.
///
/// Anything that can produce a MIDI file can be auditioned; the pipeline
/// never inspects the source beyond this one operation.
pub trait MidiSource {
    fn export_midi(&self, dest: &Path) -> io::Result<()>;
}

/// An existing MIDI file on disk, copied into the job's scratch directory.
#[derive(Debug, Clone)]
pub struct MidiFile {
    path: PathBuf,
}

impl MidiFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MidiSource for MidiFile {
    fn export_midi(&self, dest: &Path) -> io::Result<()> {
        fs::copy(&self.path, dest).map(|_| ())
    }
}

/// An in-memory MIDI payload.
#[derive(Debug, Clone)]
pub struct MidiBytes {
    bytes: Vec<u8>,
}

impl MidiBytes {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl MidiSource for MidiBytes {
    fn export_midi(&self, dest: &Path) -> io::Result<()> {
        fs::write(dest, &self.bytes)
    }
}

/// Pipeline stage that can fail without aborting the whole render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStage {
    Synthesize,
    Transcode,
}

impl RenderStage {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderStage::Synthesize => "synthesize",
            RenderStage::Transcode => "transcode",
        }
    }
}

/// Why an external-tool stage produced no clip.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Invoke(#[from] ToolError),
    #[error("`{tool}` exited with status {status}")]
    NonZeroExit { tool: String, status: i32 },
    #[error("`{tool}` was terminated before exiting")]
    Interrupted { tool: String },
    #[error("failed to read rendered audio `{path}`: {source}")]
    ReadOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One stage's failure, as recorded in the report.
#[derive(Debug)]
pub struct StageFailure {
    pub stage: RenderStage,
    pub error: StageError,
}

/// One successfully rendered audio payload, held in encoded form.
#[derive(Debug, Clone, Serialize)]
pub struct AudioClip {
    pub format: AudioFormat,
    pub base64: String,
}

impl AudioClip {
    pub fn from_bytes(format: AudioFormat, payload: &[u8]) -> Self {
        Self {
            format,
            base64: STANDARD.encode(payload),
        }
    }

    /// The embeddable `<audio>` element for this clip.
    pub fn html(&self) -> String {
        views::audio_element_from_base64(self.format, &self.base64)
    }
}

/// Outcome of one render call that made it past the fatal preconditions.
///
/// Stage failures are data here; `Err` is reserved for the conditions
/// that abort the call before the tool chain runs.
#[derive(Debug, Default)]
pub struct RenderReport {
    /// Tools the advisory preflight could not resolve.
    pub missing_tools: Vec<PathBuf>,
    /// Clips in emission order (Ogg before MP3).
    pub clips: Vec<AudioClip>,
    pub failures: Vec<StageFailure>,
}

impl RenderReport {
    pub fn fully_rendered(&self) -> bool {
        self.failures.is_empty() && !self.clips.is_empty()
    }
}
