use std::{
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
    time::Instant,
};

use tempfile::TempDir;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::types::AudioFormat;
use crate::infra::process;
use crate::presentation::views::DisplaySink;

use super::soundfont::{ConfigRejection, SoundFontSettings};
use super::types::{AudioClip, MidiSource, RenderReport, RenderStage, StageError, StageFailure};

/// Sample rate handed to the synthesizer. Fixed policy, not configurable.
const SAMPLE_RATE: u32 = 44_200;

const MIDI_FILE: &str = "out.mid";

/// External tool selection for the pipeline.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    pub synthesizer: PathBuf,
    pub transcoder: PathBuf,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            synthesizer: PathBuf::from("fluidsynth"),
            transcoder: PathBuf::from("ffmpeg"),
        }
    }
}

/// Conditions that abort a render call before the tool chain runs.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no sound font is configured; set one before rendering")]
    SoundFontMissing,
    #[error("configured sound font `{path}` is inaccessible or does not exist")]
    SoundFontUnavailable { path: PathBuf },
    #[error("failed to create scratch directory: {0}")]
    Workspace(#[source] io::Error),
    #[error("MIDI export failed: {0}")]
    MidiExport(#[source] io::Error),
    #[error("failed to write to the display sink: {0}")]
    Emit(#[source] io::Error),
}

/// Drives one MIDI source through synthesis and transcoding, emitting an
/// HTML audio element for every stage that produced a playable file.
///
/// The service owns the sound-font selection so that it persists across
/// renders without any process-wide state.
#[derive(Debug, Clone, Default)]
pub struct AuditionService {
    tools: ToolSettings,
    soundfont: SoundFontSettings,
}

impl AuditionService {
    pub fn new(tools: ToolSettings, soundfont: SoundFontSettings) -> Self {
        Self { tools, soundfont }
    }

    /// Apply a sound-font configuration call. See
    /// [`SoundFontSettings::update`].
    pub fn configure(&mut self, path: Option<&Path>, bank: Option<&str>) -> Vec<ConfigRejection> {
        self.soundfont.update(path, bank)
    }

    pub fn soundfont(&self) -> &SoundFontSettings {
        &self.soundfont
    }

    pub fn tools(&self) -> &ToolSettings {
        &self.tools
    }

    /// Which of the configured tools do not resolve on the search path.
    pub fn missing_tools(&self) -> Vec<PathBuf> {
        [&self.tools.synthesizer, &self.tools.transcoder]
            .into_iter()
            .filter(|tool| process::find_on_search_path(tool).is_none())
            .cloned()
            .collect()
    }

    /// Run the full pipeline for `source`.
    ///
    /// Returns `Err` only for the fatal preconditions (no sound font,
    /// scratch-dir or export failure, sink failure); external-tool
    /// failures land in the report. The scratch directory is removed on
    /// every exit path.
    pub fn render(
        &self,
        source: &dyn MidiSource,
        sink: &mut dyn DisplaySink,
    ) -> Result<RenderReport, RenderError> {
        let started_at = Instant::now();
        let mut report = RenderReport::default();

        for tool in self.missing_tools() {
            warn!(
                target = "application::audition::pipeline",
                tool = %tool.display(),
                "external tool not found on the search path; proceeding anyway"
            );
            report.missing_tools.push(tool);
        }

        let sound_font = self
            .soundfont
            .path()
            .ok_or(RenderError::SoundFontMissing)?
            .to_path_buf();
        if !sound_font.is_file() {
            return Err(RenderError::SoundFontUnavailable { path: sound_font });
        }

        let scratch = TempDir::new().map_err(RenderError::Workspace)?;
        let midi_path = scratch.path().join(MIDI_FILE);
        source.export_midi(&midi_path).map_err(RenderError::MidiExport)?;

        let ogg_path = scratch
            .path()
            .join(AudioFormat::OggVorbis.scratch_file_name());
        match self.synthesize(&midi_path, &ogg_path, &sound_font) {
            Ok(clip) => {
                sink.display_html(&clip.html()).map_err(RenderError::Emit)?;
                report.clips.push(clip);

                let mp3_path = scratch.path().join(AudioFormat::Mpeg3.scratch_file_name());
                match self.transcode(&ogg_path, &mp3_path) {
                    Ok(clip) => {
                        sink.display_html(&clip.html()).map_err(RenderError::Emit)?;
                        report.clips.push(clip);
                    }
                    Err(error) => {
                        warn!(
                            target = "application::audition::pipeline",
                            stage = RenderStage::Transcode.as_str(),
                            error = %error,
                            "stage failed; no MP3 element emitted"
                        );
                        report.failures.push(StageFailure {
                            stage: RenderStage::Transcode,
                            error,
                        });
                    }
                }
            }
            Err(error) => {
                warn!(
                    target = "application::audition::pipeline",
                    stage = RenderStage::Synthesize.as_str(),
                    error = %error,
                    "stage failed; skipping transcode"
                );
                report.failures.push(StageFailure {
                    stage: RenderStage::Synthesize,
                    error,
                });
            }
        }

        info!(
            target = "application::audition::pipeline",
            op = "audition::render",
            clips = report.clips.len(),
            failures = report.failures.len(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "render finished"
        );
        Ok(report)
    }

    fn synthesize(
        &self,
        midi: &Path,
        ogg: &Path,
        sound_font: &Path,
    ) -> Result<AudioClip, StageError> {
        let args: Vec<OsString> = vec![
            OsString::from("-T"),
            OsString::from("oga"),
            OsString::from("-nli"),
            OsString::from("-r"),
            OsString::from(SAMPLE_RATE.to_string()),
            OsString::from("-o"),
            OsString::from(format!(
                "synth.midi-bank-select={}",
                self.soundfont.bank()
            )),
            OsString::from("-F"),
            OsString::from(ogg),
            OsString::from(sound_font),
            OsString::from(midi),
        ];
        self.run_stage(
            RenderStage::Synthesize,
            &self.tools.synthesizer,
            args,
            ogg,
            AudioFormat::OggVorbis,
        )
    }

    fn transcode(&self, ogg: &Path, mp3: &Path) -> Result<AudioClip, StageError> {
        let args: Vec<OsString> = vec![
            OsString::from("-i"),
            OsString::from(ogg),
            OsString::from(mp3),
        ];
        self.run_stage(
            RenderStage::Transcode,
            &self.tools.transcoder,
            args,
            mp3,
            AudioFormat::Mpeg3,
        )
    }

    fn run_stage(
        &self,
        stage: RenderStage,
        tool: &Path,
        args: Vec<OsString>,
        output: &Path,
        format: AudioFormat,
    ) -> Result<AudioClip, StageError> {
        let tool_started = Instant::now();
        info!(
            target = "application::audition::pipeline",
            op = stage.as_str(),
            command = %format_command(tool, &args),
            "invoking external tool"
        );

        let status = process::run_for_status(tool, &args)?;
        if !status.success() {
            let tool = tool.display().to_string();
            return Err(match status.code() {
                Some(code) => StageError::NonZeroExit { tool, status: code },
                None => StageError::Interrupted { tool },
            });
        }

        let payload = fs::read(output).map_err(|source| StageError::ReadOutput {
            path: output.to_path_buf(),
            source,
        })?;
        info!(
            target = "application::audition::pipeline",
            op = stage.as_str(),
            result = "ok",
            elapsed_ms = tool_started.elapsed().as_millis() as u64,
            payload_bytes = payload.len(),
            "stage produced a clip"
        );
        Ok(AudioClip::from_bytes(format, &payload))
    }
}

fn format_command(tool: &Path, args: &[OsString]) -> String {
    let mut pieces = vec![tool.display().to_string()];
    pieces.extend(args.iter().map(|arg| arg.to_string_lossy().into_owned()));
    pieces.join(" ")
}
