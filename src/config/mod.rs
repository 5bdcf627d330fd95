//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::domain::types::MidiBank;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "squillo";
pub(crate) const DEFAULT_SYNTHESIZER: &str = "fluidsynth";
pub(crate) const DEFAULT_TRANSCODER: &str = "ffmpeg";

/// Command-line arguments for the squillo binary.
#[derive(Debug, Parser)]
#[command(
    name = "squillo",
    version,
    about = "Render MIDI sources as embeddable HTML audio"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "SQUILLO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render a MIDI file and emit HTML audio elements.
    Render(RenderArgs),
    /// Check that the external tools and the sound font are available.
    Doctor(DoctorArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// MIDI file to audition.
    #[arg(value_name = "MIDI", value_hint = ValueHint::FilePath)]
    pub midi: PathBuf,

    /// Sound font applied for this invocation (a configuration call; an
    /// invalid path is rejected and the configured one is kept).
    #[arg(long = "sound-font", value_name = "PATH")]
    pub sound_font: Option<PathBuf>,

    /// MIDI bank selection: gs, gm, xg or mma.
    #[arg(long = "midi-bank", value_name = "BANK")]
    pub midi_bank: Option<String>,

    /// Write the emitted HTML fragments to a file instead of stdout.
    #[arg(long = "html-out", value_name = "PATH")]
    pub html_out: Option<PathBuf>,

    /// Print the render report as JSON on stdout.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,

    #[command(flatten)]
    pub overrides: CommonOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct DoctorArgs {
    /// Sound font to check instead of the configured one.
    #[arg(long = "sound-font", value_name = "PATH")]
    pub sound_font: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: CommonOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CommonOverrides {
    /// Override the synthesizer executable.
    #[arg(long = "synthesizer-path", value_name = "PATH")]
    pub synthesizer_path: Option<PathBuf>,

    /// Override the transcoder executable.
    #[arg(long = "transcoder-path", value_name = "PATH")]
    pub transcoder_path: Option<PathBuf>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub audition: AuditionSettings,
    pub sound_font: SoundFontSelection,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct AuditionSettings {
    pub synthesizer_path: PathBuf,
    pub transcoder_path: PathBuf,
}

/// Initial sound-font selection. The path's existence is validated by the
/// configuration holder and again at render time, not here.
#[derive(Debug, Clone, Default)]
pub struct SoundFontSelection {
    pub path: Option<PathBuf>,
    pub bank: MidiBank,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("SQUILLO").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match &cli.command {
        Command::Render(args) => raw.apply_overrides(&args.overrides),
        Command::Doctor(args) => raw.apply_overrides(&args.overrides),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    audition: RawAuditionSettings,
    sound_font: RawSoundFontSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &CommonOverrides) {
        if let Some(path) = overrides.synthesizer_path.as_ref() {
            self.audition.synthesizer_path = Some(path.clone());
        }
        if let Some(path) = overrides.transcoder_path.as_ref() {
            self.audition.transcoder_path = Some(path.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            audition,
            sound_font,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let audition = build_audition_settings(audition)?;
        let sound_font = build_sound_font_selection(sound_font)?;

        Ok(Self {
            logging,
            audition,
            sound_font,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_audition_settings(audition: RawAuditionSettings) -> Result<AuditionSettings, LoadError> {
    let synthesizer_path = audition
        .synthesizer_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SYNTHESIZER));
    if synthesizer_path.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "audition.synthesizer_path",
            "path must not be empty",
        ));
    }

    let transcoder_path = audition
        .transcoder_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TRANSCODER));
    if transcoder_path.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "audition.transcoder_path",
            "path must not be empty",
        ));
    }

    Ok(AuditionSettings {
        synthesizer_path,
        transcoder_path,
    })
}

fn build_sound_font_selection(
    sound_font: RawSoundFontSettings,
) -> Result<SoundFontSelection, LoadError> {
    let bank = match sound_font.bank {
        Some(bank) => bank
            .parse::<MidiBank>()
            .map_err(|err| LoadError::invalid("sound_font.bank", err.to_string()))?,
        None => MidiBank::default(),
    };

    let path = sound_font
        .path
        .filter(|value| !value.as_os_str().is_empty());

    Ok(SoundFontSelection { path, bank })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAuditionSettings {
    synthesizer_path: Option<PathBuf>,
    transcoder_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSoundFontSettings {
    path: Option<PathBuf>,
    bank: Option<String>,
}

/// Resolve configuration using the supplied CLI arguments, returning both
/// for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
