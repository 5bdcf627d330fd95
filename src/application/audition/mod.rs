//! The audition pipeline: MIDI export, synthesis, transcoding, and HTML
//! emission.
//!
//! The pipeline is strictly sequential: a source exports itself as MIDI
//! into a scratch directory, the synthesizer renders that file as
//! Ogg/Vorbis, and the transcoder converts the Ogg output to MP3. Each
//! stage that produces a playable file is emitted through the display
//! sink immediately and recorded in the returned report; external-tool
//! failures are report entries, never panics or propagated errors.

mod pipeline;
mod soundfont;
mod types;

pub use pipeline::{AuditionService, RenderError, ToolSettings};
pub use soundfont::{ConfigRejection, SoundFontSettings};
pub use types::{
    AudioClip, MidiBytes, MidiFile, MidiSource, RenderReport, RenderStage, StageError,
    StageFailure,
};
