//! Sound-font selection carried from one render to the next.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::domain::types::MidiBank;

/// Rejected half of a configuration call; the previous value is kept.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigRejection {
    #[error("sound font `{path}` is inaccessible or does not exist")]
    SoundFontNotFile { path: PathBuf },
    #[error("unknown MIDI bank `{value}`; expected one of gs, gm, xg, mma")]
    UnknownBank { value: String },
}

/// Sound font path and MIDI bank, validated on update.
///
/// The two fields validate independently: a bad path does not block a
/// bank update made in the same call, and vice versa.
#[derive(Debug, Clone, Default)]
pub struct SoundFontSettings {
    path: Option<PathBuf>,
    bank: MidiBank,
}

impl SoundFontSettings {
    /// Seed the holder from resolved settings. Existence of the path is
    /// re-checked at render time, so a stale initial path degrades into a
    /// render-time error rather than being silently dropped here.
    pub fn new(path: Option<PathBuf>, bank: MidiBank) -> Self {
        Self { path, bank }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn bank(&self) -> MidiBank {
        self.bank
    }

    /// Apply a configuration call.
    ///
    /// Each supplied argument is validated on its own; a rejected value
    /// leaves the previous selection in place and is returned to the
    /// caller.
    pub fn update(&mut self, path: Option<&Path>, bank: Option<&str>) -> Vec<ConfigRejection> {
        let mut rejections = Vec::new();

        if let Some(path) = path {
            if path.is_file() {
                self.path = Some(path.to_path_buf());
            } else {
                warn!(
                    target = "application::audition::soundfont",
                    path = %path.display(),
                    "rejected sound font update; keeping previous selection"
                );
                rejections.push(ConfigRejection::SoundFontNotFile {
                    path: path.to_path_buf(),
                });
            }
        }

        if let Some(bank) = bank {
            match bank.parse::<MidiBank>() {
                Ok(parsed) => self.bank = parsed,
                Err(_) => {
                    warn!(
                        target = "application::audition::soundfont",
                        bank = %bank,
                        "rejected MIDI bank update; keeping previous selection"
                    );
                    rejections.push(ConfigRejection::UnknownBank {
                        value: bank.to_string(),
                    });
                }
            }
        }

        rejections
    }
}
