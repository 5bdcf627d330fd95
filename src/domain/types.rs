//! Shared domain enumerations for MIDI banks and rendered audio formats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Instrument-patch convention the synthesizer applies while rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MidiBank {
    #[default]
    Gs,
    Gm,
    Xg,
    Mma,
}

impl MidiBank {
    pub fn as_str(self) -> &'static str {
        match self {
            MidiBank::Gs => "gs",
            MidiBank::Gm => "gm",
            MidiBank::Xg => "xg",
            MidiBank::Mma => "mma",
        }
    }
}

impl fmt::Display for MidiBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown MIDI bank `{value}`; expected one of gs, gm, xg, mma")]
pub struct MidiBankParseError {
    value: String,
}

impl FromStr for MidiBank {
    type Err = MidiBankParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "gs" => Ok(MidiBank::Gs),
            "gm" => Ok(MidiBank::Gm),
            "xg" => Ok(MidiBank::Xg),
            "mma" => Ok(MidiBank::Mma),
            other => Err(MidiBankParseError {
                value: other.to_string(),
            }),
        }
    }
}

/// Audio container produced by a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    OggVorbis,
    Mpeg3,
}

impl AudioFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            AudioFormat::OggVorbis => "audio/ogg",
            AudioFormat::Mpeg3 => "audio/mpeg",
        }
    }

    /// File name the stage writes inside the job's scratch directory.
    pub fn scratch_file_name(self) -> &'static str {
        match self {
            AudioFormat::OggVorbis => "out.ogg",
            AudioFormat::Mpeg3 => "out.mp3",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_round_trips_through_str() {
        for bank in [MidiBank::Gs, MidiBank::Gm, MidiBank::Xg, MidiBank::Mma] {
            assert_eq!(bank.as_str().parse::<MidiBank>(), Ok(bank));
        }
    }

    #[test]
    fn unknown_bank_is_rejected() {
        let err = "gss".parse::<MidiBank>().expect_err("invalid bank rejected");
        assert!(err.to_string().contains("gss"));
    }

    #[test]
    fn formats_carry_distinct_mime_types() {
        assert_eq!(AudioFormat::OggVorbis.mime_type(), "audio/ogg");
        assert_eq!(AudioFormat::Mpeg3.mime_type(), "audio/mpeg");
    }
}
