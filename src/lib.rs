//! squillo: a sequential render pipeline that turns a MIDI-exportable
//! source into embeddable HTML `<audio>` elements by shelling out to a
//! software synthesizer and an audio transcoder.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
