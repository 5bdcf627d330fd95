#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use squillo::application::audition::{
    AuditionService, MidiBytes, RenderError, RenderStage, SoundFontSettings, StageError,
    ToolSettings,
};
use squillo::domain::types::AudioFormat;
use squillo::infra::process::ToolError;
use squillo::presentation::views::HtmlCollector;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write script");
    let mut perms = fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("set perms");
    path
}

fn fake_synth(dir: &Path, args_log: &Path) -> PathBuf {
    let body = format!(
        r#"#!/bin/sh
set -eu
echo "$@" > "{log}"
out=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-F" ]; then out="$arg"; fi
  prev="$arg"
done
printf 'ogg-payload' > "$out"
"#,
        log = args_log.display()
    );
    write_script(dir, "fake-fluidsynth", &body)
}

fn fake_transcoder(dir: &Path, args_log: &Path) -> PathBuf {
    let body = format!(
        r#"#!/bin/sh
set -eu
echo "$@" > "{log}"
out=""
for arg in "$@"; do out="$arg"; done
printf 'mp3-payload' > "$out"
"#,
        log = args_log.display()
    );
    write_script(dir, "fake-ffmpeg", &body)
}

fn failing_transcoder(dir: &Path, args_log: &Path) -> PathBuf {
    let body = format!(
        r#"#!/bin/sh
echo "$@" > "{log}"
exit 64
"#,
        log = args_log.display()
    );
    write_script(dir, "fake-ffmpeg", &body)
}

fn sound_font(dir: &Path) -> PathBuf {
    let path = dir.join("timbres.sf2");
    fs::write(&path, "sf2").expect("write sound font");
    path
}

#[test]
fn unconfigured_sound_font_spawns_nothing_and_emits_nothing() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let synth_log = dir.path().join("synth-args.log");
    let transcode_log = dir.path().join("transcode-args.log");

    let service = AuditionService::new(
        ToolSettings {
            synthesizer: fake_synth(dir.path(), &synth_log),
            transcoder: fake_transcoder(dir.path(), &transcode_log),
        },
        SoundFontSettings::default(),
    );

    let mut sink = HtmlCollector::new();
    let err = service
        .render(&MidiBytes::new(b"MThd".to_vec()), &mut sink)
        .expect_err("render aborts");

    assert!(matches!(err, RenderError::SoundFontMissing));
    assert!(sink.fragments().is_empty());
    assert!(!synth_log.exists(), "synthesizer was spawned");
    assert!(!transcode_log.exists(), "transcoder was spawned");
}

#[test]
fn vanished_sound_font_aborts_before_export() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let synth_log = dir.path().join("synth-args.log");
    let transcode_log = dir.path().join("transcode-args.log");

    let mut service = AuditionService::new(
        ToolSettings {
            synthesizer: fake_synth(dir.path(), &synth_log),
            transcoder: fake_transcoder(dir.path(), &transcode_log),
        },
        SoundFontSettings::default(),
    );
    let font = sound_font(dir.path());
    assert!(service.configure(Some(&font), None).is_empty());
    fs::remove_file(&font).expect("remove sound font");

    let mut sink = HtmlCollector::new();
    let err = service
        .render(&MidiBytes::new(b"MThd".to_vec()), &mut sink)
        .expect_err("render aborts");

    assert!(matches!(err, RenderError::SoundFontUnavailable { .. }));
    assert!(!synth_log.exists());
}

#[test]
fn absent_tools_are_advisory_and_surface_as_stage_failures() {
    let dir = tempfile::TempDir::new().expect("temp dir");

    let mut service = AuditionService::new(
        ToolSettings {
            synthesizer: dir.path().join("missing-synth"),
            transcoder: dir.path().join("missing-transcoder"),
        },
        SoundFontSettings::default(),
    );
    let font = sound_font(dir.path());
    assert!(service.configure(Some(&font), None).is_empty());

    let mut sink = HtmlCollector::new();
    let report = service
        .render(&MidiBytes::new(b"MThd".to_vec()), &mut sink)
        .expect("render completes with a report");

    // Preflight flagged both tools but did not abort the call.
    assert_eq!(report.missing_tools.len(), 2);
    assert!(report.clips.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stage, RenderStage::Synthesize);
    assert!(matches!(
        report.failures[0].error,
        StageError::Invoke(ToolError::NotFound { .. })
    ));
}

#[test]
fn transcoder_failure_keeps_the_ogg_clip() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let synth_log = dir.path().join("synth-args.log");
    let transcode_log = dir.path().join("transcode-args.log");

    let mut service = AuditionService::new(
        ToolSettings {
            synthesizer: fake_synth(dir.path(), &synth_log),
            transcoder: failing_transcoder(dir.path(), &transcode_log),
        },
        SoundFontSettings::default(),
    );
    let font = sound_font(dir.path());
    assert!(service.configure(Some(&font), None).is_empty());

    let mut sink = HtmlCollector::new();
    let report = service
        .render(&MidiBytes::new(b"MThd".to_vec()), &mut sink)
        .expect("render");

    assert_eq!(report.clips.len(), 1);
    assert_eq!(report.clips[0].format, AudioFormat::OggVorbis);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stage, RenderStage::Transcode);
    match &report.failures[0].error {
        StageError::NonZeroExit { status, .. } => assert_eq!(*status, 64),
        other => panic!("unexpected stage error: {other:?}"),
    }

    // The one successful stage was still emitted.
    assert_eq!(sink.fragments().len(), 1);
    assert!(sink.fragments()[0].contains("data:audio/ogg;base64,"));
    assert!(!report.fully_rendered());
}
