use std::{fs, io, path::PathBuf, process};

use serde::Serialize;
use thiserror::Error;
use tracing::{Dispatch, Level, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

use squillo::{
    application::audition::{
        AudioClip, AuditionService, MidiFile, RenderError, RenderReport, SoundFontSettings,
        ToolSettings,
    },
    config::{self, DoctorArgs, RenderArgs, Settings},
    infra::{process::find_on_search_path, telemetry},
    presentation::views::{HtmlCollector, StdoutSink},
};

#[derive(Debug, Error)]
enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::LoadError),
    #[error(transparent)]
    Telemetry(#[from] telemetry::TelemetryError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to write HTML output `{path}`: {source}")]
    WriteHtml {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(error) => {
            report_application_error(&error);
            1
        }
    };
    if exit_code != 0 {
        process::exit(exit_code);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

fn run() -> Result<i32, AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    match cli_args.command {
        config::Command::Render(args) => run_render(settings, args),
        config::Command::Doctor(args) => run_doctor(settings, args),
    }
}

fn run_render(settings: Settings, args: RenderArgs) -> Result<i32, AppError> {
    let mut service = AuditionService::new(
        ToolSettings {
            synthesizer: settings.audition.synthesizer_path.clone(),
            transcoder: settings.audition.transcoder_path.clone(),
        },
        SoundFontSettings::new(settings.sound_font.path.clone(), settings.sound_font.bank),
    );

    // A sound font or bank given on the command line is a configuration
    // call with the usual semantics: rejected values keep the previous
    // selection (the holder logs each rejection).
    service.configure(args.sound_font.as_deref(), args.midi_bank.as_deref());

    let source = MidiFile::new(&args.midi);
    let report = match &args.html_out {
        Some(path) => {
            let mut sink = HtmlCollector::new();
            let report = service.render(&source, &mut sink)?;
            fs::write(path, sink.into_document()).map_err(|source| AppError::WriteHtml {
                path: path.clone(),
                source,
            })?;
            report
        }
        None => {
            let mut sink = StdoutSink;
            service.render(&source, &mut sink)?
        }
    };

    if args.json {
        print_report(&report)?;
    }

    Ok(if report.failures.is_empty() { 0 } else { 1 })
}

fn run_doctor(settings: Settings, args: DoctorArgs) -> Result<i32, AppError> {
    let mut healthy = true;

    for (label, tool) in [
        ("synthesizer", &settings.audition.synthesizer_path),
        ("transcoder", &settings.audition.transcoder_path),
    ] {
        match find_on_search_path(tool) {
            Some(resolved) => {
                println!("{label}: {} (found at {})", tool.display(), resolved.display());
            }
            None => {
                healthy = false;
                println!(
                    "{label}: {} (not found on the search path)",
                    tool.display()
                );
            }
        }
    }

    match args.sound_font.or(settings.sound_font.path) {
        Some(path) if path.is_file() => {
            println!(
                "sound font: {} (bank {})",
                path.display(),
                settings.sound_font.bank
            );
        }
        Some(path) => {
            healthy = false;
            println!("sound font: {} (missing)", path.display());
        }
        None => {
            healthy = false;
            println!("sound font: not configured");
        }
    }

    Ok(if healthy { 0 } else { 1 })
}

#[derive(Serialize)]
struct ReportSummary<'a> {
    clips: &'a [AudioClip],
    failures: Vec<FailureSummary>,
    missing_tools: Vec<String>,
}

#[derive(Serialize)]
struct FailureSummary {
    stage: &'static str,
    message: String,
}

fn print_report(report: &RenderReport) -> Result<(), AppError> {
    let summary = ReportSummary {
        clips: &report.clips,
        failures: report
            .failures
            .iter()
            .map(|failure| FailureSummary {
                stage: failure.stage.as_str(),
                message: failure.error.to_string(),
            })
            .collect(),
        missing_tools: report
            .missing_tools
            .iter()
            .map(|tool| tool.display().to_string())
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
