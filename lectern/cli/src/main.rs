use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lectern_evidence::locate;
use lectern_knowledge::{
    LectureRuntime, LectureTelemetry, LecternConfig, ProcessResponse, StaticStructuringClient,
    UploadedDocument, PDF_CONTENT_TYPE, STRUCTURING_INSTRUCTIONS,
};
use lectern_logging::LogLevel;
use serde_json::{json, Value};
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(
    name = "lectern",
    version,
    about = "Turns lecture PDFs into evidence-backed knowledge trees"
)]
struct Cli {
    /// TOML configuration; defaults apply when absent.
    #[arg(long, global = true, default_value = "lectern.toml")]
    config: PathBuf,
    /// JSON-lines log file, overriding `[telemetry] log_path`.
    #[arg(long, global = true)]
    log: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Attributes evidence for extracted text and a saved model reply.
    Annotate {
        /// Extracted lecture text.
        #[arg(long)]
        text: PathBuf,
        /// Raw model reply (JSON outline).
        #[arg(long)]
        outline: PathBuf,
    },
    /// Runs the full pipeline on a PDF with a saved model reply.
    Process {
        /// Lecture PDF.
        #[arg(long)]
        pdf: PathBuf,
        /// Raw model reply (JSON outline).
        #[arg(long)]
        outline: PathBuf,
        /// Also print the course library after filing the lecture.
        #[arg(long)]
        library: bool,
    },
    /// Prints the quote anchoring one term, if any.
    Locate {
        /// Extracted lecture text.
        #[arg(long)]
        text: PathBuf,
        /// Term to look up.
        term: String,
    },
    /// Prints the structuring instructions sent to the model.
    Prompt,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config, cli.log.clone())?;
    let telemetry = build_telemetry(&config)?;
    if let Some(tel) = &telemetry {
        let _ = tel.log(
            LogLevel::Debug,
            "cli.command",
            json!({ "command": format!("{:?}", cli.command) }),
        );
    }

    match cli.command {
        Commands::Annotate { text, outline } => {
            let text = read_text(&text)?;
            let runtime = runtime_for(config, &outline, telemetry)?;
            let lecture = Runtime::new()?.block_on(runtime.process_text(&text))?;
            eprintln!(
                "{} concepts: {} anchored ({} by token), {} from the model",
                lecture.report.concepts,
                lecture.report.anchored,
                lecture.report.token_fallbacks,
                lecture.report.ai_authored
            );
            print_json(&ProcessResponse::success(lecture.outline))
        }
        Commands::Process {
            pdf,
            outline,
            library,
        } => {
            let upload = upload_from_path(&pdf)?;
            let runtime = runtime_for(config, &outline, telemetry)?;
            let outputs = Runtime::new()?.block_on(process_outputs(&runtime, &upload, library))?;
            for document in &outputs {
                print_json(document)?;
            }
            Ok(())
        }
        Commands::Locate { text, term } => {
            let text = read_text(&text)?;
            match locate(&text, &term) {
                Some(anchor) => print_json(&anchor),
                None => {
                    println!("no anchor for `{term}`");
                    Ok(())
                }
            }
        }
        Commands::Prompt => {
            println!("{STRUCTURING_INSTRUCTIONS}");
            Ok(())
        }
    }
}

/// Reads `path` when it exists, otherwise uses defaults. `log` overrides the
/// configured log path.
fn load_config(path: &Path, log: Option<PathBuf>) -> Result<LecternConfig> {
    let mut config = if path.exists() {
        LecternConfig::load(path)?
    } else {
        LecternConfig::default()
    };
    if log.is_some() {
        config.telemetry.log_path = log;
    }
    Ok(config)
}

fn build_telemetry(config: &LecternConfig) -> Result<Option<LectureTelemetry>> {
    if config.telemetry.log_path.is_none() {
        return Ok(None);
    }
    let telemetry = LectureTelemetry::builder("lectern")
        .settings(&config.telemetry)?
        .build()?;
    Ok(Some(telemetry))
}

fn runtime_for(
    config: LecternConfig,
    outline: &Path,
    telemetry: Option<LectureTelemetry>,
) -> Result<LectureRuntime> {
    let reply = read_text(outline)?;
    let runtime = LectureRuntime::new(config, Arc::new(StaticStructuringClient::new(reply)));
    Ok(match telemetry {
        Some(tel) => runtime.with_telemetry(tel),
        None => runtime,
    })
}

/// Builds an upload whose content type follows the file extension, so
/// non-PDF files are rejected the same way the upload surface rejects them.
fn upload_from_path(path: &Path) -> Result<UploadedDocument> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(UploadedDocument::new(file_name, content_type_for(path), bytes))
}

/// JSON documents printed by `process`: the response envelope, followed by
/// the course library when `library` is set and processing succeeded.
async fn process_outputs(
    runtime: &LectureRuntime,
    upload: &UploadedDocument,
    library: bool,
) -> Result<Vec<Value>> {
    if !library {
        return Ok(vec![serde_json::to_value(runtime.respond(upload).await)?]);
    }
    match runtime.process(upload).await {
        Ok(lecture) => {
            runtime.curate(&lecture);
            Ok(vec![
                serde_json::to_value(ProcessResponse::success(lecture.outline))?,
                serde_json::to_value(runtime.library().courses())?,
            ])
        }
        Err(err) => Ok(vec![serde_json::to_value(ProcessResponse::from_error(&err))?]),
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => PDF_CONTENT_TYPE,
        Some(ext) if ext.eq_ignore_ascii_case("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_config_means_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml"), None).unwrap();
        assert_eq!(config, LecternConfig::default());
        assert!(build_telemetry(&config).unwrap().is_none());
    }

    #[test]
    fn log_flag_overrides_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lectern.toml");
        fs::write(
            &path,
            "[telemetry]\nlog_path = \"from-config.log\"\nmin_level = \"debug\"\n",
        )
        .unwrap();

        let config = load_config(&path, None).unwrap();
        assert_eq!(
            config.telemetry.log_path.as_deref(),
            Some(dir.path().join("from-config.log").as_path())
        );

        let override_path = dir.path().join("cli.log");
        let config = load_config(&path, Some(override_path.clone())).unwrap();
        assert_eq!(config.telemetry.log_path, Some(override_path.clone()));
        let telemetry = build_telemetry(&config).unwrap().unwrap();
        telemetry.log(LogLevel::Debug, "cli.test", json!({})).unwrap();
        assert!(fs::read_to_string(override_path).unwrap().contains("cli.test"));
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for(Path::new("lecture.PDF")), PDF_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("notes.txt")), "text/plain");
        assert_eq!(content_type_for(Path::new("slides")), "application/octet-stream");
    }

    #[test]
    fn rejected_uploads_keep_their_message_with_or_without_library() {
        let dir = tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        fs::write(&notes, "Forwarding avoids stalls.").unwrap();
        let reply = dir.path().join("reply.json");
        fs::write(&reply, "{}").unwrap();

        let runtime = runtime_for(LecternConfig::default(), &reply, None).unwrap();
        let upload = upload_from_path(&notes).unwrap();
        let tokio = Runtime::new().unwrap();
        for library in [false, true] {
            let outputs = tokio
                .block_on(process_outputs(&runtime, &upload, library))
                .unwrap();
            assert_eq!(
                outputs,
                vec![json!({ "success": false, "message": "Only PDF files are allowed" })]
            );
        }
        assert!(runtime.library().is_empty());
    }

    #[test]
    fn uploads_keep_the_file_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lecture3.pdf");
        fs::write(&path, b"%PDF-1.4").unwrap();
        let upload = upload_from_path(&path).unwrap();
        assert_eq!(upload.file_name, "lecture3.pdf");
        assert_eq!(upload.content_type, PDF_CONTENT_TYPE);
        assert_eq!(upload.bytes, b"%PDF-1.4");
    }
}
