//! docx-annotate - apply review comments and tracked changes to a DOCX file
//!
//! Prints a JSON envelope on stdout; logs go to stderr (`RUST_LOG`).
//! Exit codes: 0 on success, 1 on usage or fatal errors, 2 when one or more
//! annotations could not be applied.

mod args;

use annotation_engine::{Annotator, AtomicityPolicy, Author, BatchResult, EngineConfig};
use anyhow::{bail, Context};
use args::{AnnotationSource, Command, Options};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde_json::{json, Value};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PARTIAL_FAILURE: &str = "One or more annotations could not be applied.";

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let options = match args::parse(std::env::args().skip(1)) {
        Ok(Command::Help) => {
            println!("{}", args::USAGE);
            return ExitCode::SUCCESS;
        }
        Ok(Command::Annotate(options)) => options,
        Err(message) => return fail(&message),
    };

    match run(&options) {
        Ok((envelope, code)) => {
            println!("{}", serde_json::to_string_pretty(&envelope).unwrap_or_default());
            ExitCode::from(code)
        }
        Err(e) => fail(&format!("{:#}", e)),
    }
}

fn fail(message: &str) -> ExitCode {
    println!("{}", json!({ "ok": false, "error": message }));
    ExitCode::from(1)
}

fn run(options: &Options) -> anyhow::Result<(Value, u8)> {
    let annotations = load_annotations(&options.annotations)?;

    let mut config = match &options.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    if options.partial {
        config.atomicity = AtomicityPolicy::Partial;
    }

    let defaults = Author::default();
    let author = Author::new(
        options.author.clone().unwrap_or(defaults.name),
        options.initials.clone().unwrap_or(defaults.initials),
    );

    let bytes = std::fs::read(&options.input)
        .with_context(|| format!("Cannot read input file {}", options.input.display()))?;
    tracing::info!("Annotating {} with {} requests", options.input.display(), annotations.len());

    let result = Annotator::new(config)
        .annotate_values(&bytes, &annotations, &author)
        .context("Cannot annotate document")?;

    let output = match &result.document {
        Some(document) => Some(write_output(&options.output, document)?),
        None => None,
    };
    Ok(envelope(&result, output.as_deref(), options.base64))
}

/// Parse the annotations array from inline JSON or a file
fn load_annotations(source: &AnnotationSource) -> anyhow::Result<Vec<Value>> {
    let text = match source {
        AnnotationSource::Inline(text) => text.clone(),
        AnnotationSource::File(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read JSON file {}", path.display()))?,
    };
    let value: Value =
        serde_json::from_str(&text).context("Invalid annotations JSON")?;
    match value {
        Value::Array(items) => Ok(items),
        _ => bail!("Invalid annotations JSON: Expected a JSON array of annotations"),
    }
}

/// Engine configuration from a JSON file; a missing or invalid file means defaults
fn load_config(path: &Path) -> anyhow::Result<EngineConfig> {
    if !path.exists() {
        tracing::warn!("Config file {} not found, using defaults", path.display());
        return Ok(EngineConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read config file {}", path.display()))?;
    Ok(EngineConfig::from_json_or_default(&content))
}

fn write_output(path: &Path, document: &[u8]) -> anyhow::Result<String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create directory {}", parent.display()))?;
    }
    std::fs::write(path, document)
        .with_context(|| format!("Cannot write output file {}", path.display()))?;
    let absolute = std::fs::canonicalize(path)
        .with_context(|| format!("Cannot resolve output path {}", path.display()))?;
    Ok(absolute.display().to_string())
}

/// The stdout envelope and the exit code for a finished batch
fn envelope(result: &BatchResult, output: Option<&str>, embed: bool) -> (Value, u8) {
    let mut envelope = if result.ok {
        json!({ "ok": true, "results": result.results })
    } else {
        let errors: Vec<_> = result.failures().collect();
        json!({ "ok": false, "error": PARTIAL_FAILURE, "errors": errors, "results": result.results })
    };
    envelope["batchId"] = json!(result.batch_id);
    if let Some(output) = output {
        envelope["output"] = json!(output);
    }
    if embed {
        if let Some(document) = &result.document {
            envelope["file"] = json!(BASE64_STANDARD.encode(document));
        }
    }
    (envelope, if result.ok { 0 } else { 2 })
}
