//! Command-line arguments

use std::path::PathBuf;

pub const USAGE: &str = "\
Usage: docx-annotate <input.docx> <output.docx> '<json>' [options]

Arguments:
  input.docx         Source Word document
  output.docx        Where to write the annotated document
  <json>             Annotations array as inline JSON string

Options:
  --json <file>      Read annotations from a JSON file instead of inline
  --author <name>    Author name (default: AI Assistant)
  --initials <i>     Author initials (default: AI)
  --config <file>    Engine configuration file (JSON)
  --partial          Write the document even when some annotations fail
  --base64           Also embed the annotated document in the output JSON
  -h, --help         Show this help

Annotation types:
  { \"type\": \"Comment\",  \"find\": \"...\", \"comment\": \"...\" }
  { \"type\": \"Replace\",  \"find\": \"...\", \"replacement\": \"...\" }
  { \"type\": \"Delete\",   \"find\": \"...\" }
  { \"type\": \"Insert\",   \"find\": \"...\", \"text\": \"...\", \"position\": \"after\"|\"before\" }

Instead of \"find\", a request may target \"paragraphIndex\" (and optionally
\"sentenceIndex\").";

/// Where the annotations come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationSource {
    Inline(String),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub input: PathBuf,
    pub output: PathBuf,
    pub annotations: AnnotationSource,
    pub author: Option<String>,
    pub initials: Option<String>,
    pub config: Option<PathBuf>,
    pub partial: bool,
    pub base64: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Annotate(Options),
}

/// Parse arguments (without the program name)
pub fn parse<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut positional = Vec::new();
    let mut json_file = None;
    let mut author = None;
    let mut initials = None;
    let mut config = None;
    let mut partial = false;
    let mut base64 = false;

    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .ok_or_else(|| format!("Missing value for {}", name))
        };
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--json" => json_file = Some(PathBuf::from(value("--json")?)),
            "--author" => author = Some(value("--author")?),
            "--initials" => initials = Some(value("--initials")?),
            "--config" => config = Some(PathBuf::from(value("--config")?)),
            "--partial" => partial = true,
            "--base64" => base64 = true,
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let (Some(input), Some(output)) = (positional.next(), positional.next()) else {
        return Err(usage_line());
    };
    let annotations = match (json_file, positional.next()) {
        (Some(path), _) => AnnotationSource::File(path),
        (None, Some(inline)) => AnnotationSource::Inline(inline),
        (None, None) => return Err(usage_line()),
    };

    Ok(Command::Annotate(Options {
        input: PathBuf::from(input),
        output: PathBuf::from(output),
        annotations,
        author,
        initials,
        config,
        partial,
        base64,
    }))
}

fn usage_line() -> String {
    "Usage: docx-annotate <input.docx> <output.docx> '<json>' [--json FILE] [--author NAME] [--initials XX] [--config FILE] [--partial] [--base64]".to_string()
}
