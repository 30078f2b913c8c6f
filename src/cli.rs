//! CLI: check JSON documents against a schema descriptor, or describe it.
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use schemata::descriptor::{Descriptor, from_slice_with_path};
use schemata::{ParseOptions, ParseResult, Parser as SchemaParser, Preferences, SchemaNode, Value};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate JSON documents against a declarative schema
#[derive(Parser, Debug)]
#[command(name = "schemata", version)]
pub struct CommandLineInterface {
    /// more logging on stderr (-v debug, -vv trace); RUST_LOG wins when set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// validate every input document; exits 1 when any is rejected
    Check(CheckArgs),
    /// print the schema's type hint and manifest
    Describe(DescribeArgs),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// schema descriptor (.json)
    #[arg(long, short)]
    schema: PathBuf,

    #[command(flatten)]
    input_settings: InputSettings,

    /// parse preferences (.json, camelCase keys)
    #[arg(long)]
    prefs: Option<PathBuf>,

    /// report only the first issue per document
    #[arg(long)]
    abort_early: bool,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Args, Debug)]
struct DescribeArgs {
    /// schema descriptor (.json)
    #[arg(long, short)]
    schema: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// One input document.
struct Document {
    source: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load(&self) -> anyhow::Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            if self.ndjson {
                for (index, line) in source.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
                    let origin = format!("{source_path_str}:{}", index + 1);
                    documents.push(self.document(origin, line)?);
                }
            } else {
                documents.push(self.document(source_path_str, &source)?);
            }
        }
        tracing::debug!(count = documents.len(), "loaded input documents");
        Ok(documents)
    }

    fn document(&self, source: String, text: &str) -> anyhow::Result<Document> {
        let json = serde_json::from_str::<serde_json::Value>(text)
            .with_context(|| format!("failed to parse JSON source ({source})"))?;
        let json = match self.json_pointer.as_deref() {
            None => json,
            Some(pointer) => match json.pointer(pointer) {
                Some(selected) => selected.clone(),
                None => bail!("JSON pointer {pointer} selects nothing in {source}"),
            },
        };
        Ok(Document { source, value: Value::from(json) })
    }
}

fn load_schema(path: &Path) -> anyhow::Result<SchemaNode> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read schema ({})", path.display()))?;
    let descriptor: Descriptor = from_slice_with_path(&bytes)
        .with_context(|| format!("invalid schema descriptor ({})", path.display()))?;
    let node = descriptor
        .compile()
        .with_context(|| format!("invalid schema descriptor ({})", path.display()))?;
    Ok(node)
}

fn load_preferences(path: Option<&Path>, abort_early: bool) -> anyhow::Result<Preferences> {
    let mut prefs = match path {
        None => Preferences::default(),
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read preferences ({})", path.display()))?;
            from_slice_with_path(&bytes)
                .with_context(|| format!("invalid preferences ({})", path.display()))?
        }
    };
    prefs.abort_early |= abort_early;
    Ok(prefs)
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> u8 {
        self.verbose
    }

    /// Returns whether every checked document was accepted.
    pub fn run(&self) -> anyhow::Result<bool> {
        match &self.cmd {
            Command::Check(target) => {
                let schema = load_schema(&target.schema)?;
                let prefs = load_preferences(target.prefs.as_deref(), target.abort_early)?;
                let documents = target.input_settings.load()?;
                let parser = SchemaParser::with_preferences(&schema, &prefs);
                let outcomes: Vec<(&Document, ParseResult)> = documents
                    .par_iter()
                    .map(|doc| (doc, parser.run(&doc.value, &ParseOptions::default())))
                    .collect();
                let mut all_ok = true;
                for (doc, outcome) in &outcomes {
                    all_ok &= outcome.is_ok();
                    match target.format {
                        Format::Text => print_text(doc, outcome),
                        Format::Json => print_json(doc, outcome)?,
                    }
                }
                tracing::debug!(documents = outcomes.len(), all_ok, "check finished");
                Ok(all_ok)
            }
            Command::Describe(target) => {
                let schema = load_schema(&target.schema)?;
                println!("{}", schema.hint());
                println!("{}", serde_json::to_string_pretty(&schema.manifest().to_json())?);
                Ok(true)
            }
        }
    }
}

fn print_text(doc: &Document, outcome: &ParseResult) {
    match outcome {
        ParseResult::Accepted(_) => println!("{} {}", "✓".green(), doc.source),
        ParseResult::Rejected(error) => {
            println!("{} {}", "✗".red(), doc.source.bold());
            for issue in &error.issues {
                let path = issue.path_string();
                let at = if path.is_empty() { "(root)".to_string() } else { path };
                println!("    {} {} {}", at.yellow(), issue.message, format!("[{}]", issue.code).dimmed());
            }
        }
    }
}

fn print_json(doc: &Document, outcome: &ParseResult) -> anyhow::Result<()> {
    let line = match outcome {
        ParseResult::Accepted(value) => serde_json::json!({
            "source": doc.source,
            "ok": true,
            "value": value.to_json(),
        }),
        ParseResult::Rejected(error) => serde_json::json!({
            "source": doc.source,
            "ok": false,
            "issues": serde_json::to_value(&error.issues)?,
        }),
    };
    println!("{line}");
    Ok(())
}

/// Install the stderr subscriber. `RUST_LOG` overrides the `-v` count.
pub fn init_logging(verbose: u8) -> anyhow::Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("schemata={level}")));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing: {e}"))
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["a.json", "b/c.json"]).ok();
        assert_eq!(paths, Some(vec![PathBuf::from("a.json"), PathBuf::from("b/c.json")]));
    }

    #[test]
    fn empty_globs_are_errors() {
        let err = resolve_file_path_patterns(["/definitely/not/here/*.json"]).err();
        assert!(err.is_some_and(|e| e.to_string().contains("matched no files")));
    }

    #[test]
    fn json_pointer_selects_subdocuments() {
        let settings = InputSettings { ndjson: false, json_pointer: Some("/data/0".into()), input: Vec::new() };
        let doc = settings.document("x".into(), r#"{"data": [{"a": 1}]}"#).ok();
        assert_eq!(doc.map(|d| d.value), Some(schemata::value!({"a": 1})));
        assert!(settings.document("x".into(), r#"{"data": []}"#).is_err());
    }

    #[test]
    fn abort_early_flag_overrides_preferences() {
        let prefs = load_preferences(None, true).ok();
        assert_eq!(prefs.map(|p| p.abort_early), Some(true));
    }
}
