//! `svgscene`: load SVG files through the scene engine and report on them.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use scene::config::{ConfigError, EngineConfig};
use scene::engine::{Engine, LoadOptions};
use scene::geometry::{Anchor, Bounds, Point};
use scene::history::ImportMeta;
use scene::serialize::SerializeOptions;
use serde::Serialize;
use tracing::info;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: String, source: io::Error },
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("{0} is not usable SVG markup")]
    Rejected(String),
    #[error("no element with id `{0}`")]
    UnknownElement(String),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "svgscene", about = "Inspect and round-trip SVG scenes")]
struct Cli {
    /// Log filter level written to stderr.
    #[arg(long, env = "SVGSCENE_LOG", default_value = "warn")]
    log: tracing::Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the canvas, counts, and element tree as JSON.
    Inspect {
        /// SVG file, or `-` for stdin.
        file: PathBuf,
    },
    /// Parse and re-serialize a file.
    Export {
        /// SVG file, or `-` for stdin.
        file: PathBuf,
        /// Keep hidden elements, marked `data-visible="false"`.
        #[arg(long)]
        include_hidden: bool,
        /// Write here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print bounds and anchor points of top-level elements as JSON.
    Anchors {
        /// SVG file, or `-` for stdin.
        file: PathBuf,
        /// Only this element.
        #[arg(long)]
        id: Option<String>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnchorReport {
    id: String,
    kind: &'static str,
    bounds: Option<Bounds>,
    anchors: Vec<NamedAnchor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bound_lines: Vec<String>,
}

#[derive(Serialize)]
struct NamedAnchor {
    anchor: Anchor,
    #[serde(flatten)]
    point: Point,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_writer(io::stderr).with_max_level(cli.log).init();

    let config = EngineConfig::from_env()?;
    match cli.command {
        Command::Inspect { file } => run_inspect(config, &file),
        Command::Export { file, include_hidden, output } => {
            run_export(config, &file, SerializeOptions { include_hidden }, output.as_deref())
        }
        Command::Anchors { file, id } => run_anchors(config, &file, id.as_deref()),
    }
}

fn display_name(path: &Path) -> String {
    if path == Path::new("-") {
        "stdin".to_owned()
    } else {
        path.display().to_string()
    }
}

fn read_source(path: &Path) -> Result<String, CliError> {
    let name = display_name(path);
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map_err(|source| CliError::Read { path: name, source })?;
        return Ok(buf);
    }
    fs::read_to_string(path).map_err(|source| CliError::Read { path: name, source })
}

fn load(config: EngineConfig, path: &Path) -> Result<Engine, CliError> {
    let markup = read_source(path)?;
    let name = display_name(path);
    let mut engine = Engine::with_config(config);
    let opts = LoadOptions {
        save_history: false,
        skip_snapshot: true,
        record_meta: Some(ImportMeta::new(name.clone(), "svg")),
    };
    if !engine.load_svg_markup(&markup, &opts) {
        return Err(CliError::Rejected(name));
    }
    Ok(engine)
}

fn print_json(value: &impl Serialize) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

fn run_inspect(config: EngineConfig, path: &Path) -> Result<(), CliError> {
    let engine = load(config, path)?;
    let report = serde_json::json!({
        "document": engine.doc(),
        "import": engine.import_records().last(),
        "hasDefs": engine.defs().is_some(),
        "elements": engine.elements().as_slice(),
    });
    print_json(&report)
}

fn run_export(
    config: EngineConfig,
    path: &Path,
    opts: SerializeOptions,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let engine = load(config, path)?;
    let markup = engine.export_svg_markup_with(opts);
    match output {
        Some(out) => {
            fs::write(out, &markup).map_err(|source| CliError::Write { path: out.display().to_string(), source })?;
            info!(path = %out.display(), bytes = markup.len(), "exported");
        }
        None => println!("{markup}"),
    }
    Ok(())
}

fn run_anchors(config: EngineConfig, path: &Path, only: Option<&str>) -> Result<(), CliError> {
    let engine = load(config, path)?;
    let ids: Vec<String> = match only {
        Some(id) if engine.element(id).is_some() => vec![id.to_owned()],
        Some(id) => return Err(CliError::UnknownElement(id.to_owned())),
        None => engine.elements().as_slice().iter().map(|el| el.id.clone()).collect(),
    };

    let mut reports = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(el) = engine.element(&id) else {
            continue;
        };
        let anchors = Anchor::ALL
            .into_iter()
            .zip(engine.anchor_points(&id))
            .map(|(anchor, point)| NamedAnchor { anchor, point })
            .collect();
        reports.push(AnchorReport {
            kind: el.shape.tag(),
            bounds: engine.bounds(&id),
            anchors,
            bound_lines: engine.lines_bound_to(&id),
            id,
        });
    }
    print_json(&reports)
}
