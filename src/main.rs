//! # vecta
//!
//! Command line front end for the vecta document engine.
//!
//! ## Commands
//! - `inspect`: Print the node tree and load diagnostics
//! - `convert`: Load any supported format and write the generic JSON format
//! - `sample`: Evaluate one property of a named node at a frame

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use vecta_core::io::glaxnimate::{self, ExportOptions};
use vecta_core::{io, Document, FormatKind, NodeId};
use vecta_data::DiagnosticLog;

#[derive(Parser)]
#[command(name = "vecta")]
#[command(about = "Inspect, convert and sample vector animation documents")]
#[command(version)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Input format ("glaxnimate" or "rive"), detected when omitted
    #[arg(long, global = true)]
    format: Option<FormatKind>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the node tree of a document
    Inspect {
        file: PathBuf,

        /// Print a JSON report instead of an indented tree
        #[arg(long)]
        json: bool,
    },

    /// Convert a document to the generic JSON format
    Convert {
        input: PathBuf,
        output: PathBuf,

        /// Indent the output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the value of a property at a given frame
    Sample {
        file: PathBuf,

        /// Name of the node to sample
        #[arg(short, long)]
        node: String,

        /// Property name, e.g. "position" or "opacity"
        #[arg(short, long)]
        property: String,

        #[arg(short, long, default_value_t = 0.0)]
        frame: f64,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("no node named '{0}'")]
    NodeNotFound(String),
    #[error("'{node}' has no property '{property}'")]
    PropertyNotFound { node: String, property: String },
}

#[derive(Serialize)]
struct NodeSummary {
    id: NodeId,
    #[serde(rename = "type")]
    type_name: &'static str,
    name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<NodeSummary>,
}

#[derive(Serialize)]
struct InspectReport {
    format: Option<String>,
    nodes: usize,
    main: NodeSummary,
    precompositions: Vec<NodeSummary>,
    diagnostics: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json)?;

    match cli.command {
        Commands::Inspect { file, json } => cmd_inspect(&file, cli.format, json),
        Commands::Convert {
            input,
            output,
            pretty,
        } => cmd_convert(&input, &output, cli.format, pretty),
        Commands::Sample {
            file,
            node,
            property,
            frame,
        } => cmd_sample(&file, cli.format, &node, &property, frame),
    }
}

fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level '{}'", level))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn load(path: &Path, format: Option<FormatKind>) -> Result<(Document, DiagnosticLog)> {
    let mut log = DiagnosticLog::new();
    let doc = io::load_file(path, format, &mut log)
        .with_context(|| format!("failed to load {}", path.display()))?;
    tracing::info!(path = %path.display(), nodes = doc.len(), diagnostics = log.entries().len(), "loaded");
    Ok((doc, log))
}

fn detected_format(path: &Path, format: Option<FormatKind>) -> Option<FormatKind> {
    format.or_else(|| {
        std::fs::read(path)
            .ok()
            .and_then(|data| FormatKind::detect(&data))
    })
}

fn summarize(doc: &Document, id: NodeId) -> NodeSummary {
    NodeSummary {
        id,
        type_name: doc.object(id).map_or("?", |o| o.type_name()),
        name: doc.object_name(id),
        children: doc.children(id).map(|child| summarize(doc, child)).collect(),
    }
}

fn precompositions(doc: &Document) -> Vec<NodeId> {
    doc.sub_object(doc.assets(), "precompositions")
        .map(|list| doc.items(list, "values").to_vec())
        .unwrap_or_default()
}

fn print_tree(node: &NodeSummary, depth: usize) {
    println!("{:indent$}{} \"{}\"", "", node.type_name, node.name, indent = depth * 2);
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}

fn cmd_inspect(file: &Path, format: Option<FormatKind>, json: bool) -> Result<()> {
    let (doc, log) = load(file, format)?;
    let report = InspectReport {
        format: detected_format(file, format).map(|f| f.to_string()),
        nodes: doc.len(),
        main: summarize(&doc, doc.main()),
        precompositions: precompositions(&doc)
            .into_iter()
            .map(|id| summarize(&doc, id))
            .collect(),
        diagnostics: log
            .entries()
            .iter()
            .map(|d| format!("{}: {}", d.severity, d.message))
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_tree(&report.main, 0);
    for comp in &report.precompositions {
        println!();
        print_tree(comp, 0);
    }
    if !report.diagnostics.is_empty() {
        println!();
        for diagnostic in &report.diagnostics {
            println!("{}", diagnostic);
        }
    }
    Ok(())
}

fn cmd_convert(input: &Path, output: &Path, format: Option<FormatKind>, pretty: bool) -> Result<()> {
    let (doc, log) = load(input, format)?;
    let options = ExportOptions {
        pretty,
        ..ExportOptions::default()
    };
    glaxnimate::save_document(&doc, output, &options)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "Converted {} to {} ({} warnings)",
        input.display(),
        output.display(),
        log.entries().len()
    );
    Ok(())
}

fn cmd_sample(file: &Path, format: Option<FormatKind>, node: &str, property: &str, frame: f64) -> Result<()> {
    let (doc, _) = load(file, format)?;
    let id = std::iter::once(doc.main())
        .chain(precompositions(&doc))
        .find_map(|root| doc.find_by_name(root, node))
        .ok_or_else(|| CliError::NodeNotFound(node.to_owned()))?;
    let value = doc
        .value_at(id, property, frame)
        .ok_or_else(|| CliError::PropertyNotFound {
            node: node.to_owned(),
            property: property.to_owned(),
        })?;
    println!("{}", value);
    Ok(())
}
