use crate::input::load_index;
use chainscope_api::{CallTree, EntryRef};
use chainscope_core::config::load_document;
use chainscope_core::{AnalysisConfig, Analyzer, ConfigFile};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub struct AnalyzeArgs {
    pub input: PathBuf,
    pub entries: Vec<String>,
    pub config: Option<PathBuf>,
    pub max_depth: Option<usize>,
    pub no_preset: bool,
    pub all_endpoints: bool,
    pub output: Option<PathBuf>,
}

pub fn run(args: AnalyzeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut entries = args
        .entries
        .iter()
        .map(|e| EntryRef::parse(e))
        .collect::<Result<Vec<_>, _>>()?;

    let config = build_config(args.config.as_deref(), args.max_depth, args.no_preset)?;
    let index = load_index(&args.input)?;

    if args.all_endpoints {
        for endpoint in chainscope_java::discover(&index) {
            if !entries.contains(&endpoint.handler) {
                entries.push(endpoint.handler);
            }
        }
    }
    if entries.is_empty() {
        return Err("no entry methods: pass --entry or --all-endpoints".into());
    }

    let analyzer = Analyzer::new(index, Arc::new(config));
    let mut trees: Vec<CallTree> = Vec::with_capacity(entries.len());
    for (entry, result) in entries.iter().zip(analyzer.analyze_many(&entries)) {
        match result {
            Ok(tree) => trees.push(tree),
            Err(e) => warn!(entry = %entry, "skipped: {}", e),
        }
    }
    if trees.is_empty() {
        return Err("none of the entry methods could be analyzed".into());
    }
    info!(trees = trees.len(), "analysis complete");

    let json = match trees.as_slice() {
        [single] => serde_json::to_string_pretty(single)?,
        many => serde_json::to_string_pretty(many)?,
    };
    match args.output {
        Some(path) => std::fs::write(&path, json)?,
        None => println!("{}", json),
    }
    Ok(())
}

/// Preset, then the user document, then command-line overrides.
fn build_config(
    path: Option<&Path>,
    max_depth: Option<usize>,
    no_preset: bool,
) -> chainscope_core::Result<AnalysisConfig> {
    let mut doc = if no_preset {
        ConfigFile::default()
    } else {
        chainscope_java::preset()
    };
    let mut base_dir = Path::new(".");
    if let Some(path) = path {
        doc = doc.merge(load_document(path)?);
        if let Some(parent) = path.parent() {
            base_dir = parent;
        }
    }
    if max_depth.is_some() {
        doc.max_depth = max_depth;
    }
    AnalysisConfig::from_document(doc, base_dir)
}
