//! Chunk command implementation for the footprint CLI.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use footprint_data::{
    ChunkReport, CorpusSource, DEFAULT_OBJECTS_PER_FILE, DirectorySink, FileSource, ScanConfig,
    chunk_by_kind,
};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_INPUT, ARG_OUTPUT_DIR, ARG_REPORT, CliError, ENV_CHUNK_INPUT, require_distinct,
    require_existing, write_report,
};

const COMPRESSION_SUFFIXES: [&str; 2] = [".bz2", ".gz"];

/// CLI arguments for the `chunk` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Split a corpus into numbered files holding one object kind \
                 each (nodes, ways, relations, changesets). Tags outside any \
                 object are collected in a single `other` file.",
    about = "Split an OSM XML corpus by object kind"
)]
#[ortho_config(prefix = "FOOTPRINT")]
pub(crate) struct ChunkArgs {
    /// Path to the corpus (`.osm`, `.osm.bz2` or `.osm.gz`).
    #[arg(long = ARG_INPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Directory receiving the chunk files; the current directory when omitted.
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Objects written to each file before rotating.
    #[arg(long, value_name = "count")]
    #[serde(default)]
    pub(crate) objects_per_file: Option<u64>,
    /// Log progress and a summary at info level.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    #[serde(default)]
    pub(crate) stats: Option<bool>,
    /// Write a JSON summary of the run to this path.
    #[arg(long = ARG_REPORT, value_name = "path")]
    #[serde(default)]
    pub(crate) report: Option<Utf8PathBuf>,
}

impl ChunkArgs {
    pub(crate) fn into_config(self) -> Result<ChunkConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ChunkConfig::try_from(merged)
    }
}

/// Resolved `chunk` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChunkConfig {
    pub(crate) input: Utf8PathBuf,
    pub(crate) output_dir: Utf8PathBuf,
    pub(crate) stem: String,
    pub(crate) objects_per_file: u64,
    pub(crate) stats: bool,
    pub(crate) report: Option<Utf8PathBuf>,
}

impl TryFrom<ChunkArgs> for ChunkConfig {
    type Error = CliError;

    fn try_from(args: ChunkArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_CHUNK_INPUT,
        })?;
        Ok(Self {
            stem: chunk_stem(&input),
            input,
            output_dir: args.output_dir.unwrap_or_else(|| Utf8PathBuf::from(".")),
            objects_per_file: args.objects_per_file.unwrap_or(DEFAULT_OBJECTS_PER_FILE),
            stats: args.stats.unwrap_or(false),
            report: args.report,
        })
    }
}

/// Lower-cased file name of `input` without compression or `.osm` suffixes.
pub(crate) fn chunk_stem(input: &Utf8Path) -> String {
    let mut stem = input.file_name().unwrap_or("corpus").to_lowercase();
    for suffix in COMPRESSION_SUFFIXES {
        if let Some(stripped) = stem.strip_suffix(suffix) {
            stem = stripped.to_owned();
            break;
        }
    }
    if let Some(stripped) = stem.strip_suffix(".osm") {
        stem = stripped.to_owned();
    }
    stem
}

pub(crate) fn resolve_chunk_config(args: ChunkArgs) -> Result<ChunkConfig, CliError> {
    let config = args.into_config()?;
    require_existing(&config.input, ARG_INPUT)?;
    require_distinct(&config.input, config.report.as_deref(), ARG_REPORT)?;
    Ok(config)
}

/// Split the configured corpus into the output directory.
pub(crate) fn execute_chunk(config: &ChunkConfig) -> Result<ChunkReport, CliError> {
    let mut sink = DirectorySink::new(&config.output_dir).map_err(|source| {
        CliError::CreateOutput {
            path: config.output_dir.clone(),
            source,
        }
    })?;
    let source = FileSource::new(config.input.clone());
    let mut scanner = ScanConfig::default().scanner(source.open()?);
    let report = chunk_by_kind(
        &mut scanner,
        &config.stem,
        config.objects_per_file,
        &mut sink,
        config.stats,
    )?;
    info!(
        "wrote {} objects from {} into {} files under {}",
        report.objects(),
        config.input,
        report.files.len(),
        config.output_dir,
    );
    if let Some(path) = &config.report {
        write_report(path, &report)?;
    }
    Ok(report)
}
