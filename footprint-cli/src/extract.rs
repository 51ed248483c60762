//! Extract command implementation for the footprint CLI.

use std::io::{self, BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8;
use chrono::NaiveDate;
use clap::Parser;
use footprint_core::{BoundingBox, ExtractOptions, Footprint, RelationMode, TimeWindow};
use footprint_data::{
    DEFAULT_CHUNK_SIZE, ExtractHeader, ExtractionReport, FileSource, ScanConfig,
    extract_footprint_with,
};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_INPUT, ARG_OUTPUT, ARG_REPORT, CliError, ENV_EXTRACT_INPUT, require_distinct,
    require_existing, write_report,
};

/// CLI arguments for the `extract` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Copy every node inside a bounding box and date window, the \
                 ways that reference them, and optionally relations and \
                 changesets. The corpus is read twice; bzip2 and gzip input \
                 is decompressed transparently.",
    about = "Extract a footprint from an OSM XML corpus"
)]
#[ortho_config(prefix = "FOOTPRINT")]
pub(crate) struct ExtractArgs {
    /// Path to the corpus (`.osm`, `.osm.bz2` or `.osm.gz`).
    #[arg(long = ARG_INPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Where to write the extract; standard output when omitted.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Western edge in degrees of longitude.
    #[arg(long, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) left: Option<f64>,
    /// Eastern edge in degrees of longitude.
    #[arg(long, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) right: Option<f64>,
    /// Northern edge in degrees of latitude.
    #[arg(long, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) top: Option<f64>,
    /// Southern edge in degrees of latitude.
    #[arg(long, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) bottom: Option<f64>,
    /// First day of the window (YYYY-MM-DD).
    #[arg(long, value_name = "date")]
    #[serde(default)]
    pub(crate) start: Option<NaiveDate>,
    /// Last day of the window (YYYY-MM-DD).
    #[arg(long, value_name = "date")]
    #[serde(default)]
    pub(crate) end: Option<NaiveDate>,
    /// Keep every version of each node instead of the newest.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    #[serde(default)]
    pub(crate) history: Option<bool>,
    /// Copy changesets referenced by retained objects.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    #[serde(default)]
    pub(crate) changesets: Option<bool>,
    /// Leave relations out of the extract.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    #[serde(default)]
    pub(crate) no_resolve: Option<bool>,
    /// Keep only relations with a retained member.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    #[serde(default)]
    pub(crate) relation_members: Option<bool>,
    /// Log progress and pass summaries at info level.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    #[serde(default)]
    pub(crate) stats: Option<bool>,
    /// Write a JSON summary of both passes to this path.
    #[arg(long = ARG_REPORT, value_name = "path")]
    #[serde(default)]
    pub(crate) report: Option<Utf8PathBuf>,
    /// Bytes read from the corpus per refill.
    #[arg(long, value_name = "bytes")]
    #[serde(default)]
    pub(crate) chunk_size: Option<usize>,
}

impl ExtractArgs {
    pub(crate) fn into_config(self) -> Result<ExtractConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ExtractConfig::try_from(merged)
    }
}

/// Resolved `extract` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExtractConfig {
    pub(crate) input: Utf8PathBuf,
    pub(crate) output: Option<Utf8PathBuf>,
    pub(crate) report: Option<Utf8PathBuf>,
    pub(crate) options: ExtractOptions,
    pub(crate) chunk_size: usize,
}

impl ExtractConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.input, ARG_INPUT)?;
        require_distinct(&self.input, self.output.as_deref(), ARG_OUTPUT)?;
        require_distinct(&self.input, self.report.as_deref(), ARG_REPORT)
    }
}

impl TryFrom<ExtractArgs> for ExtractConfig {
    type Error = CliError;

    fn try_from(args: ExtractArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_EXTRACT_INPUT,
        })?;

        let world = BoundingBox::world();
        let bbox = BoundingBox::new(
            args.left.unwrap_or(world.left()),
            args.right.unwrap_or(world.right()),
            args.top.unwrap_or(world.top()),
            args.bottom.unwrap_or(world.bottom()),
        )?;
        let defaults = TimeWindow::default();
        let window = TimeWindow::new(
            args.start.unwrap_or(defaults.start()),
            args.end.unwrap_or(defaults.end()),
        )?;

        let resolve = !args.no_resolve.unwrap_or(false);
        let options = ExtractOptions::new(Footprint::new(bbox, window))
            .with_history(args.history.unwrap_or(false))
            .with_changesets(args.changesets.unwrap_or(false))
            .with_relations(RelationMode::from_flags(
                resolve,
                args.relation_members.unwrap_or(false),
            ))
            .with_stats(args.stats.unwrap_or(false));

        Ok(Self {
            input,
            output: args.output,
            report: args.report,
            options,
            chunk_size: args.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
        })
    }
}

pub(crate) fn resolve_extract_config(args: ExtractArgs) -> Result<ExtractConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

/// Run both passes, writing to the configured output or standard output.
pub(crate) fn execute_extract(config: &ExtractConfig) -> Result<ExtractionReport, CliError> {
    let header = ExtractHeader::now();
    let report = extract_into(config, &header, output_sink(config.output.as_deref())?)?;
    if let Some(path) = &config.report {
        write_report(path, &report)?;
    }
    Ok(report)
}

/// Run both passes into `sink` with a fixed header.
pub(crate) fn extract_into<W: Write>(
    config: &ExtractConfig,
    header: &ExtractHeader,
    sink: W,
) -> Result<ExtractionReport, CliError> {
    let source = FileSource::new(config.input.clone());
    let scan = ScanConfig {
        chunk_size: config.chunk_size,
        ..ScanConfig::default()
    };
    let report = extract_footprint_with(&source, &config.options, &scan, header, sink)?;
    info!(
        "extracted {} objects from {} into {}",
        report.extract.objects(),
        config.input,
        config
            .output
            .as_ref()
            .map_or_else(|| "standard output".to_owned(), ToString::to_string),
    );
    Ok(report)
}

/// Buffered writer for `path`, or for standard output when absent.
pub(crate) fn output_sink(path: Option<&Utf8Path>) -> Result<BufWriter<Box<dyn Write>>, CliError> {
    let target: Box<dyn Write> = match path {
        Some(path) => Box::new(create_output(path)?),
        None => Box::new(io::stdout().lock()),
    };
    Ok(BufWriter::new(target))
}

fn create_output(path: &Utf8Path) -> Result<fs_utf8::File, CliError> {
    footprint_fs::create_utf8_file(path).map_err(|source| CliError::CreateOutput {
        path: path.to_path_buf(),
        source,
    })
}

