//! Command-line interface for footprint extraction and corpus chunking.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use serde::Serialize;

mod chunk;
mod error;
mod extract;
mod logging;

pub use error::CliError;

use chunk::{ChunkArgs, execute_chunk, resolve_chunk_config};
use extract::{ExtractArgs, execute_extract, resolve_extract_config};

pub(crate) const ARG_INPUT: &str = "input";
pub(crate) const ARG_OUTPUT: &str = "output";
pub(crate) const ARG_OUTPUT_DIR: &str = "output-dir";
pub(crate) const ARG_REPORT: &str = "report";
pub(crate) const ENV_EXTRACT_INPUT: &str = "FOOTPRINT_CMDS_EXTRACT_INPUT";
pub(crate) const ENV_CHUNK_INPUT: &str = "FOOTPRINT_CMDS_CHUNK_INPUT";

/// Run the footprint CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when parsing, configuration, validation or the
/// selected command fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Extract(args) => {
            let config = resolve_extract_config(args)?;
            logging::init(config.options.stats)?;
            execute_extract(&config)?;
        }
        Command::Chunk(args) => {
            let config = resolve_chunk_config(args)?;
            logging::init(config.stats)?;
            execute_chunk(&config)?;
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(
    name = "footprint",
    about = "Extract spatial and temporal footprints from OpenStreetMap XML corpora",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Copy every object inside a bounding box and date window.
    Extract(ExtractArgs),
    /// Split a corpus into per-kind files.
    Chunk(ChunkArgs),
}

/// Require `path` to name an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match footprint_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Reject an optional output `path` that resolves to the `input` corpus.
pub(crate) fn require_distinct(
    input: &Utf8Path,
    path: Option<&Utf8Path>,
    field: &'static str,
) -> Result<(), CliError> {
    let Some(path) = path else {
        return Ok(());
    };
    let same = path == input
        || matches!(
            (input.canonicalize_utf8(), path.canonicalize_utf8()),
            (Ok(input), Ok(output)) if input == output
        );
    if same {
        Err(CliError::OutputOverwritesInput {
            field,
            path: path.to_path_buf(),
        })
    } else {
        Ok(())
    }
}

/// Write `report` as pretty-printed JSON to `path`.
pub(crate) fn write_report<T: Serialize>(path: &Utf8Path, report: &T) -> Result<(), CliError> {
    let json = serde_json::to_vec_pretty(report).map_err(CliError::SerializeReport)?;
    footprint_fs::create_utf8_file(path)
        .and_then(|mut file| {
            file.write_all(&json)?;
            file.write_all(b"\n")
        })
        .map_err(|source| CliError::WriteReport {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests;
