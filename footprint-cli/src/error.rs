//! Error types emitted by the footprint CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use footprint_core::FootprintError;
use footprint_data::{ChunkError, PipelineError, SourceError};
use thiserror::Error;

/// Errors emitted by the footprint CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The bounding box or time window is invalid.
    #[error("invalid footprint: {0}")]
    InvalidFootprint(#[from] FootprintError),
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An output path names the input corpus.
    #[error("{field} path {path:?} is the input corpus")]
    OutputOverwritesInput {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// An output file or directory could not be created.
    #[error("failed to create {path:?}: {source}")]
    CreateOutput {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The corpus could not be opened.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// Footprint extraction failed.
    #[error("extraction failed: {0}")]
    Extract(#[from] PipelineError),
    /// Chunking failed.
    #[error("chunking failed: {0}")]
    Chunk(#[from] ChunkError),
    /// Serialising the run report failed.
    #[error("failed to serialise report: {0}")]
    SerializeReport(#[source] serde_json::Error),
    /// Writing the run report failed.
    #[error("failed to write report to {path:?}: {source}")]
    WriteReport {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A global logger was already installed.
    #[error("failed to install logger: {0}")]
    Logging(#[from] log::SetLoggerError),
}
