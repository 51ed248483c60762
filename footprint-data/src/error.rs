//! Error types produced while reading, filtering and extracting a corpus.

use std::io;

use camino::Utf8PathBuf;
use footprint_core::ObjectKind;
use thiserror::Error;

/// Fatal set-up failures raised before any pass begins.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    /// The corpus could not be opened.
    #[error("failed to open corpus at {path}: {source}")]
    Open {
        /// Path that failed to open.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The corpus does not look like the compression its name claims.
    #[error("failed to decompress corpus at {path}: {source}")]
    Decompress {
        /// Path of the compressed corpus.
        path: Utf8PathBuf,
        /// Underlying decoder error.
        source: io::Error,
    },
}

/// Failures while lexing the character stream into tags.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScanError {
    /// Reading from the underlying stream failed.
    #[error("read failed at byte {offset}: {source}")]
    Read {
        /// Stream offset at which the read was attempted.
        offset: u64,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// A tag grew past the configured limit without a closing delimiter.
    #[error("tag starting at byte {offset} exceeds {limit} bytes")]
    TagTooLarge {
        /// Stream offset of the tag start.
        offset: u64,
        /// Configured limit in bytes.
        limit: usize,
    },
    /// The stream ended in the middle of a tag.
    #[error("stream ended inside a tag at byte {offset}: {partial:?}")]
    UnexpectedEof {
        /// Stream offset of the unterminated tag.
        offset: u64,
        /// Leading bytes of the unterminated tag, lossily decoded.
        partial: String,
    },
    /// A tag was not valid UTF-8.
    #[error("tag at byte {offset} is not valid UTF-8")]
    InvalidUtf8 {
        /// Stream offset of the tag.
        offset: u64,
    },
    /// Cancellation was requested.
    #[error("scan cancelled at byte {offset}")]
    Cancelled {
        /// Stream offset reached when cancellation was observed.
        offset: u64,
    },
}

/// Reasons a single tag or tag sequence is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum MarkupError {
    /// The tag does not start with `<`.
    #[error("tag does not start with '<'")]
    MissingOpen,
    /// The tag has no element name.
    #[error("tag has no element name")]
    MissingName,
    /// An attribute is not of the form `name="value"`.
    #[error("malformed attribute near {near:?}")]
    MalformedAttribute {
        /// Text at which tokenising stopped.
        near: String,
    },
    /// A required attribute is absent.
    #[error("missing required attribute {name:?}")]
    MissingAttribute {
        /// Attribute name.
        name: &'static str,
    },
    /// An attribute value could not be parsed as a number.
    #[error("attribute {name:?} has invalid value {value:?}")]
    InvalidValue {
        /// Attribute name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
    /// A relation member has an unknown `type`.
    #[error("member type {value:?} is not node, way or relation")]
    InvalidMemberType {
        /// Raw value.
        value: String,
    },
    /// An object started while another was still open.
    #[error("{found} starts inside open {open}")]
    NestedObject {
        /// Kind of the object already open.
        open: ObjectKind,
        /// Kind of the new start tag.
        found: ObjectKind,
    },
    /// An end tag does not close the open object.
    #[error("end tag for {found} does not match the open object")]
    UnmatchedEnd {
        /// Kind named by the end tag.
        found: ObjectKind,
    },
}

/// Failures while assembling objects from tags.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Lexing failed.
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// A tag violated the markup grammar or object structure.
    #[error("malformed tag at byte {offset}: {reason}: {tag}")]
    MalformedTag {
        /// Stream offset of the tag.
        offset: u64,
        /// Tag text.
        tag: String,
        /// What was wrong with it.
        #[source]
        reason: MarkupError,
    },
    /// A timestamp did not match `YYYY-MM-DDThh:mm:ssZ`.
    #[error("timestamp {value:?} at byte {offset} is not YYYY-MM-DDThh:mm:ssZ")]
    TimestampFormat {
        /// Stream offset of the tag.
        offset: u64,
        /// Raw timestamp.
        value: String,
    },
    /// The stream ended while an object was still open.
    #[error("stream ended inside {kind} {id}")]
    UnclosedObject {
        /// Kind of the open object.
        kind: ObjectKind,
        /// Identifier of the open object.
        id: i64,
    },
}

/// Failures during the extraction pass.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// Lexing failed.
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// An object start tag could not be interpreted.
    #[error("malformed tag at byte {offset}: {reason}: {tag}")]
    MalformedTag {
        /// Stream offset of the tag.
        offset: u64,
        /// Tag text.
        tag: String,
        /// What was wrong with it.
        #[source]
        reason: MarkupError,
    },
    /// Writing to the sink failed.
    #[error("failed to write extract: {source}")]
    Write {
        /// Underlying I/O error.
        source: io::Error,
    },
}

/// Failures of the two-pass pipeline, tagged with how far the pass got.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// The corpus could not be opened for a pass.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// Pass 1 failed.
    #[error("membership pass failed after {tags} tags")]
    MembershipPass {
        /// Tags scanned before the failure.
        tags: u64,
        /// Underlying failure.
        #[source]
        source: ParseError,
    },
    /// Pass 2 failed.
    #[error("extraction pass failed after {tags} tags")]
    ExtractionPass {
        /// Tags scanned before the failure.
        tags: u64,
        /// Underlying failure.
        #[source]
        source: ExtractError,
    },
}

/// Failures while splitting a corpus by object kind.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChunkError {
    /// Lexing failed.
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// A tag could not be classified.
    #[error("malformed tag at byte {offset}: {reason}: {tag}")]
    MalformedTag {
        /// Stream offset of the tag.
        offset: u64,
        /// Tag text.
        tag: String,
        /// What was wrong with it.
        #[source]
        reason: MarkupError,
    },
    /// A chunk file could not be created.
    #[error("failed to open chunk {name}: {source}")]
    OpenChunk {
        /// Chunk file name.
        name: String,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Writing to a chunk failed.
    #[error("failed to write chunk {name}: {source}")]
    Write {
        /// Chunk file name.
        name: String,
        /// Underlying I/O error.
        source: io::Error,
    },
}
