//! Streaming corpus access for the footprint engine.
//!
//! Responsibilities:
//! - Lex a corpus into tags over a bounded, refillable window.
//! - Assemble tags into domain objects for the membership pass.
//! - Run the two-pass footprint extraction and the per-kind chunker.
//! - Open plain, gzip and bzip2 corpora from disk or memory.
//!
//! Boundaries:
//! - Domain types and membership live in `footprint-core`.
//! - Argument parsing and logger set-up live in `footprint-cli`.
//!
//! Invariants:
//! - Memory stays bounded by the membership sets plus one tag window.
//! - Each pass opens its own reader; no pass rewinds another's stream.
#![forbid(unsafe_code)]

mod assembler;
mod chunk;
mod error;
mod extract;
mod filter;
pub mod markup;
mod pipeline;
mod scanner;
mod source;
#[doc(hidden)]
pub mod test_support;

pub use assembler::{ObjectAssembler, ObjectReader};
pub use chunk::{
    ChunkReport, ChunkSink, DEFAULT_OBJECTS_PER_FILE, DirectorySink, KindTally, MemoryChunk,
    MemorySink, chunk_by_kind, chunk_name,
};
pub use error::{
    ChunkError, ExtractError, MarkupError, ParseError, PipelineError, ScanError, SourceError,
};
pub use extract::{ExtractHeader, ExtractReport, Extractor};
pub use filter::{FilterStats, FootprintFilter};
pub use pipeline::{ExtractionReport, ScanConfig, extract_footprint, extract_footprint_with};
pub use scanner::{DEFAULT_CHUNK_SIZE, DEFAULT_TAG_LIMIT, Tag, TagScanner};
pub use source::{Compression, CorpusSource, FileSource, MemorySource};
