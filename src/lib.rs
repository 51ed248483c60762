//! Facade crate for the footprint extraction engine.
//!
//! This crate re-exports the domain types from `footprint-core` and the
//! streaming extraction and chunking entry points from `footprint-data`.

#![forbid(unsafe_code)]

pub use footprint_core::{
    BoundingBox, CancellationToken, ExtractOptions, Footprint, FootprintError, MemberKind,
    ObjectKind, RelationMode, TimeWindow,
};

pub use footprint_data::{
    ChunkError, ChunkReport, ChunkSink, CorpusSource, DirectorySink, ExtractHeader,
    ExtractionReport, FileSource, MemorySource, PipelineError, ScanConfig, SourceError,
    chunk_by_kind, extract_footprint, extract_footprint_with,
};
