//! The two-pass extraction pipeline.
//!
//! Pass 1 builds membership from objects; pass 2 re-opens the corpus and
//! copies the retained tags. The passes never share a reader.

use std::io::{Read, Write};

use footprint_core::{CancellationToken, ExtractOptions};
use log::info;
use serde::Serialize;

use crate::assembler::ObjectReader;
use crate::error::PipelineError;
use crate::extract::{ExtractHeader, ExtractReport, Extractor};
use crate::filter::{FilterStats, FootprintFilter};
use crate::scanner::{DEFAULT_CHUNK_SIZE, DEFAULT_TAG_LIMIT, TagScanner};
use crate::source::CorpusSource;

/// Scanner settings applied to both passes.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Bytes requested per refill.
    pub chunk_size: usize,
    /// Largest accepted tag; `None` for no limit.
    pub tag_limit: Option<usize>,
    /// Token checked before every tag.
    pub cancellation: Option<CancellationToken>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            tag_limit: Some(DEFAULT_TAG_LIMIT),
            cancellation: None,
        }
    }
}

impl ScanConfig {
    /// Wrap `reader` in a scanner with these settings.
    pub fn scanner<R: Read>(&self, reader: R) -> TagScanner<R> {
        let scanner = TagScanner::new(reader)
            .with_chunk_size(self.chunk_size)
            .with_tag_limit(self.tag_limit);
        match &self.cancellation {
            Some(token) => scanner.with_cancellation(token.clone()),
            None => scanner,
        }
    }
}

/// Summary of both passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    /// Membership pass counters.
    pub membership: FilterStats,
    /// Extraction pass counters.
    pub extract: ExtractReport,
}

/// Run both passes with default scanner settings and a current timestamp.
///
/// # Errors
/// See [`extract_footprint_with`].
///
/// # Examples
/// ```
/// use footprint_core::ExtractOptions;
/// use footprint_data::{MemorySource, extract_footprint};
///
/// let corpus = r#"<osm><node id="1" version="1" timestamp="2010-01-01T00:00:00Z" changeset="1" lat="0" lon="0"/></osm>"#;
/// let mut out = Vec::new();
/// let report = extract_footprint(&MemorySource::new(corpus), &ExtractOptions::default(), &mut out)?;
/// assert_eq!(report.extract.nodes, 1);
/// # Ok::<(), footprint_data::PipelineError>(())
/// ```
pub fn extract_footprint<S, W>(
    source: &S,
    options: &ExtractOptions,
    sink: W,
) -> Result<ExtractionReport, PipelineError>
where
    S: CorpusSource + ?Sized,
    W: Write,
{
    extract_footprint_with(
        source,
        options,
        &ScanConfig::default(),
        &ExtractHeader::now(),
        sink,
    )
}

/// Run both passes, opening `source` once for each.
///
/// # Errors
/// Returns [`PipelineError::Source`] when the corpus cannot be opened, and
/// the pass-specific variants, tagged with the tag count reached, for any
/// scan, parse or write failure. Nothing is salvaged from a failed pass.
pub fn extract_footprint_with<S, W>(
    source: &S,
    options: &ExtractOptions,
    config: &ScanConfig,
    header: &ExtractHeader,
    sink: W,
) -> Result<ExtractionReport, PipelineError>
where
    S: CorpusSource + ?Sized,
    W: Write,
{
    info!("membership pass over {}", source.describe());
    let mut reader = ObjectReader::new(config.scanner(source.open()?));
    let (sets, membership) = FootprintFilter::new(*options)
        .run(&mut reader)
        .map_err(|err| PipelineError::MembershipPass {
            tags: reader.scanner().tags_scanned(),
            source: err,
        })?;
    drop(reader);

    info!("extraction pass over {}", source.describe());
    let mut scanner = config.scanner(source.open()?);
    let extract = Extractor::new(&sets, options, sink)
        .run(&mut scanner, header)
        .map_err(|err| PipelineError::ExtractionPass {
            tags: scanner.tags_scanned(),
            source: err,
        })?;

    Ok(ExtractionReport {
        membership,
        extract,
    })
}
