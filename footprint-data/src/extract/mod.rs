//! Pass 2: re-emit the tags of retained objects.
//!
//! This pass works on tags, not objects. Each top-level start tag decides a
//! keep flag from the membership sets; children and the closing tag follow
//! that flag. The corpus prolog, root and bounds are replaced by a
//! synthesised header.

use std::io::{Read, Write};

use chrono::{NaiveDateTime, Utc};
use footprint_core::{BoundingBox, ExtractOptions, MembershipSets, ObjectKind};
use log::log;
use serde::Serialize;

use crate::error::{ExtractError, MarkupError};
use crate::filter::progress_level;
use crate::markup::{ElementKind, Markup, TagForm};
use crate::scanner::{Tag, TagScanner};

/// Tags between progress log lines.
pub const PROGRESS_INTERVAL: u64 = 1_000_000;

const OBJECT_INDENT: &str = "  ";
const CHILD_INDENT: &str = "    ";
const GENERATOR: &str = "footprint";

/// Generator metadata written into the output root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractHeader {
    timestamp: NaiveDateTime,
}

impl ExtractHeader {
    /// Header stamped with `timestamp`.
    #[must_use]
    pub const fn new(timestamp: NaiveDateTime) -> Self {
        Self { timestamp }
    }

    /// Header stamped with the current UTC time.
    #[must_use]
    pub fn now() -> Self {
        Self::new(Utc::now().naive_utc())
    }

    fn write_prologue(&self, bbox: &BoundingBox, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            out,
            r#"<osm version="0.6" generator="{GENERATOR}" timestamp="{}">"#,
            self.timestamp.format("%Y-%m-%dT%H:%M:%SZ"),
        )?;
        writeln!(
            out,
            r#"{OBJECT_INDENT}<bound box="{},{},{},{}" origin="{GENERATOR}"/>"#,
            bbox.left(),
            bbox.bottom(),
            bbox.right(),
            bbox.top(),
        )
    }
}

/// Counters gathered during the extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractReport {
    /// Nodes written.
    pub nodes: u64,
    /// Ways written.
    pub ways: u64,
    /// Relations written.
    pub relations: u64,
    /// Changesets written.
    pub changesets: u64,
    /// Corpus tags copied to the output.
    pub tags_written: u64,
    /// Tags scanned.
    pub tags_scanned: u64,
    /// Decompressed bytes read.
    pub bytes_read: u64,
}

impl ExtractReport {
    fn record(&mut self, kind: ObjectKind) {
        let counter = match kind {
            ObjectKind::Node => &mut self.nodes,
            ObjectKind::Way => &mut self.ways,
            ObjectKind::Relation => &mut self.relations,
            ObjectKind::Changeset => &mut self.changesets,
        };
        *counter += 1;
    }

    /// Objects written across all kinds.
    #[must_use]
    pub const fn objects(&self) -> u64 {
        self.nodes + self.ways + self.relations + self.changesets
    }
}

/// Tag-level filter writing retained objects to a sink.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use footprint_core::{ExtractOptions, MembershipSets};
/// use footprint_data::{ExtractHeader, Extractor, TagScanner};
///
/// let mut sets = MembershipSets::new(false);
/// sets.retain_node(1, 1, 5);
/// let corpus = concat!(
///     r#"<node id="1" version="1" timestamp="2010-01-01T00:00:00Z" changeset="5" lat="1" lon="1"/>"#,
///     r#"<node id="2" version="1" timestamp="2010-01-01T00:00:00Z" changeset="5" lat="9" lon="9"/>"#,
/// );
/// let stamp = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let options = ExtractOptions::default();
/// let mut out = Vec::new();
/// let mut extractor = Extractor::new(&sets, &options, &mut out);
/// extractor.run(&mut TagScanner::new(corpus.as_bytes()), &ExtractHeader::new(stamp))?;
/// let text = String::from_utf8(out)?;
/// assert!(text.contains(r#"<node id="1""#));
/// assert!(!text.contains(r#"<node id="2""#));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Extractor<'a, W> {
    sets: &'a MembershipSets,
    options: &'a ExtractOptions,
    out: W,
    keep: bool,
    report: ExtractReport,
}

impl<'a, W: Write> Extractor<'a, W> {
    /// Extract against `sets` into `out`.
    pub fn new(sets: &'a MembershipSets, options: &'a ExtractOptions, out: W) -> Self {
        Self {
            sets,
            options,
            out,
            keep: false,
            report: ExtractReport::default(),
        }
    }

    /// Counters so far.
    pub const fn report(&self) -> &ExtractReport {
        &self.report
    }

    /// Write the header, every retained tag from `scanner`, and the footer.
    ///
    /// # Errors
    /// Fails on the first scan error, malformed object start tag, or write
    /// failure.
    pub fn run<R: Read>(
        &mut self,
        scanner: &mut TagScanner<R>,
        header: &ExtractHeader,
    ) -> Result<ExtractReport, ExtractError> {
        let level = progress_level(self.options.stats);
        header
            .write_prologue(&self.options.footprint.bbox, &mut self.out)
            .map_err(|source| ExtractError::Write { source })?;
        while let Some(tag) = scanner.next_tag()? {
            self.process(&tag)?;
            if scanner.tags_scanned() % PROGRESS_INTERVAL == 0 {
                log!(
                    level,
                    "extraction pass: {} tags, {} bytes, {} objects written",
                    scanner.tags_scanned(),
                    scanner.bytes_read(),
                    self.report.objects(),
                );
            }
        }
        self.finish()?;
        self.report.tags_scanned = scanner.tags_scanned();
        self.report.bytes_read = scanner.bytes_read();
        log!(
            level,
            "extraction pass done: {} nodes, {} ways, {} relations, {} changesets, {} tags written",
            self.report.nodes,
            self.report.ways,
            self.report.relations,
            self.report.changesets,
            self.report.tags_written,
        );
        Ok(self.report.clone())
    }

    /// Route one corpus tag.
    ///
    /// # Errors
    /// Fails when an object start tag lacks the attributes the keep decision
    /// needs, or when writing fails.
    pub fn process(&mut self, tag: &Tag<'_>) -> Result<(), ExtractError> {
        let malformed = |reason: MarkupError| ExtractError::MalformedTag {
            offset: tag.offset(),
            tag: tag.text().to_owned(),
            reason,
        };
        let markup = Markup::parse(tag.text()).map_err(malformed)?;

        match (markup.kind().object_kind(), markup.form()) {
            (Some(_), TagForm::End) => {
                if self.keep {
                    self.emit(OBJECT_INDENT, tag.text())?;
                }
                self.keep = false;
            }
            (Some(kind), form) => {
                let keep = self.decide(kind, &markup).map_err(malformed)?;
                if keep {
                    self.emit(OBJECT_INDENT, tag.text())?;
                    self.report.record(kind);
                }
                self.keep = keep && form == TagForm::Start;
            }
            (None, _) => match markup.kind() {
                ElementKind::Prolog | ElementKind::Root | ElementKind::Bound => {}
                _ => {
                    if self.keep {
                        self.emit(CHILD_INDENT, tag.text())?;
                    }
                }
            },
        }
        Ok(())
    }

    fn decide(&self, kind: ObjectKind, markup: &Markup<'_>) -> Result<bool, MarkupError> {
        let attributes = markup.attributes()?;
        let id: i64 = attributes.parse("id")?;
        Ok(match kind {
            ObjectKind::Node => {
                self.sets.contains(ObjectKind::Node, id)
                    && (self.sets.is_history()
                        || self
                            .sets
                            .keeps_node_version(id, attributes.parse("version")?))
            }
            ObjectKind::Way | ObjectKind::Relation => self.sets.contains(kind, id),
            ObjectKind::Changeset => {
                self.options.changesets && self.sets.contains(ObjectKind::Changeset, id)
            }
        })
    }

    fn emit(&mut self, indent: &str, text: &str) -> Result<(), ExtractError> {
        self.report.tags_written += 1;
        writeln!(self.out, "{indent}{text}").map_err(|source| ExtractError::Write { source })
    }

    /// Write the footer and flush.
    ///
    /// # Errors
    /// Fails when writing or flushing fails.
    pub fn finish(&mut self) -> Result<(), ExtractError> {
        writeln!(self.out, "</osm>")
            .and_then(|()| self.out.flush())
            .map_err(|source| ExtractError::Write { source })
    }
}
