//! Split a corpus into per-kind files.
//!
//! Every top-level object is copied, children and all, to the current file
//! for its kind; each kind rotates to a fresh numbered file once it holds
//! `objects_per_file` objects. Tags outside any object (prolog, root,
//! bounds) go to a single `other` file. Output files are fragments, not
//! standalone documents.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{self, BufWriter, Read, Write};
use std::rc::Rc;

use camino::Utf8Path;
use cap_std::fs_utf8;
use footprint_core::ObjectKind;
use log::log;
use serde::Serialize;

use crate::error::{ChunkError, MarkupError};
use crate::filter::progress_level;
use crate::markup::{Markup, TagForm};
use crate::scanner::{Tag, TagScanner};

/// Objects per file when no other limit is configured.
pub const DEFAULT_OBJECTS_PER_FILE: u64 = 500_000;

/// Tags between progress log lines.
pub const PROGRESS_INTERVAL: u64 = 1_000_000;

/// Destination for named chunk files.
pub trait ChunkSink {
    /// Writer for a single chunk.
    type Writer: Write;

    /// Create the chunk called `name`, replacing any previous content.
    ///
    /// # Errors
    /// Returns the I/O error raised while creating the chunk.
    fn create(&mut self, name: &str) -> io::Result<Self::Writer>;
}

/// Writes chunks as files inside one directory.
#[derive(Debug)]
pub struct DirectorySink {
    dir: fs_utf8::Dir,
}

impl DirectorySink {
    /// Open `path` as the output directory, creating it when missing.
    ///
    /// # Errors
    /// Returns the I/O error raised while creating or opening the directory.
    pub fn new(path: &Utf8Path) -> io::Result<Self> {
        footprint_fs::create_dir_all(path).map(|dir| Self { dir })
    }
}

impl ChunkSink for DirectorySink {
    type Writer = BufWriter<fs_utf8::File>;

    fn create(&mut self, name: &str) -> io::Result<Self::Writer> {
        self.dir.create(name).map(BufWriter::new)
    }
}

/// Keeps chunks in memory, shared between the sink and its writers.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    chunks: Rc<RefCell<BTreeMap<String, Vec<u8>>>>,
}

impl MemorySink {
    /// An empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every chunk created, in lexical order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.chunks.borrow().keys().cloned().collect()
    }

    /// Contents of the chunk called `name`, if it exists and is UTF-8.
    #[must_use]
    pub fn contents(&self, name: &str) -> Option<String> {
        self.chunks
            .borrow()
            .get(name)
            .and_then(|bytes| String::from_utf8(bytes.clone()).ok())
    }
}

/// Writer returned by [`MemorySink`].
#[derive(Debug)]
pub struct MemoryChunk {
    name: String,
    chunks: Rc<RefCell<BTreeMap<String, Vec<u8>>>>,
}

impl Write for MemoryChunk {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.chunks
            .borrow_mut()
            .entry(self.name.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ChunkSink for MemorySink {
    type Writer = MemoryChunk;

    fn create(&mut self, name: &str) -> io::Result<Self::Writer> {
        self.chunks.borrow_mut().insert(name.to_owned(), Vec::new());
        Ok(MemoryChunk {
            name: name.to_owned(),
            chunks: Rc::clone(&self.chunks),
        })
    }
}

/// Objects and files written for one kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindTally {
    /// Objects routed to this kind.
    pub objects: u64,
    /// Files created for this kind.
    pub files: u64,
}

/// Summary of a chunking run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChunkReport {
    /// Node chunks.
    pub nodes: KindTally,
    /// Way chunks.
    pub ways: KindTally,
    /// Relation chunks.
    pub relations: KindTally,
    /// Changeset chunks.
    pub changesets: KindTally,
    /// Tags written to the `other` file.
    pub other_tags: u64,
    /// Every file created, in creation order.
    pub files: Vec<String>,
    /// Tags scanned.
    pub tags_scanned: u64,
    /// Decompressed bytes read.
    pub bytes_read: u64,
}

impl ChunkReport {
    /// Tally for `kind`.
    #[must_use]
    pub const fn tally(&self, kind: ObjectKind) -> &KindTally {
        match kind {
            ObjectKind::Node => &self.nodes,
            ObjectKind::Way => &self.ways,
            ObjectKind::Relation => &self.relations,
            ObjectKind::Changeset => &self.changesets,
        }
    }

    const fn tally_mut(&mut self, kind: ObjectKind) -> &mut KindTally {
        match kind {
            ObjectKind::Node => &mut self.nodes,
            ObjectKind::Way => &mut self.ways,
            ObjectKind::Relation => &mut self.relations,
            ObjectKind::Changeset => &mut self.changesets,
        }
    }

    /// Objects routed across all kinds.
    #[must_use]
    pub const fn objects(&self) -> u64 {
        self.nodes.objects + self.ways.objects + self.relations.objects + self.changesets.objects
    }
}

const fn plural(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::Node => "nodes",
        ObjectKind::Way => "ways",
        ObjectKind::Relation => "relations",
        ObjectKind::Changeset => "changesets",
    }
}

/// Name of the `index`th chunk for `kind`.
///
/// # Examples
/// ```
/// use footprint_core::ObjectKind;
/// use footprint_data::chunk_name;
///
/// assert_eq!(chunk_name("planet", Some(ObjectKind::Way), 3), "planet-ways.osm.00003");
/// assert_eq!(chunk_name("planet", None, 0), "planet-other.osm");
/// ```
#[must_use]
pub fn chunk_name(stem: &str, kind: Option<ObjectKind>, index: u64) -> String {
    match kind {
        Some(kind) => format!("{stem}-{}.osm.{index:05}", plural(kind)),
        None => format!("{stem}-other.osm"),
    }
}

struct ActiveChunk<W> {
    name: String,
    writer: W,
    objects: u64,
}

impl<W: Write> ActiveChunk<W> {
    fn write_line(&mut self, text: &str) -> Result<(), ChunkError> {
        writeln!(self.writer, "{text}").map_err(|source| ChunkError::Write {
            name: self.name.clone(),
            source,
        })
    }

    fn close(mut self) -> Result<(), ChunkError> {
        self.writer.flush().map_err(|source| ChunkError::Write {
            name: self.name,
            source,
        })
    }
}

/// Routes tags to per-kind chunks.
struct Chunker<'a, S: ChunkSink> {
    stem: &'a str,
    objects_per_file: u64,
    sink: &'a mut S,
    chunks: [Option<ActiveChunk<S::Writer>>; 4],
    other: Option<ActiveChunk<S::Writer>>,
    open: Option<ObjectKind>,
    report: ChunkReport,
}

const fn slot(kind: ObjectKind) -> usize {
    match kind {
        ObjectKind::Node => 0,
        ObjectKind::Way => 1,
        ObjectKind::Relation => 2,
        ObjectKind::Changeset => 3,
    }
}

impl<'a, S: ChunkSink> Chunker<'a, S> {
    fn new(stem: &'a str, objects_per_file: u64, sink: &'a mut S) -> Self {
        Self {
            stem,
            objects_per_file: objects_per_file.max(1),
            sink,
            chunks: [None, None, None, None],
            other: None,
            open: None,
            report: ChunkReport::default(),
        }
    }

    fn create(&mut self, name: String) -> Result<ActiveChunk<S::Writer>, ChunkError> {
        let writer = self
            .sink
            .create(&name)
            .map_err(|source| ChunkError::OpenChunk {
                name: name.clone(),
                source,
            })?;
        self.report.files.push(name.clone());
        Ok(ActiveChunk {
            name,
            writer,
            objects: 0,
        })
    }

    fn process(&mut self, tag: &Tag<'_>) -> Result<(), ChunkError> {
        let markup = Markup::parse(tag.text()).map_err(|reason: MarkupError| {
            ChunkError::MalformedTag {
                offset: tag.offset(),
                tag: tag.text().to_owned(),
                reason,
            }
        })?;
        match (markup.kind().object_kind(), markup.form()) {
            (Some(kind), TagForm::End) => {
                self.open = None;
                self.kind_chunk(kind)?.write_line(tag.text())
            }
            (Some(kind), form) => {
                self.start_object(kind)?;
                if form == TagForm::Start {
                    self.open = Some(kind);
                }
                self.kind_chunk(kind)?.write_line(tag.text())
            }
            (None, _) => match self.open {
                Some(kind) => self.kind_chunk(kind)?.write_line(tag.text()),
                None => {
                    self.report.other_tags += 1;
                    self.other_chunk()?.write_line(tag.text())
                }
            },
        }
    }

    fn start_object(&mut self, kind: ObjectKind) -> Result<(), ChunkError> {
        let full = self.chunks[slot(kind)]
            .as_ref()
            .is_some_and(|chunk| chunk.objects >= self.objects_per_file);
        if full && let Some(chunk) = self.chunks[slot(kind)].take() {
            chunk.close()?;
        }
        let chunk = self.kind_chunk(kind)?;
        chunk.objects += 1;
        self.report.tally_mut(kind).objects += 1;
        Ok(())
    }

    fn kind_chunk(&mut self, kind: ObjectKind) -> Result<&mut ActiveChunk<S::Writer>, ChunkError> {
        let position = slot(kind);
        let chunk = match self.chunks[position].take() {
            Some(chunk) => chunk,
            None => {
                let index = self.report.tally(kind).files;
                let chunk = self.create(chunk_name(self.stem, Some(kind), index))?;
                self.report.tally_mut(kind).files += 1;
                chunk
            }
        };
        Ok(self.chunks[position].insert(chunk))
    }

    fn other_chunk(&mut self) -> Result<&mut ActiveChunk<S::Writer>, ChunkError> {
        let chunk = match self.other.take() {
            Some(chunk) => chunk,
            None => self.create(chunk_name(self.stem, None, 0))?,
        };
        Ok(self.other.insert(chunk))
    }

    fn finish(mut self) -> Result<ChunkReport, ChunkError> {
        for chunk in self.chunks.iter_mut().filter_map(Option::take) {
            chunk.close()?;
        }
        if let Some(chunk) = self.other.take() {
            chunk.close()?;
        }
        Ok(self.report)
    }
}

/// Split the tags from `scanner` into per-kind chunks named after `stem`.
///
/// # Errors
/// Fails on the first scan error, unclassifiable tag, or chunk I/O failure.
///
/// # Examples
/// ```
/// use footprint_data::{MemorySink, TagScanner, chunk_by_kind};
///
/// let corpus = concat!(
///     "<osm>",
///     r#"<node id="1" lat="0" lon="0"/>"#,
///     r#"<way id="2"><nd ref="1"/></way>"#,
///     "</osm>",
/// );
/// let mut sink = MemorySink::new();
/// let report = chunk_by_kind(&mut TagScanner::new(corpus.as_bytes()), "tiny", 10, &mut sink, false)?;
/// assert_eq!(report.objects(), 2);
/// assert_eq!(sink.contents("tiny-ways.osm.00000").as_deref(), Some("<way id=\"2\">\n<nd ref=\"1\"/>\n</way>\n"));
/// # Ok::<(), footprint_data::ChunkError>(())
/// ```
pub fn chunk_by_kind<R: Read, S: ChunkSink>(
    scanner: &mut TagScanner<R>,
    stem: &str,
    objects_per_file: u64,
    sink: &mut S,
    stats: bool,
) -> Result<ChunkReport, ChunkError> {
    let level = progress_level(stats);
    let mut chunker = Chunker::new(stem, objects_per_file, sink);
    while let Some(tag) = scanner.next_tag()? {
        chunker.process(&tag)?;
        if scanner.tags_scanned() % PROGRESS_INTERVAL == 0 {
            log!(
                level,
                "chunking: {} tags, {} bytes, {} objects",
                scanner.tags_scanned(),
                scanner.bytes_read(),
                chunker.report.objects(),
            );
        }
    }
    let mut report = chunker.finish()?;
    report.tags_scanned = scanner.tags_scanned();
    report.bytes_read = scanner.bytes_read();
    log!(
        level,
        "chunking done: {} nodes, {} ways, {} relations, {} changesets in {} files",
        report.nodes.objects,
        report.ways.objects,
        report.relations.objects,
        report.changesets.objects,
        report.files.len(),
    );
    Ok(report)
}
