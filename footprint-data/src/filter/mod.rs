//! Pass 1: decide which objects belong to the footprint.
//!
//! Objects are judged in stream order. Nodes are tested against the box and
//! window directly; ways and relations are judged against what has already
//! been retained, so a way referencing a node that only appears later in the
//! stream is not retained. Standard exports order nodes before ways and ways
//! before relations, which makes this sufficient in practice.

use std::io::Read;

use footprint_core::{
    DomainObject, ExtractOptions, MembershipSets, Node, ObjectKind, Relation,
    RelationMode, Way,
};
use log::{Level, log};
use serde::Serialize;

use crate::assembler::ObjectReader;
use crate::error::ParseError;

/// Objects between progress log lines.
pub const PROGRESS_INTERVAL: u64 = 250_000;

/// Counters gathered during the membership pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    /// Decompressed bytes read.
    pub bytes_read: u64,
    /// Tags scanned.
    pub tags_scanned: u64,
    /// Objects assembled, of every kind and date.
    pub objects: u64,
    /// Nodes assembled.
    pub nodes_seen: u64,
    /// Ways assembled.
    pub ways_seen: u64,
    /// Relations assembled.
    pub relations_seen: u64,
    /// Changesets assembled.
    pub changesets_seen: u64,
    /// Smallest node id inside the time window.
    pub min_node_id: Option<i64>,
    /// Largest node id inside the time window.
    pub max_node_id: Option<i64>,
    /// Nodes retained.
    pub nodes_retained: usize,
    /// Ways retained.
    pub ways_retained: usize,
    /// Relations retained.
    pub relations_retained: usize,
    /// Changesets referenced by retained objects.
    pub changesets_retained: usize,
}

/// Incremental membership builder.
///
/// # Examples
/// ```
/// use footprint_core::{ExtractOptions, ObjectKind};
/// use footprint_data::{FootprintFilter, ObjectReader, TagScanner};
///
/// let corpus = concat!(
///     r#"<node id="1" version="1" timestamp="2010-01-01T00:00:00Z" changeset="5" lat="1" lon="1"/>"#,
///     r#"<way id="10" version="1" timestamp="2010-01-01T00:00:00Z" changeset="6"><nd ref="1"/></way>"#,
/// );
/// let mut reader = ObjectReader::new(TagScanner::new(corpus.as_bytes()));
/// let (sets, _stats) = FootprintFilter::new(ExtractOptions::default()).run(&mut reader)?;
/// assert!(sets.contains(ObjectKind::Way, 10));
/// assert!(sets.contains(ObjectKind::Changeset, 6));
/// # Ok::<(), footprint_data::ParseError>(())
/// ```
#[derive(Debug)]
pub struct FootprintFilter {
    options: ExtractOptions,
    sets: MembershipSets,
    stats: FilterStats,
}

impl FootprintFilter {
    /// A filter with empty membership sets.
    #[must_use]
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            sets: MembershipSets::new(options.history),
            options,
            stats: FilterStats::default(),
        }
    }

    /// Membership decided so far.
    #[must_use]
    pub const fn sets(&self) -> &MembershipSets {
        &self.sets
    }

    /// Judge one object, returning whether it was retained.
    pub fn observe(&mut self, object: &DomainObject) -> bool {
        self.count(object.kind());
        if !self.options.footprint.window.contains(object.date()) {
            return false;
        }
        match object {
            DomainObject::Node(node) => self.observe_node(node),
            DomainObject::Way(way) => self.observe_way(way),
            DomainObject::Relation(relation) => self.observe_relation(relation),
            DomainObject::Changeset(_) => false,
        }
    }

    fn count(&mut self, kind: ObjectKind) {
        self.stats.objects += 1;
        let seen = match kind {
            ObjectKind::Node => &mut self.stats.nodes_seen,
            ObjectKind::Way => &mut self.stats.ways_seen,
            ObjectKind::Relation => &mut self.stats.relations_seen,
            ObjectKind::Changeset => &mut self.stats.changesets_seen,
        };
        *seen += 1;
    }

    fn observe_node(&mut self, node: &Node) -> bool {
        let id = node.meta.id;
        self.stats.min_node_id = Some(self.stats.min_node_id.map_or(id, |min| min.min(id)));
        self.stats.max_node_id = Some(self.stats.max_node_id.map_or(id, |max| max.max(id)));

        let inside = node
            .location
            .is_some_and(|location| self.options.footprint.bbox.contains(location));
        if inside {
            self.sets
                .retain_node(id, node.meta.version, node.meta.changeset);
        }
        inside
    }

    fn observe_way(&mut self, way: &Way) -> bool {
        let matched = way
            .node_refs
            .iter()
            .any(|id| self.sets.contains(ObjectKind::Node, *id));
        if matched {
            self.sets.retain_way(way.meta.id, way.meta.changeset);
        }
        matched
    }

    fn observe_relation(&mut self, relation: &Relation) -> bool {
        let retained = match self.options.relations {
            RelationMode::Skip => false,
            // Member lists are not folded into node or way membership.
            RelationMode::AllInWindow => true,
            RelationMode::ByMembers => relation
                .members
                .iter()
                .any(|member| self.sets.contains(member.kind.into(), member.id)),
        };
        if retained {
            self.sets
                .retain_relation(relation.meta.id, relation.meta.changeset);
        }
        retained
    }

    /// Drain `reader`, logging progress, and return the finished sets.
    ///
    /// # Errors
    /// Propagates the first scan or assembly failure.
    pub fn run<R: Read>(
        mut self,
        reader: &mut ObjectReader<R>,
    ) -> Result<(MembershipSets, FilterStats), ParseError> {
        let level = progress_level(self.options.stats);
        while let Some(object) = reader.next_object()? {
            self.observe(&object);
            if self.stats.objects % PROGRESS_INTERVAL == 0 {
                log!(
                    level,
                    "membership pass: {} objects, {} bytes, {} nodes retained",
                    self.stats.objects,
                    reader.scanner().bytes_read(),
                    self.sets.len(ObjectKind::Node),
                );
            }
        }
        self.stats.bytes_read = reader.scanner().bytes_read();
        self.stats.tags_scanned = reader.scanner().tags_scanned();
        Ok(self.finish())
    }

    /// Stop observing and return the sets with final counters.
    #[must_use]
    pub fn finish(mut self) -> (MembershipSets, FilterStats) {
        self.stats.nodes_retained = self.sets.len(ObjectKind::Node);
        self.stats.ways_retained = self.sets.len(ObjectKind::Way);
        self.stats.relations_retained = self.sets.len(ObjectKind::Relation);
        self.stats.changesets_retained = self.sets.len(ObjectKind::Changeset);
        log!(
            progress_level(self.options.stats),
            "membership pass done: {} objects, {} bytes; retained {} nodes, {} ways, {} relations, {} changesets; node ids {:?}..={:?}",
            self.stats.objects,
            self.stats.bytes_read,
            self.stats.nodes_retained,
            self.stats.ways_retained,
            self.stats.relations_retained,
            self.stats.changesets_retained,
            self.stats.min_node_id,
            self.stats.max_node_id,
        );
        (self.sets, self.stats)
    }
}

pub(crate) const fn progress_level(stats: bool) -> Level {
    if stats { Level::Info } else { Level::Debug }
}
