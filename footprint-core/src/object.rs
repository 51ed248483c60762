//! Transient domain objects assembled from the markup stream.
//!
//! Objects live only between the assembler emitting them and the filter
//! consuming them; nothing here is persisted.

use std::fmt;

use chrono::NaiveDate;
use geo::Coord;

/// Longest key retained on a [`TagPair`], in characters.
pub const TAG_KEY_LIMIT: usize = 29;
/// Longest value retained on a [`TagPair`], in characters.
pub const TAG_VALUE_LIMIT: usize = 254;

/// The four object kinds carried by the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ObjectKind {
    /// A point feature.
    Node,
    /// A polyline or polygon boundary referencing nodes.
    Way,
    /// A grouping of nodes, ways and other relations.
    Relation,
    /// A batch of edits.
    Changeset,
}

impl ObjectKind {
    /// Every kind, in corpus order.
    pub const ALL: [Self; 4] = [Self::Node, Self::Way, Self::Relation, Self::Changeset];

    /// Element name used by the markup for this kind.
    ///
    /// # Examples
    /// ```
    /// use footprint_core::ObjectKind;
    ///
    /// assert_eq!(ObjectKind::Relation.element_name(), "relation");
    /// ```
    #[must_use]
    pub const fn element_name(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
            Self::Changeset => "changeset",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

/// Kind of object referenced by a relation member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Member is a node.
    Node,
    /// Member is a way.
    Way,
    /// Member is another relation.
    Relation,
}

impl MemberKind {
    /// Parse the `type` attribute of a `member` element.
    ///
    /// Returns `None` for anything other than `node`, `way` or `relation`.
    #[must_use]
    pub fn from_type_attribute(value: &str) -> Option<Self> {
        match value {
            "node" => Some(Self::Node),
            "way" => Some(Self::Way),
            "relation" => Some(Self::Relation),
            _ => None,
        }
    }
}

impl From<MemberKind> for ObjectKind {
    fn from(kind: MemberKind) -> Self {
        match kind {
            MemberKind::Node => Self::Node,
            MemberKind::Way => Self::Way,
            MemberKind::Relation => Self::Relation,
        }
    }
}

/// Edit metadata shared by nodes, ways and relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Object identifier, unique per kind.
    pub id: i64,
    /// Edit version of this object.
    pub version: u64,
    /// Date component of the edit timestamp.
    pub date: NaiveDate,
    /// Changeset that produced this version.
    pub changeset: i64,
    /// Display name of the editing user, when present.
    pub user: Option<String>,
    /// Numeric id of the editing user, when present.
    pub uid: Option<i64>,
}

/// A key/value tag normalised for downstream field-name compatibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPair {
    /// Normalised key.
    pub key: String,
    /// Truncated value.
    pub value: String,
}

impl TagPair {
    /// Normalise a raw key/value pair.
    ///
    /// Keys lose leading whitespace, are cut to [`TAG_KEY_LIMIT`] characters,
    /// and have `:` replaced by `_`. Values are cut to [`TAG_VALUE_LIMIT`]
    /// characters.
    ///
    /// # Examples
    /// ```
    /// use footprint_core::TagPair;
    ///
    /// let tag = TagPair::normalised("gnis:feature_id", "1234");
    /// assert_eq!(tag.key, "gnis_feature_id");
    /// assert_eq!(tag.value, "1234");
    /// ```
    #[must_use]
    pub fn normalised(raw_key: &str, raw_value: &str) -> Self {
        Self {
            key: truncate_chars(raw_key.trim_start(), TAG_KEY_LIMIT).replace(':', "_"),
            value: truncate_chars(raw_value, TAG_VALUE_LIMIT).to_owned(),
        }
    }
}

fn truncate_chars(input: &str, limit: usize) -> &str {
    input
        .char_indices()
        .nth(limit)
        .and_then(|(cut, _)| input.get(..cut))
        .unwrap_or(input)
}

/// A single relation member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    /// Kind of the referenced object.
    pub kind: MemberKind,
    /// Identifier of the referenced object.
    pub id: i64,
}

/// A point feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Edit metadata.
    pub meta: ObjectMeta,
    /// WGS84 position with `x = longitude`, `y = latitude`.
    ///
    /// Deleted versions in history corpora carry no position.
    pub location: Option<Coord<f64>>,
    /// Normalised tags.
    pub tags: Vec<TagPair>,
}

/// A polyline or polygon boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Way {
    /// Edit metadata.
    pub meta: ObjectMeta,
    /// Referenced node ids in arrival order.
    pub node_refs: Vec<i64>,
    /// Normalised tags.
    pub tags: Vec<TagPair>,
}

/// A grouping of other objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Edit metadata.
    pub meta: ObjectMeta,
    /// Members in encounter order.
    pub members: Vec<Member>,
    /// Normalised tags.
    pub tags: Vec<TagPair>,
}

/// A batch of edits. Changesets carry no version or tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changeset {
    /// Changeset identifier.
    pub id: i64,
    /// Date component of `created_at`.
    pub date: NaiveDate,
    /// Display name of the editing user, when present.
    pub user: Option<String>,
    /// Numeric id of the editing user, when present.
    pub uid: Option<i64>,
}

/// Tagged union over the four object kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainObject {
    /// A point feature.
    Node(Node),
    /// A polyline or polygon boundary.
    Way(Way),
    /// A grouping of other objects.
    Relation(Relation),
    /// A batch of edits.
    Changeset(Changeset),
}

impl DomainObject {
    /// Kind discriminant.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        match self {
            Self::Node(_) => ObjectKind::Node,
            Self::Way(_) => ObjectKind::Way,
            Self::Relation(_) => ObjectKind::Relation,
            Self::Changeset(_) => ObjectKind::Changeset,
        }
    }

    /// Identifier, unique per kind.
    #[must_use]
    pub const fn id(&self) -> i64 {
        match self {
            Self::Node(node) => node.meta.id,
            Self::Way(way) => way.meta.id,
            Self::Relation(relation) => relation.meta.id,
            Self::Changeset(changeset) => changeset.id,
        }
    }

    /// Date used for time-window filtering.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        match self {
            Self::Node(node) => node.meta.date,
            Self::Way(way) => way.meta.date,
            Self::Relation(relation) => relation.meta.date,
            Self::Changeset(changeset) => changeset.date,
        }
    }

    /// Changeset that produced this object; `None` for changesets themselves.
    #[must_use]
    pub const fn changeset(&self) -> Option<i64> {
        match self {
            Self::Node(node) => Some(node.meta.changeset),
            Self::Way(way) => Some(way.meta.changeset),
            Self::Relation(relation) => Some(relation.meta.changeset),
            Self::Changeset(_) => None,
        }
    }
}
