//! Turns a tag sequence into domain objects.
//!
//! The assembler is a small state machine: idle, or inside exactly one node,
//! way, relation or changeset. Child tags attach to the open object and the
//! matching end tag (or a self-closing start tag) emits it. Prologs, the
//! document root and bounds are skipped.

use std::io::Read;

use chrono::{NaiveDate, NaiveDateTime};
use footprint_core::{
    Changeset, DomainObject, Member, MemberKind, Node, ObjectKind, ObjectMeta, Relation, TagPair,
    Way,
};
use geo::Coord;

use crate::error::{MarkupError, ParseError};
use crate::markup::{Attributes, ElementKind, Markup, TagForm};
use crate::scanner::{Tag, TagScanner};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Open(DomainObject),
}

/// Tag-driven object state machine.
///
/// # Examples
/// ```
/// use footprint_data::{ObjectAssembler, TagScanner};
///
/// let corpus = br#"<node id="1" version="2" timestamp="2010-01-01T00:00:00Z" changeset="9" lat="1" lon="2"/>"#;
/// let mut scanner = TagScanner::new(&corpus[..]);
/// let mut assembler = ObjectAssembler::new();
/// let tag = scanner.next_tag()?.expect("one tag");
/// let object = assembler.feed(&tag)?.expect("self-closing node");
/// assert_eq!(object.id(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct ObjectAssembler {
    state: State,
}

impl ObjectAssembler {
    /// An idle assembler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Kind and id of the object currently open, if any.
    #[must_use]
    pub const fn open_object(&self) -> Option<(ObjectKind, i64)> {
        match &self.state {
            State::Idle => None,
            State::Open(object) => Some((object.kind(), object.id())),
        }
    }

    /// Consume one tag, returning an object when it completes one.
    ///
    /// # Errors
    /// Returns [`ParseError::MalformedTag`] for grammar or structure
    /// violations and [`ParseError::TimestampFormat`] for unparseable dates.
    pub fn feed(&mut self, tag: &Tag<'_>) -> Result<Option<DomainObject>, ParseError> {
        let malformed = |reason: MarkupError| malformed_tag(tag, reason);
        let markup = Markup::parse(tag.text()).map_err(malformed)?;

        if let Some(kind) = markup.kind().object_kind() {
            return match markup.form() {
                TagForm::End => self.close(kind).map_err(malformed),
                form => {
                    if let Some((open, _)) = self.open_object() {
                        return Err(malformed(MarkupError::NestedObject { open, found: kind }));
                    }
                    let object = start_object(kind, &markup, tag)?;
                    if form == TagForm::SelfClosing {
                        Ok(Some(object))
                    } else {
                        self.state = State::Open(object);
                        Ok(None)
                    }
                }
            };
        }

        if markup.form() != TagForm::End
            && let State::Open(object) = &mut self.state
        {
            attach_child(object, &markup).map_err(malformed)?;
        }
        Ok(None)
    }

    fn close(&mut self, kind: ObjectKind) -> Result<Option<DomainObject>, MarkupError> {
        match std::mem::take(&mut self.state) {
            State::Open(object) if object.kind() == kind => Ok(Some(object)),
            other => {
                self.state = other;
                Err(MarkupError::UnmatchedEnd { found: kind })
            }
        }
    }
}

fn start_object(
    kind: ObjectKind,
    markup: &Markup<'_>,
    tag: &Tag<'_>,
) -> Result<DomainObject, ParseError> {
    let malformed = |reason: MarkupError| malformed_tag(tag, reason);
    let attributes = markup.attributes().map_err(malformed)?;

    Ok(match kind {
        ObjectKind::Node => DomainObject::Node(Node {
            meta: read_meta(&attributes, tag)?,
            location: read_location(&attributes).map_err(malformed)?,
            tags: Vec::new(),
        }),
        ObjectKind::Way => DomainObject::Way(Way {
            meta: read_meta(&attributes, tag)?,
            node_refs: Vec::new(),
            tags: Vec::new(),
        }),
        ObjectKind::Relation => DomainObject::Relation(Relation {
            meta: read_meta(&attributes, tag)?,
            members: Vec::new(),
            tags: Vec::new(),
        }),
        ObjectKind::Changeset => {
            let created_at = attributes.require("created_at").map_err(malformed)?;
            DomainObject::Changeset(Changeset {
                id: attributes.parse("id").map_err(malformed)?,
                date: parse_date(created_at, tag)?,
                user: attributes.get("user").map(str::to_owned),
                uid: attributes.parse_optional("uid").map_err(malformed)?,
            })
        }
    })
}

fn malformed_tag(tag: &Tag<'_>, reason: MarkupError) -> ParseError {
    ParseError::MalformedTag {
        offset: tag.offset(),
        tag: tag.text().to_owned(),
        reason,
    }
}

fn read_meta(attributes: &Attributes<'_>, tag: &Tag<'_>) -> Result<ObjectMeta, ParseError> {
    let malformed = |reason: MarkupError| malformed_tag(tag, reason);
    let timestamp = attributes.require("timestamp").map_err(malformed)?;
    Ok(ObjectMeta {
        id: attributes.parse("id").map_err(malformed)?,
        version: attributes.parse("version").map_err(malformed)?,
        date: parse_date(timestamp, tag)?,
        changeset: attributes.parse("changeset").map_err(malformed)?,
        user: attributes.get("user").map(str::to_owned),
        uid: attributes.parse_optional("uid").map_err(malformed)?,
    })
}

/// Both coordinates or neither; deleted versions carry none.
fn read_location(attributes: &Attributes<'_>) -> Result<Option<Coord<f64>>, MarkupError> {
    let lat = attributes.parse_optional::<f64>("lat")?;
    let lon = attributes.parse_optional::<f64>("lon")?;
    match (lat, lon) {
        (Some(y), Some(x)) => Ok(Some(Coord { x, y })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(MarkupError::MissingAttribute { name: "lon" }),
        (None, Some(_)) => Err(MarkupError::MissingAttribute { name: "lat" }),
    }
}

fn parse_date(value: &str, tag: &Tag<'_>) -> Result<NaiveDate, ParseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|timestamp| timestamp.date())
        .map_err(|_| ParseError::TimestampFormat {
            offset: tag.offset(),
            value: value.to_owned(),
        })
}

fn attach_child(object: &mut DomainObject, markup: &Markup<'_>) -> Result<(), MarkupError> {
    match (markup.kind(), object) {
        (ElementKind::Tag, DomainObject::Node(Node { tags, .. }))
        | (ElementKind::Tag, DomainObject::Way(Way { tags, .. }))
        | (ElementKind::Tag, DomainObject::Relation(Relation { tags, .. })) => {
            let attributes = markup.attributes()?;
            tags.push(TagPair::normalised(
                attributes.require("k")?,
                attributes.require("v")?,
            ));
        }
        (ElementKind::Nd, DomainObject::Way(way)) => {
            way.node_refs.push(markup.attributes()?.parse("ref")?);
        }
        (ElementKind::Member, DomainObject::Relation(relation)) => {
            let attributes = markup.attributes()?;
            let raw_kind = attributes.require("type")?;
            let kind = MemberKind::from_type_attribute(raw_kind).ok_or_else(|| {
                MarkupError::InvalidMemberType {
                    value: raw_kind.to_owned(),
                }
            })?;
            relation.members.push(Member {
                kind,
                id: attributes.parse("ref")?,
            });
        }
        _ => {}
    }
    Ok(())
}

/// Iterator of objects read from a tag scanner.
///
/// # Examples
/// ```
/// use footprint_data::{ObjectReader, TagScanner};
///
/// let corpus = concat!(
///     r#"<way id="10" version="1" timestamp="2010-01-01T00:00:00Z" changeset="9">"#,
///     r#"<nd ref="1"/><nd ref="2"/></way>"#,
/// );
/// let mut reader = ObjectReader::new(TagScanner::new(corpus.as_bytes()));
/// let way = reader.next_object()?.expect("one way");
/// assert_eq!(way.id(), 10);
/// assert!(reader.next_object()?.is_none());
/// # Ok::<(), footprint_data::ParseError>(())
/// ```
#[derive(Debug)]
pub struct ObjectReader<R> {
    scanner: TagScanner<R>,
    assembler: ObjectAssembler,
}

impl<R: Read> ObjectReader<R> {
    /// Assemble objects from `scanner`.
    pub fn new(scanner: TagScanner<R>) -> Self {
        Self {
            scanner,
            assembler: ObjectAssembler::new(),
        }
    }

    /// Underlying scanner, for its counters.
    pub const fn scanner(&self) -> &TagScanner<R> {
        &self.scanner
    }

    /// Next complete object, or `None` at a clean end of stream.
    ///
    /// # Errors
    /// Propagates scan and assembly failures, and reports an object left
    /// open at end of stream as [`ParseError::UnclosedObject`].
    pub fn next_object(&mut self) -> Result<Option<DomainObject>, ParseError> {
        while let Some(tag) = self.scanner.next_tag()? {
            if let Some(object) = self.assembler.feed(&tag)? {
                return Ok(Some(object));
            }
        }
        match self.assembler.open_object() {
            Some((kind, id)) => Err(ParseError::UnclosedObject { kind, id }),
            None => Ok(None),
        }
    }
}

impl<R: Read> Iterator for ObjectReader<R> {
    type Item = Result<DomainObject, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_object().transpose()
    }
}
