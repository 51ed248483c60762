//! Core domain types for footprint extraction.
//!
//! The corpus is a stream of nodes, ways, relations and changesets. These
//! types describe the transient objects assembled from that stream, the
//! footprint used to select a subset of it, and the membership sets that
//! carry the selection from the first pass to the second.
//!
//! Constructors that can receive invalid input return `Result` so bad bounds
//! surface before any scanning starts.

#![forbid(unsafe_code)]

mod cancel;
mod footprint;
mod membership;
mod object;
mod options;

pub use cancel::CancellationToken;
pub use footprint::{BoundingBox, Footprint, FootprintError, TimeWindow};
pub use membership::MembershipSets;
pub use object::{
    Changeset, DomainObject, Member, MemberKind, Node, ObjectKind, ObjectMeta, Relation,
    TAG_KEY_LIMIT, TAG_VALUE_LIMIT, TagPair, Way,
};
pub use options::{ExtractOptions, RelationMode};
