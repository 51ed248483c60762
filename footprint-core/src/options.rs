//! Options consumed by the two extraction passes.

use crate::Footprint;

/// How relations are admitted during the membership pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum RelationMode {
    /// Relations are never retained.
    Skip,
    /// Every relation inside the time window is retained. Member lists do not
    /// contribute nodes or ways.
    #[default]
    AllInWindow,
    /// A relation is retained when a member node, way, or relation is already
    /// retained at the point the relation is scanned.
    ByMembers,
}

impl RelationMode {
    /// Map the boolean resolve flag onto a mode.
    ///
    /// `resolve = false` skips relations entirely; otherwise `by_members`
    /// selects between the member-based and window-only admission.
    #[must_use]
    pub const fn from_flags(resolve: bool, by_members: bool) -> Self {
        match (resolve, by_members) {
            (false, _) => Self::Skip,
            (true, false) => Self::AllInWindow,
            (true, true) => Self::ByMembers,
        }
    }
}

/// Configuration shared by the membership and extraction passes.
///
/// Builder helpers keep call sites readable when only a few flags differ from
/// the defaults.
///
/// # Examples
/// ```
/// use footprint_core::{ExtractOptions, Footprint, RelationMode};
///
/// let options = ExtractOptions::new(Footprint::default())
///     .with_history(true)
///     .with_changesets(true);
/// assert!(options.history);
/// assert!(options.changesets);
/// assert_eq!(options.relations, RelationMode::AllInWindow);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtractOptions {
    /// Spatial and temporal bounds.
    pub footprint: Footprint,
    /// Retain every matching node version instead of only the highest.
    pub history: bool,
    /// Emit matched changesets in the output.
    pub changesets: bool,
    /// Relation admission policy.
    pub relations: RelationMode,
    /// Log progress counters while scanning.
    pub stats: bool,
}

impl ExtractOptions {
    /// Options for `footprint` with every flag at its default.
    #[must_use]
    pub fn new(footprint: Footprint) -> Self {
        Self {
            footprint,
            ..Self::default()
        }
    }

    /// Toggle history output.
    #[must_use]
    pub const fn with_history(mut self, history: bool) -> Self {
        self.history = history;
        self
    }

    /// Toggle changeset output.
    #[must_use]
    pub const fn with_changesets(mut self, changesets: bool) -> Self {
        self.changesets = changesets;
        self
    }

    /// Select the relation admission policy.
    #[must_use]
    pub const fn with_relations(mut self, relations: RelationMode) -> Self {
        self.relations = relations;
        self
    }

    /// Toggle progress logging.
    #[must_use]
    pub const fn with_stats(mut self, stats: bool) -> Self {
        self.stats = stats;
        self
    }
}
