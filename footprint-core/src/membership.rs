//! Per-kind membership sets built by the first pass.

use std::collections::{HashMap, HashSet};

use crate::ObjectKind;

/// Ids retained for each object kind, plus the optional node version index.
///
/// Built once during the membership pass and read-only afterwards. Memory is
/// proportional to the retained subset, not to the corpus.
///
/// # Examples
/// ```
/// use footprint_core::MembershipSets;
///
/// let mut sets = MembershipSets::new(false);
/// sets.retain_node(1, 2, 100);
/// sets.retain_node(1, 5, 101);
/// sets.retain_node(1, 3, 102);
/// assert!(sets.keeps_node_version(1, 5));
/// assert!(!sets.keeps_node_version(1, 3));
/// assert!(sets.contains(footprint_core::ObjectKind::Changeset, 102));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSets {
    nodes: HashSet<i64>,
    ways: HashSet<i64>,
    relations: HashSet<i64>,
    changesets: HashSet<i64>,
    node_versions: Option<HashMap<i64, u64>>,
}

impl MembershipSets {
    /// Empty sets. The version index exists only when `history` is off.
    #[must_use]
    pub fn new(history: bool) -> Self {
        Self {
            node_versions: (!history).then(HashMap::new),
            ..Self::default()
        }
    }

    /// Whether every node version is retained.
    #[must_use]
    pub const fn is_history(&self) -> bool {
        self.node_versions.is_none()
    }

    /// Record a retained node version and its changeset.
    pub fn retain_node(&mut self, id: i64, version: u64, changeset: i64) {
        self.nodes.insert(id);
        self.changesets.insert(changeset);
        if let Some(index) = self.node_versions.as_mut() {
            index
                .entry(id)
                .and_modify(|highest| *highest = (*highest).max(version))
                .or_insert(version);
        }
    }

    /// Record a retained way and its changeset.
    pub fn retain_way(&mut self, id: i64, changeset: i64) {
        self.ways.insert(id);
        self.changesets.insert(changeset);
    }

    /// Record a retained relation and its changeset.
    pub fn retain_relation(&mut self, id: i64, changeset: i64) {
        self.relations.insert(id);
        self.changesets.insert(changeset);
    }

    /// Whether `id` is retained for `kind`.
    #[must_use]
    pub fn contains(&self, kind: ObjectKind, id: i64) -> bool {
        self.set(kind).contains(&id)
    }

    /// Highest retained version of a node, when the index is kept.
    #[must_use]
    pub fn node_version(&self, id: i64) -> Option<u64> {
        self.node_versions
            .as_ref()
            .and_then(|index| index.get(&id).copied())
    }

    /// Whether this particular version of a node belongs in the output.
    ///
    /// In history mode any version of a retained node qualifies; otherwise
    /// only the highest recorded version does.
    #[must_use]
    pub fn keeps_node_version(&self, id: i64, version: u64) -> bool {
        if !self.nodes.contains(&id) {
            return false;
        }
        match self.node_versions.as_ref() {
            None => true,
            Some(index) => index.get(&id) == Some(&version),
        }
    }

    /// Number of retained ids for `kind`.
    #[must_use]
    pub fn len(&self, kind: ObjectKind) -> usize {
        self.set(kind).len()
    }

    /// Whether nothing at all was retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        ObjectKind::ALL.iter().all(|kind| self.set(*kind).is_empty())
    }

    /// Retained ids for `kind`.
    #[must_use]
    pub const fn set(&self, kind: ObjectKind) -> &HashSet<i64> {
        match kind {
            ObjectKind::Node => &self.nodes,
            ObjectKind::Way => &self.ways,
            ObjectKind::Relation => &self.relations,
            ObjectKind::Changeset => &self.changesets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn index_keeps_the_highest_version() {
        let mut sets = MembershipSets::new(false);
        for version in [1, 5, 2] {
            sets.retain_node(7, version, 10 + i64::try_from(version).unwrap_or_default());
        }
        assert_eq!(sets.node_version(7), Some(5));
        assert!(sets.keeps_node_version(7, 5));
        assert!(!sets.keeps_node_version(7, 1));
        assert!(!sets.keeps_node_version(7, 2));
        assert_eq!(sets.len(ObjectKind::Changeset), 3);
    }

    #[rstest]
    fn history_mode_keeps_every_version() {
        let mut sets = MembershipSets::new(true);
        sets.retain_node(7, 1, 10);
        assert!(sets.is_history());
        assert_eq!(sets.node_version(7), None);
        assert!(sets.keeps_node_version(7, 1));
        assert!(sets.keeps_node_version(7, 99));
        assert!(!sets.keeps_node_version(8, 1));
    }

    #[rstest]
    fn ways_and_relations_record_changesets() {
        let mut sets = MembershipSets::new(false);
        sets.retain_way(3, 30);
        sets.retain_relation(4, 40);
        assert!(sets.contains(ObjectKind::Way, 3));
        assert!(sets.contains(ObjectKind::Relation, 4));
        assert!(sets.contains(ObjectKind::Changeset, 30));
        assert!(sets.contains(ObjectKind::Changeset, 40));
        assert!(!sets.contains(ObjectKind::Node, 3));
    }

    #[rstest]
    fn fresh_sets_are_empty() {
        let sets = MembershipSets::new(false);
        assert!(sets.is_empty());
        assert!(!sets.is_history());
    }
}
