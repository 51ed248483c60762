//! Behavioural tests for membership set bookkeeping.

use footprint_core::{MembershipSets, ObjectKind};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;

#[fixture]
fn sets() -> RefCell<Option<MembershipSets>> {
    RefCell::new(None)
}

fn with_sets(sets: &RefCell<Option<MembershipSets>>, apply: impl FnOnce(&mut MembershipSets)) {
    let mut guard = sets.borrow_mut();
    let inner = guard.as_mut().expect("sets initialised by a given step");
    apply(inner);
}

#[given("membership sets without history")]
fn given_without_history(#[from(sets)] sets: &RefCell<Option<MembershipSets>>) {
    *sets.borrow_mut() = Some(MembershipSets::new(false));
}

#[given("membership sets with history")]
fn given_with_history(#[from(sets)] sets: &RefCell<Option<MembershipSets>>) {
    *sets.borrow_mut() = Some(MembershipSets::new(true));
}

#[when("node 7 is retained at versions 1, 5 and 2")]
fn when_node_versions(#[from(sets)] sets: &RefCell<Option<MembershipSets>>) {
    with_sets(sets, |inner| {
        inner.retain_node(7, 1, 100);
        inner.retain_node(7, 5, 101);
        inner.retain_node(7, 2, 102);
    });
}

#[when("a way and a relation are retained with changesets 30 and 40")]
fn when_way_and_relation(#[from(sets)] sets: &RefCell<Option<MembershipSets>>) {
    with_sets(sets, |inner| {
        inner.retain_way(3, 30);
        inner.retain_relation(4, 40);
    });
}

#[then("only version 5 of node 7 is kept")]
fn then_highest_only(#[from(sets)] sets: &RefCell<Option<MembershipSets>>) {
    let guard = sets.borrow();
    let inner = guard.as_ref().expect("sets initialised");
    assert!(inner.keeps_node_version(7, 5));
    assert!(!inner.keeps_node_version(7, 1));
    assert!(!inner.keeps_node_version(7, 2));
}

#[then("every version of node 7 is kept")]
fn then_every_version(#[from(sets)] sets: &RefCell<Option<MembershipSets>>) {
    let guard = sets.borrow();
    let inner = guard.as_ref().expect("sets initialised");
    for version in [1, 2, 5] {
        assert!(inner.keeps_node_version(7, version), "version {version}");
    }
}

#[then("changesets 30 and 40 are members")]
fn then_changesets(#[from(sets)] sets: &RefCell<Option<MembershipSets>>) {
    let guard = sets.borrow();
    let inner = guard.as_ref().expect("sets initialised");
    assert!(inner.contains(ObjectKind::Changeset, 30));
    assert!(inner.contains(ObjectKind::Changeset, 40));
    assert_eq!(inner.len(ObjectKind::Changeset), 2);
}

#[scenario(path = "tests/features/membership.feature", index = 0)]
fn highest_version_only(sets: RefCell<Option<MembershipSets>>) {
    let _ = (sets,);
}

#[scenario(path = "tests/features/membership.feature", index = 1)]
fn history_keeps_all(sets: RefCell<Option<MembershipSets>>) {
    let _ = (sets,);
}

#[scenario(path = "tests/features/membership.feature", index = 2)]
fn changesets_follow_objects(sets: RefCell<Option<MembershipSets>>) {
    let _ = (sets,);
}
