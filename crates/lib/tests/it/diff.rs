//! Tests for the diff engine: decision rules, minimality, apply, and the
//! modifier helpers.

use serde_json::json;
use treepatch::KeyPath;
use treepatch::diff::{
    DiffOptions, Modifier, apply, diff, forward_diff, modifier_to_tree, scope_modifier,
    tree_to_modifier,
};
use treepatch::tree::Value;

use super::helpers::{make_a, make_b, make_nested, make_nested_changed, tree, val};

fn diff_default(
    previous: &treepatch::Node,
    next: &treepatch::Node,
) -> Option<Modifier> {
    diff(previous, next, &DiffOptions::default())
}

#[test]
fn test_identical_trees_produce_no_modifier() {
    let a = make_a();
    assert_eq!(diff_default(&a, &a.clone()), None);
}

#[test]
fn test_simple_set_and_unset() {
    let modifier = diff_default(&make_a(), &make_b()).unwrap();

    assert_eq!(modifier.set.len(), 1);
    assert_eq!(
        modifier.set.get(&KeyPath::from("e")),
        Some(&Value::from("f"))
    );
    assert!(modifier.unset.contains(&KeyPath::from("a")));
    assert_eq!(modifier.unset.len(), 1);
}

#[test]
fn test_forward_diff_never_unsets() {
    let forward = forward_diff(&make_a(), &make_b(), &DiffOptions::default()).unwrap();
    assert!(forward.unset.is_empty());
    assert_eq!(
        forward.set.get(&KeyPath::from("e")),
        Some(&Value::from("f"))
    );

    // Pure removals are invisible to the forward direction.
    let only_removed = tree(json!({ "c": "d" }));
    assert_eq!(
        forward_diff(&make_a(), &only_removed, &DiffOptions::default()),
        None
    );
}

#[test]
fn test_apply_round_trips_the_diff() {
    let previous = make_nested();
    let next = make_nested_changed();

    let modifier = diff_default(&previous, &next).unwrap();
    let mut patched = previous.clone();
    apply(&mut patched, &modifier).unwrap();
    assert_eq!(patched, next);

    // Idempotence: once applied, nothing is left to diff.
    assert_eq!(diff_default(&patched, &next), None);
}

#[test]
fn test_nested_changes_use_leaf_paths() {
    let modifier = diff_default(&make_nested(), &make_nested_changed()).unwrap();

    // Only the changed leaf is set, not its whole branch.
    assert_eq!(
        modifier.set.get(&KeyPath::from("meta.limits.cpu")),
        Some(&Value::Int(4))
    );
    assert!(!modifier.set.contains_key(&KeyPath::from("meta.owner")));
    assert!(modifier.unset.contains(&KeyPath::from("meta.limits.mem")));
    // The removed branch is unset once, at its root.
    assert!(modifier.unset.contains(&KeyPath::from("meta.flags")));
    assert!(!modifier.unset.contains(&KeyPath::from("meta.flags.debug")));
}

#[test]
fn test_numeric_zero_is_set_not_unset() {
    let previous = tree(json!({ "count": 3 }));
    let next = tree(json!({ "count": 0 }));

    let modifier = diff_default(&previous, &next).unwrap();
    assert_eq!(modifier.set.get(&KeyPath::from("count")), Some(&Value::Int(0)));
    assert!(modifier.unset.is_empty());
}

#[test]
fn test_falsy_scalars_become_unsets() {
    let previous = tree(json!({ "enabled": true, "name": "x" }));
    let next = tree(json!({ "enabled": false, "name": "" }));

    let modifier = diff_default(&previous, &next).unwrap();
    assert!(modifier.set.is_empty());
    assert!(modifier.unset.contains(&KeyPath::from("enabled")));
    assert!(modifier.unset.contains(&KeyPath::from("name")));
}

#[test]
fn test_lists_replace_wholesale() {
    let previous = tree(json!({ "tags": ["a", "b", "c"] }));
    let next = tree(json!({ "tags": ["a", "z", "c"] }));

    let modifier = diff_default(&previous, &next).unwrap();
    assert_eq!(
        modifier.set.get(&KeyPath::from("tags")),
        Some(&val(json!(["a", "z", "c"])))
    );
    // No element-wise paths.
    assert!(!modifier.set.contains_key(&KeyPath::from("tags.1")));
}

#[test]
fn test_emptied_containers_are_unset() {
    let previous = tree(json!({ "tags": ["a"], "meta": { "k": 1 } }));
    let next = tree(json!({ "tags": [], "meta": {} }));

    let modifier = diff_default(&previous, &next).unwrap();
    assert!(modifier.unset.contains(&KeyPath::from("tags")));
    assert!(modifier.unset.contains(&KeyPath::from("meta")));

    // Unsets win over the accompanying empty-container sets on apply:
    // "emptying" a container removes it.
    let mut patched = previous.clone();
    apply(&mut patched, &modifier).unwrap();
    assert!(patched.is_empty());
}

#[test]
fn test_descendant_unsets_are_pruned() {
    let previous = tree(json!({ "a": { "b": { "c": 1 }, "d": 2 } }));
    let next = tree(json!({ "x": 1 }));

    let modifier = diff_default(&previous, &next).unwrap();
    // One unset at the branch root covers everything underneath.
    assert_eq!(modifier.unset.len(), 1);
    assert!(modifier.unset.contains(&KeyPath::from("a")));
}

#[test]
fn test_ignored_paths_cover_descendants() {
    let previous = tree(json!({ "a": { "b": 1 }, "c": 1 }));
    let next = tree(json!({ "a": { "b": 2 }, "c": 2 }));

    let options = DiffOptions {
        ignored: vec![KeyPath::from("a")],
        ..Default::default()
    };
    let modifier = diff(&previous, &next, &options).unwrap();
    assert_eq!(modifier.len(), 1);
    assert_eq!(modifier.set.get(&KeyPath::from("c")), Some(&Value::Int(2)));
}

#[test]
fn test_prune_empty_collapses_orphaned_containers() {
    // Removing the only child of `wrap.inner` leaves empty maps behind;
    // prune_empty folds the cleanup into the modifier itself.
    let previous = tree(json!({ "wrap": { "inner": { "flag": true } }, "keep": 1 }));
    let next = tree(json!({ "wrap": { "inner": { "flag": false } }, "keep": 1 }));

    let naive = diff_default(&previous, &next).unwrap();
    assert!(naive.unset.contains(&KeyPath::from("wrap.inner.flag")));

    let options = DiffOptions {
        prune_empty: true,
        ..Default::default()
    };
    let pruned = diff(&previous, &next, &options).unwrap();
    assert!(pruned.unset.contains(&KeyPath::from("wrap")));
    assert!(!pruned.unset.contains(&KeyPath::from("wrap.inner.flag")));
}

#[test]
fn test_time_diffs_by_instant() {
    use chrono::{DateTime, Utc};

    let instant = |millis: i64| Value::Time(DateTime::<Utc>::from_timestamp_millis(millis).unwrap());

    let mut previous = treepatch::Node::new();
    previous.set("at", instant(1_000));
    let mut next = treepatch::Node::new();
    next.set("at", instant(2_000));

    let modifier = diff_default(&previous, &next).unwrap();
    assert_eq!(modifier.set.get(&KeyPath::from("at")), Some(&instant(2_000)));

    // The epoch instant counts as absent: arriving at it unsets the path
    // (the accompanying set is skipped on apply, epoch dates are falsy),
    // and starting from it with nothing after is no change at all.
    let mut epoch = treepatch::Node::new();
    epoch.set("at", instant(0));
    let modifier = diff_default(&previous, &epoch).unwrap();
    assert!(modifier.unset.contains(&KeyPath::from("at")));
    let mut patched = previous.clone();
    apply(&mut patched, &modifier).unwrap();
    assert!(patched.get("at").is_none());

    let fresh = diff_default(&treepatch::Node::new(), &epoch);
    assert_eq!(fresh, None);
}

#[test]
fn test_tree_to_modifier_is_diff_from_nothing() {
    let modifier = tree_to_modifier(&make_a()).unwrap();
    assert!(modifier.unset.is_empty());
    assert_eq!(modifier.set.len(), 2);
    assert_eq!(
        modifier.set.get(&KeyPath::from("a")),
        Some(&Value::from("b"))
    );

    assert_eq!(tree_to_modifier(&treepatch::Node::new()), None);
}

#[test]
fn test_modifier_to_tree_materializes_unsets_as_null() {
    let modifier = diff_default(&make_a(), &make_b()).unwrap();
    let materialized = modifier_to_tree(&modifier).unwrap();

    assert_eq!(materialized.get("e"), Some(&Value::from("f")));
    assert_eq!(materialized.get("a"), Some(&Value::Null));
}

#[test]
fn test_scope_modifier_reroots_paths() {
    let modifier = diff_default(&make_a(), &make_b()).unwrap();
    let scoped = scope_modifier(&modifier, "nested.doc");

    assert_eq!(
        scoped.set.get(&KeyPath::from("nested.doc.e")),
        Some(&Value::from("f"))
    );
    assert!(scoped.unset.contains(&KeyPath::from("nested.doc.a")));
    assert_eq!(scoped.len(), modifier.len());
}

#[test]
fn test_apply_skips_falsy_sets() {
    // A hand-built modifier may carry falsy sets; apply treats them the
    // way the set decision does and skips them (numbers excepted).
    let mut modifier = Modifier::default();
    modifier.set.insert(KeyPath::from("off"), Value::Bool(false));
    modifier.set.insert(KeyPath::from("zero"), Value::Int(0));

    let mut target = treepatch::Node::new();
    apply(&mut target, &modifier).unwrap();
    assert!(target.get("off").is_none());
    assert_eq!(target.get("zero"), Some(&Value::Int(0)));
}
