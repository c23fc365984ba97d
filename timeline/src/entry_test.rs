use std::collections::HashSet;

use super::*;

fn entry(id: EntryId, parent: Option<EntryId>) -> Entry {
    Entry::new(id, parent, &format!("e{id}"))
}

fn spanning(id: EntryId, start: i64, end: i64) -> Entry {
    Entry { start, end, ..entry(id, None) }
}

#[test]
fn unresolved_parent_is_root() {
    let tree = EntryTree::build(vec![entry(1, None), entry(2, Some(1)), entry(3, Some(99))]);
    assert!(tree.is_root(1));
    assert!(!tree.is_root(2));
    assert!(tree.is_root(3));
    assert_eq!(tree.roots(), &[1, 3]);
}

#[test]
fn every_entry_with_unknown_parent_is_root() {
    let entries = (0..20)
        .map(|i| entry(i, if i % 3 == 0 { Some(1_000 + i) } else { Some(i - 1) }))
        .collect::<Vec<_>>();
    let tree = EntryTree::build(entries.clone());
    let ids = entries.iter().map(|e| e.id).collect::<HashSet<_>>();
    for e in &entries {
        let resolvable = e.parent_id.is_some_and(|p| ids.contains(&p));
        assert_eq!(tree.is_root(e.id), !resolvable, "entry {}", e.id);
    }
}

#[test]
fn raw_minus_one_parent_becomes_none() {
    let raw = wire::RawEntry {
        id: 4,
        parent_id: -1,
        labels: vec!["cpu".to_owned()],
        style: None,
        start: 0,
        end: 10,
        has_data: true,
    };
    let entry = Entry::from(raw);
    assert_eq!(entry.parent_id, None);
    assert_eq!(entry.name(), "cpu");
}

#[test]
fn children_keep_input_order() {
    let tree = EntryTree::build(vec![entry(1, None), entry(3, Some(1)), entry(2, Some(1))]);
    assert_eq!(tree.children(1), &[3, 2]);
    assert!(tree.children(3).is_empty());
}

#[test]
fn depth_counts_ancestors() {
    let tree = EntryTree::build(vec![entry(1, None), entry(2, Some(1)), entry(3, Some(2))]);
    assert_eq!(tree.depth(1), 0);
    assert_eq!(tree.depth(3), 2);
    assert_eq!(tree.depth(42), 0);
}

#[test]
fn flatten_is_depth_first_preorder() {
    let tree = EntryTree::build(vec![
        entry(1, None),
        entry(2, Some(1)),
        entry(3, Some(2)),
        entry(4, Some(1)),
        entry(5, None),
    ]);
    assert_eq!(tree.flatten(&HashSet::new()), vec![1, 2, 3, 4, 5]);
}

#[test]
fn flatten_skips_collapsed_descendants() {
    let tree = EntryTree::build(vec![entry(1, None), entry(2, Some(1)), entry(3, Some(2)), entry(4, Some(1))]);
    let collapsed = HashSet::from([2]);
    assert_eq!(tree.flatten(&collapsed), vec![1, 2, 4]);
}

#[test]
fn cycle_is_broken_and_every_entry_listed_once() {
    let tree = EntryTree::build(vec![entry(1, Some(2)), entry(2, Some(1)), entry(3, None)]);
    let flat = tree.flatten(&HashSet::new());
    assert_eq!(flat.len(), 3);
    assert!(tree.is_root(1));
    assert_eq!(flat, vec![3, 1, 2]);
}

#[test]
fn self_parent_is_root() {
    let tree = EntryTree::build(vec![entry(7, Some(7))]);
    assert!(tree.is_root(7));
}

#[test]
fn duplicate_ids_keep_first() {
    let tree = EntryTree::build(vec![Entry::new(1, None, "first"), Entry::new(1, None, "second")]);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.get(1).map(Entry::name), Some("first"));
}

#[test]
fn time_bounds_span_all_entries() {
    let tree = EntryTree::build(vec![spanning(1, 100, 200), spanning(2, 50, 150)]);
    assert_eq!(tree.time_bounds(), Some((50, 200)));
    assert_eq!(EntryTree::default().time_bounds(), None);
}
