//! Entry forest built from an output's tree model.
//!
//! DESIGN
//! ======
//! Entries arrive as a flat list with parent ids. An entry whose parent does
//! not resolve to a known entry is a root. Parent links that form a cycle are
//! broken at the first entry (in input order) that is not reachable from any
//! root; that entry is promoted to a root so every entry appears exactly once
//! in [`EntryTree::flatten`].

#[cfg(test)]
#[path = "entry_test.rs"]
mod entry_test;

use std::collections::{HashMap, HashSet};

use wire::{ElementStyle, RawEntry};

/// Numeric entry identity, stable across fetches.
pub type EntryId = i64;

/// A named row identity in the analysis result (a thread, a CPU, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: EntryId,
    /// `None` for entries the server reports as roots.
    pub parent_id: Option<EntryId>,
    pub labels: Vec<String>,
    pub style: Option<ElementStyle>,
    /// Absolute start of the entry's data.
    pub start: i64,
    /// Absolute end of the entry's data.
    pub end: i64,
    pub has_data: bool,
}

impl Entry {
    /// A bare entry, mostly useful for tests and fixtures.
    #[must_use]
    pub fn new(id: EntryId, parent_id: Option<EntryId>, label: &str) -> Self {
        Self {
            id,
            parent_id,
            labels: vec![label.to_owned()],
            style: None,
            start: 0,
            end: 0,
            has_data: true,
        }
    }

    /// The first label, or an empty string.
    #[must_use]
    pub fn name(&self) -> &str {
        self.labels.first().map_or("", String::as_str)
    }
}

impl From<RawEntry> for Entry {
    fn from(raw: RawEntry) -> Self {
        Self {
            id: raw.id,
            parent_id: (raw.parent_id >= 0).then_some(raw.parent_id),
            labels: raw.labels,
            style: raw.style,
            start: raw.start,
            end: raw.end,
            has_data: raw.has_data,
        }
    }
}

/// Indexed forest of entries.
#[derive(Debug, Clone, Default)]
pub struct EntryTree {
    entries: Vec<Entry>,
    index: HashMap<EntryId, usize>,
    children: HashMap<EntryId, Vec<EntryId>>,
    roots: Vec<EntryId>,
}

impl EntryTree {
    /// Build the forest. Duplicate ids keep their first occurrence.
    #[must_use]
    pub fn build(entries: Vec<Entry>) -> Self {
        let mut unique = Vec::with_capacity(entries.len());
        let mut index = HashMap::<EntryId, usize>::new();
        for entry in entries {
            if index.contains_key(&entry.id) {
                continue;
            }
            index.insert(entry.id, unique.len());
            unique.push(entry);
        }

        let mut children = HashMap::<EntryId, Vec<EntryId>>::new();
        let mut roots = Vec::new();
        for entry in &unique {
            match entry.parent_id {
                Some(parent) if parent != entry.id && index.contains_key(&parent) => {
                    children.entry(parent).or_default().push(entry.id);
                }
                _ => roots.push(entry.id),
            }
        }

        let mut tree = Self { entries: unique, index, children, roots };
        tree.break_cycles();
        tree
    }

    fn break_cycles(&mut self) {
        let mut reached = HashSet::<EntryId>::new();
        let mut pending = self.roots.clone();
        self.mark_reachable(&mut pending, &mut reached);

        let order = self.entries.iter().map(|e| (e.id, e.parent_id)).collect::<Vec<_>>();
        for (id, parent) in order {
            if reached.contains(&id) {
                continue;
            }
            if let Some(parent) = parent
                && let Some(siblings) = self.children.get_mut(&parent)
            {
                siblings.retain(|child| *child != id);
            }
            self.roots.push(id);
            let mut pending = vec![id];
            self.mark_reachable(&mut pending, &mut reached);
        }
    }

    fn mark_reachable(&self, pending: &mut Vec<EntryId>, reached: &mut HashSet<EntryId>) {
        while let Some(id) = pending.pop() {
            if reached.insert(id) {
                pending.extend(self.children(id).iter().copied());
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the order the server returned them.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.index.get(&id).map(|&i| &self.entries[i])
    }

    #[must_use]
    pub fn roots(&self) -> &[EntryId] {
        &self.roots
    }

    #[must_use]
    pub fn is_root(&self, id: EntryId) -> bool {
        self.roots.contains(&id)
    }

    #[must_use]
    pub fn children(&self, id: EntryId) -> &[EntryId] {
        self.children.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Number of ancestors between `id` and its root. Unknown ids have depth 0.
    #[must_use]
    pub fn depth(&self, id: EntryId) -> usize {
        let mut depth = 0usize;
        let mut current = id;
        let mut seen = HashSet::<EntryId>::new();

        while !self.is_root(current) {
            let Some(parent) = self.get(current).and_then(|e| e.parent_id) else {
                break;
            };
            if !seen.insert(parent) {
                break;
            }
            depth += 1;
            current = parent;
        }

        depth
    }

    /// Depth-first preorder of entry ids, skipping the descendants of
    /// `collapsed` entries. This is the row order of the time graph.
    #[must_use]
    pub fn flatten(&self, collapsed: &HashSet<EntryId>) -> Vec<EntryId> {
        let mut out = Vec::with_capacity(self.entries.len());
        let mut stack = self.roots.iter().rev().copied().collect::<Vec<_>>();
        let mut seen = HashSet::<EntryId>::new();

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            out.push(id);
            if !collapsed.contains(&id) {
                stack.extend(self.children(id).iter().rev().copied());
            }
        }

        out
    }

    /// Absolute `(min start, max end)` over all entries.
    #[must_use]
    pub fn time_bounds(&self) -> Option<(i64, i64)> {
        let start = self.entries.iter().map(|e| e.start).min()?;
        let end = self.entries.iter().map(|e| e.end).max()?;
        Some((start, end))
    }
}
