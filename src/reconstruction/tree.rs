//! Parent-pointer forest over one session's records.
//!
//! Records reference their parent by id. The forest keeps an explicit adjacency map
//! from parent index to child indices, built once, and walks it with an explicit
//! stack so that deep conversations cannot overflow the call stack.

use std::collections::{HashMap, HashSet};

use crate::model::LogRecord;

/// Adjacency view over a slice of records.
#[derive(Debug)]
pub struct RecordForest<'a> {
    records: &'a [LogRecord],
    /// Parent index per record; `None` for roots and dangling references.
    parents: Vec<Option<usize>>,
    /// Child indices per record, in input order.
    children: Vec<Vec<usize>>,
}

impl<'a> RecordForest<'a> {
    /// Build the forest. When ids repeat, the first record with an id wins as a parent.
    #[must_use]
    pub fn new(records: &'a [LogRecord]) -> Self {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            index.entry(record.id.as_str()).or_insert(i);
        }

        let mut parents = vec![None; records.len()];
        let mut children = vec![Vec::new(); records.len()];
        for (i, record) in records.iter().enumerate() {
            let Some(parent_id) = record.parent() else {
                continue;
            };
            match index.get(parent_id) {
                Some(&p) if p != i => {
                    parents[i] = Some(p);
                    children[p].push(i);
                }
                _ => {}
            }
        }

        Self {
            records,
            parents,
            children,
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the forest is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get a record by index.
    #[must_use]
    pub fn record(&self, idx: usize) -> &'a LogRecord {
        &self.records[idx]
    }

    /// Parent index of a record.
    #[must_use]
    pub fn parent_of(&self, idx: usize) -> Option<usize> {
        self.parents.get(idx).copied().flatten()
    }

    /// Child indices of a record.
    #[must_use]
    pub fn children_of(&self, idx: usize) -> &[usize] {
        self.children.get(idx).map_or(&[], Vec::as_slice)
    }

    /// Walk parent links to the root.
    ///
    /// Stops at a record without a resolvable parent, or at the last record before
    /// a link would revisit one already seen on this walk.
    #[must_use]
    pub fn root_of(&self, idx: usize) -> usize {
        let mut seen = HashSet::new();
        let mut current = idx;
        seen.insert(current);
        while let Some(parent) = self.parent_of(current) {
            if !seen.insert(parent) {
                break;
            }
            current = parent;
        }
        current
    }

    /// Depth-first traversal from `root`.
    #[must_use]
    pub fn depth_first(&self, root: usize) -> DepthFirstIterator<'_, 'a> {
        DepthFirstIterator::new(self, root)
    }

    /// Indices in chronological order, ties keeping input order.
    #[must_use]
    pub fn chronological(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.records.len()).collect();
        order.sort_by_key(|&i| self.records[i].timestamp);
        order
    }

    /// Partition the records into threads.
    ///
    /// For each unvisited record, in chronological order, the thread is every
    /// not-yet-visited record reachable from its root. Each thread is sorted
    /// chronologically and threads are ordered by their first record's timestamp.
    /// Every record lands in exactly one thread.
    #[must_use]
    pub fn threads(&self) -> Vec<Vec<usize>> {
        let mut visited = vec![false; self.records.len()];
        let mut threads = Vec::new();

        for idx in self.chronological() {
            if visited[idx] {
                continue;
            }
            let root = self.root_of(idx);
            let start = if visited[root] { idx } else { root };

            let mut thread: Vec<usize> = self
                .depth_first(start)
                .filter(|&i| {
                    if visited[i] {
                        false
                    } else {
                        visited[i] = true;
                        true
                    }
                })
                .collect();

            thread.sort_by_key(|&i| self.records[i].timestamp);
            threads.push(thread);
        }

        threads.sort_by_key(|thread| thread.first().map(|&i| self.records[i].timestamp));
        threads
    }
}

/// Iterator over record indices in depth-first order.
///
/// Each index is yielded at most once, even when parent links form a cycle.
pub struct DepthFirstIterator<'f, 'a> {
    forest: &'f RecordForest<'a>,
    stack: Vec<usize>,
    seen: HashSet<usize>,
}

impl<'f, 'a> DepthFirstIterator<'f, 'a> {
    /// Create a new depth-first iterator.
    #[must_use]
    pub fn new(forest: &'f RecordForest<'a>, root: usize) -> Self {
        let stack = if root < forest.len() { vec![root] } else { Vec::new() };
        Self {
            forest,
            stack,
            seen: HashSet::new(),
        }
    }
}

impl Iterator for DepthFirstIterator<'_, '_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(idx) = self.stack.pop() {
            if !self.seen.insert(idx) {
                continue;
            }
            // Reverse so children come out in input order.
            for &child in self.forest.children_of(idx).iter().rev() {
                if !self.seen.contains(&child) {
                    self.stack.push(child);
                }
            }
            return Some(idx);
        }
        None
    }
}
