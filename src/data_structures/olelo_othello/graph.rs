// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Hash-graph adjacency for the Othello construction.
//!
//! The graph has `ma + mb` nodes (array A then array B) and one edge per
//! live key, connecting the key's two hash-derived endpoints. Multiple keys
//! sharing a node are chained in intrusive linked lists: `head[node]` holds
//! the first incident key id, and `next_at_a`/`next_at_b` continue the chain
//! through the key's A-side or B-side endpoint respectively.
//!
//! Endpoints are cached per key by the control plane and passed into the
//! traversal, so walking a tree never re-hashes keys.

/// No-entry marker for the intrusive lists.
const NIL: i32 = -1;

/// Intrusive adjacency lists over the Othello hash graph.
#[derive(Debug, Clone, Default)]
pub(crate) struct HashGraph {
    /// Nodes below `split` belong to array A.
    split: u32,
    /// Node index to first incident key id.
    head: Vec<i32>,
    /// Key id to next key sharing the same A-side node.
    next_at_a: Vec<i32>,
    /// Key id to next key sharing the same B-side node.
    next_at_b: Vec<i32>,
}

impl HashGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resizes to `nodes` nodes with array A occupying `[0, split)`.
    /// All adjacency is discarded.
    pub fn resize_nodes(&mut self, nodes: usize, split: u32) {
        self.split = split;
        self.head.resize(nodes, NIL);
        self.reset();
    }

    /// Clears all adjacency without changing node count.
    pub fn reset(&mut self) {
        self.head.iter_mut().for_each(|h| *h = NIL);
        self.next_at_a.iter_mut().for_each(|n| *n = NIL);
        self.next_at_b.iter_mut().for_each(|n| *n = NIL);
    }

    /// Splices the edge of key `key` with endpoints `(a, b)` into both
    /// endpoint lists.
    pub fn add_edge(&mut self, key: u32, a: u32, b: u32) {
        let key = key as usize;
        if self.next_at_a.len() <= key {
            self.next_at_a.resize(key + 1, NIL);
            self.next_at_b.resize(key + 1, NIL);
        }
        self.next_at_a[key] = self.head[a as usize];
        self.head[a as usize] = key as i32;
        self.next_at_b[key] = self.head[b as usize];
        self.head[b as usize] = key as i32;
    }

    /// Unsplices the edge of key `key` from both endpoint lists.
    pub fn remove_edge(&mut self, key: u32, a: u32, b: u32) {
        Self::unsplice(&mut self.head, &mut self.next_at_a, a, key as i32);
        Self::unsplice(&mut self.head, &mut self.next_at_b, b, key as i32);
    }

    fn unsplice(head: &mut [i32], next: &mut [i32], node: u32, key: i32) {
        if head[node as usize] == key {
            head[node as usize] = next[key as usize];
        } else {
            let mut t = head[node as usize];
            while next[t as usize] != key {
                t = next[t as usize];
            }
            next[t as usize] = next[key as usize];
        }
    }

    /// Rewrites list entries after the key at dense index `old_id` moved to
    /// `new_id` (swap-with-last deletion). `(a, b)` are the moved key's
    /// endpoints; the old id must still be linked in both lists.
    pub fn relink_moved_key(&mut self, old_id: u32, new_id: u32, a: u32, b: u32) {
        Self::relink(&mut self.head, &mut self.next_at_a, a, old_id, new_id);
        Self::relink(&mut self.head, &mut self.next_at_b, b, old_id, new_id);
    }

    fn relink(head: &mut [i32], next: &mut [i32], node: u32, old_id: u32, new_id: u32) {
        next[new_id as usize] = next[old_id as usize];
        if head[node as usize] == old_id as i32 {
            head[node as usize] = new_id as i32;
        } else {
            let mut t = head[node as usize];
            while next[t as usize] != old_id as i32 {
                t = next[t as usize];
            }
            next[t as usize] = new_id as i32;
        }
    }

    /// True if `node` has no incident keys.
    pub fn is_isolated(&self, node: u32) -> bool {
        self.head[node as usize] == NIL
    }

    /// Walks the tree reachable from `start` without crossing back over
    /// `prev_key`, invoking `visit(key, from, to)` once per traversed edge.
    ///
    /// The graph must be acyclic from `start` or the walk will not
    /// terminate; the control plane guarantees this by construction.
    pub fn walk_tree<F>(&self, prev_key: i32, start: u32, endpoints: &[(u32, u32)], mut visit: F)
    where
        F: FnMut(u32, u32, u32),
    {
        let mut stack = vec![(prev_key, start)];
        while let Some((prev, nid)) = stack.pop() {
            let next = if nid < self.split {
                &self.next_at_a
            } else {
                &self.next_at_b
            };
            let mut key = self.head[nid as usize];
            while key >= 0 {
                if key != prev {
                    let (ea, eb) = endpoints[key as usize];
                    let to = if nid < self.split { eb } else { ea };
                    visit(key as u32, nid, to);
                    stack.push((key, to));
                }
                key = next[key as usize];
            }
        }
    }

    /// Heap bytes held by the adjacency arrays.
    pub fn memory_bytes(&self) -> usize {
        (self.head.capacity() + self.next_at_a.capacity() + self.next_at_b.capacity())
            * std::mem::size_of::<i32>()
    }
}
