// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Union-find over hash-graph nodes.
//!
//! Tracks which nodes of the Othello hash graph are connected by key edges,
//! giving the insert path a fast acyclicity test. Union-find cannot follow
//! deletions, so after a key is removed the two affected components are
//! re-rooted explicitly by graph traversal via [`DisjointSet::assign_root`].

/// Union-find with union-by-assignment and path compression on find.
#[derive(Debug, Clone, Default)]
pub struct DisjointSet {
    parent: Vec<u32>,
}

impl DisjointSet {
    /// Creates a set over `n` singleton nodes.
    pub fn new(n: usize) -> Self {
        let mut set = Self { parent: Vec::new() };
        set.resize(n);
        set
    }

    /// Resizes to `n` nodes; all nodes become singletons.
    pub fn resize(&mut self, n: usize) {
        self.parent.clear();
        self.parent.extend(0..n as u32);
    }

    /// Makes every node a singleton again.
    pub fn reset(&mut self) {
        for (i, p) in self.parent.iter_mut().enumerate() {
            *p = i as u32;
        }
    }

    /// Returns the representative of `node` without mutating the forest.
    pub fn representative(&self, node: u32) -> u32 {
        let mut n = node;
        while self.parent[n as usize] != n {
            n = self.parent[n as usize];
        }
        n
    }

    /// Returns the representative of `node`, compressing the path walked.
    pub fn find(&mut self, node: u32) -> u32 {
        let root = self.representative(node);
        let mut n = node;
        while self.parent[n as usize] != root {
            let next = self.parent[n as usize];
            self.parent[n as usize] = root;
            n = next;
        }
        root
    }

    /// True if `a` and `b` are in the same component.
    pub fn same_set(&self, a: u32, b: u32) -> bool {
        self.representative(a) == self.representative(b)
    }

    /// Merges the components of `a` and `b`. The representative of `a`
    /// survives as the merged root, which keeps roots on the array-A side
    /// when called as `merge(a_node, b_node)` for each inserted edge.
    pub fn merge(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb as usize] = ra;
        }
    }

    /// True if `node` is its own representative.
    pub fn is_root(&self, node: u32) -> bool {
        self.parent[node as usize] == node
    }

    /// Points `node` directly at `root`, used when a component is re-rooted
    /// by traversal after a deletion.
    pub fn assign_root(&mut self, node: u32, root: u32) {
        self.parent[node as usize] = root;
    }

    /// Heap bytes held by the forest.
    pub fn memory_bytes(&self) -> usize {
        self.parent.capacity() * std::mem::size_of::<u32>()
    }
}
