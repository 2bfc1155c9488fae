//! Extractor dependency graph.
//!
//! Nodes live in an arena (`Vec<Node>`) and refer to each other by index; an
//! id -> index map handles lookups. Edges point from a dependent to the
//! extractors it consumes.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::ExtractorId;
use crate::error::ConfigError;
use crate::registry::Registry;

#[derive(Debug, Clone)]
struct Node {
    id: ExtractorId,
    /// Tie-break key (registration position).
    rank: usize,
    deps: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    index: BTreeMap<ExtractorId, usize>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `id` if absent; returns its node index.
    pub fn add_node(&mut self, id: ExtractorId, rank: usize) -> usize {
        if let Some(&i) = self.index.get(&id) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(Node {
            id,
            rank,
            deps: Vec::new(),
        });
        self.index.insert(id, i);
        i
    }

    /// Record that `dependent` consumes the outputs of `dependency`.
    pub fn add_edge(&mut self, dependent: usize, dependency: usize) {
        let deps = &mut self.nodes[dependent].deps;
        if !deps.contains(&dependency) {
            deps.push(dependency);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ExtractorId) -> bool {
        self.index.contains_key(&id)
    }

    /// Every node id, in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = ExtractorId> + '_ {
        self.nodes.iter().map(|n| n.id)
    }

    /// Kahn's algorithm. Among ready nodes the lowest rank goes first, so the
    /// order depends only on the graph and the ranks.
    pub fn topological_order(&self) -> Result<Vec<ExtractorId>, ConfigError> {
        let n = self.nodes.len();
        let mut pending: Vec<usize> = self.nodes.iter().map(|node| node.deps.len()).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, node) in self.nodes.iter().enumerate() {
            for &d in &node.deps {
                dependents[d].push(i);
            }
        }

        let mut ready: BTreeSet<(usize, usize)> = (0..n)
            .filter(|&i| pending[i] == 0)
            .map(|i| (self.nodes[i].rank, i))
            .collect();
        let mut order = Vec::with_capacity(n);
        let mut emitted = vec![false; n];

        while let Some((rank, i)) = ready.iter().next().copied() {
            ready.remove(&(rank, i));
            emitted[i] = true;
            order.push(self.nodes[i].id);
            for &j in &dependents[i] {
                pending[j] -= 1;
                if pending[j] == 0 {
                    ready.insert((self.nodes[j].rank, j));
                }
            }
        }

        if order.len() < n {
            return Err(ConfigError::DependencyCycle {
                cycle: self.find_cycle(&emitted),
            });
        }
        Ok(order)
    }

    /// Walk unresolved dependencies from the lowest-ranked stuck node until a
    /// node repeats. Every stuck node has at least one stuck dependency.
    fn find_cycle(&self, emitted: &[bool]) -> Vec<ExtractorId> {
        let stuck = |i: &usize| !emitted[*i];
        let Some(start) = (0..self.nodes.len())
            .filter(stuck)
            .min_by_key(|&i| self.nodes[i].rank)
        else {
            return Vec::new();
        };

        let mut path: Vec<usize> = Vec::new();
        let mut seen: BTreeMap<usize, usize> = BTreeMap::new();
        let mut current = start;
        loop {
            if let Some(&at) = seen.get(&current) {
                let mut cycle: Vec<ExtractorId> = path[at..].iter().map(|&i| self.nodes[i].id).collect();
                cycle.push(self.nodes[current].id);
                return cycle;
            }
            seen.insert(current, path.len());
            path.push(current);

            let next = self.nodes[current]
                .deps
                .iter()
                .copied()
                .filter(stuck)
                .min_by_key(|&d| self.nodes[d].rank);
            match next {
                Some(d) => current = d,
                None => return path.iter().map(|&i| self.nodes[i].id).collect(),
            }
        }
    }
}

/// Build the graph of `roots` and everything they transitively depend on.
pub fn resolve(registry: &Registry, roots: &[ExtractorId]) -> Result<DependencyGraph, ConfigError> {
    let mut graph = DependencyGraph::new();
    let mut queue: Vec<ExtractorId> = Vec::new();

    for &root in roots {
        let rank = registry
            .position(root)
            .ok_or_else(|| ConfigError::UnknownExtractor(root.to_string()))?;
        if !graph.contains(root) {
            graph.add_node(root, rank);
            queue.push(root);
        }
    }

    while let Some(id) = queue.pop() {
        let extractor = registry
            .get(id)
            .ok_or_else(|| ConfigError::UnknownExtractor(id.to_string()))?;
        let from = graph.add_node(id, registry.position(id).unwrap_or(usize::MAX));
        for &dep in extractor.dependencies() {
            let rank = registry
                .position(dep)
                .ok_or_else(|| ConfigError::UnknownExtractor(dep.to_string()))?;
            let known = graph.contains(dep);
            let to = graph.add_node(dep, rank);
            graph.add_edge(from, to);
            if !known {
                queue.push(dep);
            }
        }
    }

    Ok(graph)
}
