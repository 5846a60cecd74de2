//! Reaction dependency graph and bounded walk enumeration.
//!
//! An edge `r1 → r2` exists when an output of `r1` is an input of `r2`. Walks
//! start at reactions fed only by fuel and never revisit a reaction.

use std::collections::{BTreeSet, HashMap};

use crate::cascade::DiscoveredReaction;
use crate::nuclide::NuclideId;

/// Outcome of a walk enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WalkStats {
    pub walks: usize,
    pub truncated: bool,
}

/// Adjacency over indices into the discovered-reaction slice.
#[derive(Debug)]
pub(crate) struct DependencyGraph {
    successors: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl DependencyGraph {
    pub(crate) fn build(reactions: &[DiscoveredReaction], fuel: &BTreeSet<NuclideId>) -> Self {
        let mut consumers: HashMap<NuclideId, Vec<usize>> = HashMap::new();
        for (idx, d) in reactions.iter().enumerate() {
            let inputs: BTreeSet<NuclideId> = d.reaction.inputs().iter().copied().collect();
            for input in inputs {
                consumers.entry(input).or_default().push(idx);
            }
        }

        let successors = reactions
            .iter()
            .map(|d| {
                let next: BTreeSet<usize> = d
                    .reaction
                    .outputs()
                    .iter()
                    .filter_map(|o| consumers.get(o))
                    .flatten()
                    .copied()
                    .collect();
                next.into_iter().collect()
            })
            .collect();

        let roots = reactions
            .iter()
            .enumerate()
            .filter(|(_, d)| d.reaction.inputs().iter().all(|i| fuel.contains(i)))
            .map(|(idx, _)| idx)
            .collect();

        Self { successors, roots }
    }

    #[cfg(test)]
    pub(crate) fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Depth-first enumeration. Every prefix is a walk and is passed to
    /// `visit` with a flag telling whether any step of it feeds back into a
    /// reaction earlier on the same walk.
    pub(crate) fn walk<F>(&self, max_depth: usize, max_walks: usize, visit: F) -> WalkStats
    where
        F: FnMut(&[usize], bool),
    {
        let mut walker = Walker {
            graph: self,
            max_depth,
            max_walks,
            path: Vec::with_capacity(max_depth),
            on_path: vec![false; self.successors.len()],
            cyclic: Vec::with_capacity(max_depth),
            walks: 0,
            visit,
        };

        let mut truncated = false;
        for &root in &self.roots {
            if !walker.descend(root) {
                truncated = true;
                break;
            }
        }
        WalkStats {
            walks: walker.walks,
            truncated,
        }
    }
}

struct Walker<'g, F> {
    graph: &'g DependencyGraph,
    max_depth: usize,
    max_walks: usize,
    path: Vec<usize>,
    on_path: Vec<bool>,
    /// Per depth: the walk so far contains a cycle.
    cyclic: Vec<bool>,
    walks: usize,
    visit: F,
}

impl<F> Walker<'_, F>
where
    F: FnMut(&[usize], bool),
{
    /// Returns false once the walk budget is exhausted.
    fn descend(&mut self, node: usize) -> bool {
        if self.walks >= self.max_walks {
            return false;
        }
        self.path.push(node);
        self.on_path[node] = true;
        self.walks += 1;

        let graph = self.graph;
        let successors = &graph.successors[node];
        let cyclic = self.cyclic.last().copied().unwrap_or(false)
            || successors.iter().any(|s| self.on_path[*s]);
        self.cyclic.push(cyclic);
        (self.visit)(&self.path, cyclic);

        let mut keep_going = true;
        if self.path.len() < self.max_depth {
            for &next in successors {
                if self.on_path[next] {
                    continue;
                }
                if !self.descend(next) {
                    keep_going = false;
                    break;
                }
            }
        }

        self.path.pop();
        self.cyclic.pop();
        self.on_path[node] = false;
        keep_going
    }
}
