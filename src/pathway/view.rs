//! Bounded pathway views for visualization.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::nuclide::NuclideId;

use super::Pathway;

/// Sort key for pathway views. Every key sorts descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathwaySort {
    /// Occurrence count.
    #[default]
    Frequency,
    /// Average walk energy.
    AverageEnergy,
    /// Total energy over all occurrences.
    TotalEnergy,
    /// Rarity score.
    Rarity,
}

impl PathwaySort {
    pub(crate) fn compare(self, a: &Pathway, b: &Pathway) -> Ordering {
        let primary = match self {
            Self::Frequency => b.occurrences.cmp(&a.occurrences),
            Self::AverageEnergy => b.average_energy_mev.total_cmp(&a.average_energy_mev),
            Self::TotalEnergy => b.total_energy_mev.total_cmp(&a.total_energy_mev),
            Self::Rarity => b.rarity.total_cmp(&a.rarity),
        };
        primary.then_with(|| a.signature.cmp(&b.signature))
    }
}

impl fmt::Display for PathwaySort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Frequency => "frequency",
            Self::AverageEnergy => "average_energy",
            Self::TotalEnergy => "total_energy",
            Self::Rarity => "rarity",
        };
        f.write_str(name)
    }
}

/// A nuclide node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowNode {
    /// The nuclide.
    pub nuclide: NuclideId,
    /// Display label, e.g. `Li-7`.
    pub label: String,
}

/// Aggregated input → output link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEdge {
    /// Index of the source node.
    pub source: usize,
    /// Index of the target node.
    pub target: usize,
    /// Pathway occurrences flowing through this link.
    pub occurrences: usize,
    /// Release energy flowing through this link, weighted by occurrences.
    pub energy_mev: f64,
}

/// Node/edge graph over the shown pathways.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowGraph {
    /// Nodes ordered by `(Z, A)`.
    pub nodes: Vec<FlowNode>,
    /// Edges ordered by `(source, target)`.
    pub edges: Vec<FlowEdge>,
}

impl FlowGraph {
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn from_pathways(pathways: &[Pathway]) -> Self {
        let mut links: BTreeMap<(NuclideId, NuclideId), (usize, f64)> = BTreeMap::new();
        let mut nuclides = BTreeSet::new();
        for pathway in pathways {
            nuclides.extend(pathway.nuclides.iter().copied());
            for step in &pathway.steps {
                for input in step.inputs() {
                    for output in step.outputs() {
                        let entry = links.entry((*input, *output)).or_insert((0, 0.0));
                        entry.0 += pathway.occurrences;
                        entry.1 += step.energy_mev * pathway.occurrences as f64;
                    }
                }
            }
        }

        let nodes: Vec<FlowNode> = nuclides
            .iter()
            .map(|id| FlowNode {
                nuclide: *id,
                label: id.to_string(),
            })
            .collect();
        let position: BTreeMap<NuclideId, usize> =
            nuclides.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let edges = links
            .into_iter()
            .filter_map(|((from, to), (occurrences, energy_mev))| {
                Some(FlowEdge {
                    source: *position.get(&from)?,
                    target: *position.get(&to)?,
                    occurrences,
                    energy_mev,
                })
            })
            .collect();

        Self { nodes, edges }
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// A renderable graph, or the reason it was withheld.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GraphOutcome {
    /// Graph within the node cap.
    Graph(FlowGraph),
    /// Too many distinct nuclides; narrower filters are needed.
    TooComplex {
        /// Distinct nuclides across every pathway of the run.
        node_count: usize,
        /// Distinct nuclides across the shown pathways.
        shown_node_count: usize,
        /// Configured cap.
        node_cap: usize,
        /// Pathways before any view bound.
        total_pathways: usize,
    },
}

impl GraphOutcome {
    /// The graph, if it was built.
    #[must_use]
    pub const fn graph(&self) -> Option<&FlowGraph> {
        match self {
            Self::Graph(g) => Some(g),
            Self::TooComplex { .. } => None,
        }
    }

    /// True when the node cap was exceeded.
    #[must_use]
    pub const fn is_too_complex(&self) -> bool {
        matches!(self, Self::TooComplex { .. })
    }
}

/// Sorted, capped subset of pathways plus its flow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwaySelection {
    /// Sort key used.
    pub sort: PathwaySort,
    /// Pathways shown.
    pub pathways: Vec<Pathway>,
    /// Pathways available before bounding.
    pub total: usize,
    /// Flow graph over the shown pathways.
    pub graph: GraphOutcome,
}

impl PathwaySelection {
    /// Number of pathways shown.
    #[must_use]
    pub fn shown(&self) -> usize {
        self.pathways.len()
    }

    /// Caption line, e.g. `showing 30 of 112 total pathways`.
    #[must_use]
    pub fn caption(&self) -> String {
        format!("showing {} of {} total pathways", self.shown(), self.total)
    }
}
