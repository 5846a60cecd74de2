//! Pathway and statistics post-processing.
//!
//! Runs once per finished cascade. Builds the product distribution, walks the
//! reaction dependency graph from fuel-fed reactions, collapses walks into
//! pathways by element-level signature, and scores each pathway's rarity
//! against the full dataset.

mod graph;
mod products;
mod view;

pub use products::{ProductCount, ProductDistribution};
pub use view::{FlowEdge, FlowGraph, FlowNode, GraphOutcome, PathwaySelection, PathwaySort};

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::cascade::DiscoveredReaction;
use crate::config::PathwayConfig;
use crate::error::TransmuteResult;
use crate::nuclide::NuclideId;
use crate::query::{QueryEngine, QueryFilter};
use crate::reaction::{Reaction, ReactionId};

use graph::DependencyGraph;

/// Numerator of the rarity score.
pub const RARITY_SCALE: f64 = 100.0;

const STEP_SEPARATOR: &str = " ⇒ ";

/// A recurring reaction-chain signature with aggregate statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pathway {
    /// Element-level steps, e.g. `H + Li → Be ⇒ Be → He + He`.
    pub signature: String,
    /// Reactions of the first walk realizing the signature.
    pub steps: Vec<Reaction>,
    /// Distinct walks realizing the signature.
    pub occurrences: usize,
    /// Sum of walk energies over all occurrences.
    pub total_energy_mev: f64,
    /// `total_energy_mev / occurrences`.
    pub average_energy_mev: f64,
    /// Some walk used a reaction reachable only through feedback.
    pub involves_feedback: bool,
    /// Some walk feeds a product back into an earlier reaction of itself.
    pub contains_cycle: bool,
    /// `RARITY_SCALE / (occurrences × smallest dataset count)`, the count
    /// taken over every reaction of every realizing walk.
    pub rarity: f64,
    /// Every nuclide touched by any realizing walk.
    pub nuclides: BTreeSet<NuclideId>,
}

impl Pathway {
    /// Reactions in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; a pathway has at least one step.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Identities of the representative reactions.
    #[must_use]
    pub fn reaction_ids(&self) -> Vec<ReactionId> {
        self.steps.iter().map(|r| r.id).collect()
    }
}

/// All pathways of a run plus enumeration statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwaySummary {
    /// Pathways ordered by frequency, then signature.
    pub pathways: Vec<Pathway>,
    /// Walks enumerated.
    pub total_walks: usize,
    /// True if the walk budget ran out.
    pub walks_truncated: bool,
    #[serde(default = "default_max_shown")]
    max_shown: usize,
    #[serde(default = "default_max_graph_nodes")]
    max_graph_nodes: usize,
}

fn default_max_shown() -> usize {
    PathwayConfig::default().max_pathways_shown
}

fn default_max_graph_nodes() -> usize {
    PathwayConfig::default().max_graph_nodes
}

impl Default for PathwaySummary {
    fn default() -> Self {
        Self {
            pathways: Vec::new(),
            total_walks: 0,
            walks_truncated: false,
            max_shown: default_max_shown(),
            max_graph_nodes: default_max_graph_nodes(),
        }
    }
}

impl PathwaySummary {
    /// Number of distinct pathways.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pathways.len()
    }

    /// True if no pathway was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pathways.is_empty()
    }

    /// Looks up a pathway by signature.
    #[must_use]
    pub fn get(&self, signature: &str) -> Option<&Pathway> {
        self.pathways.iter().find(|p| p.signature == signature)
    }

    /// The top `top_k` pathways by `sort`, never more than the configured
    /// cap, with a flow graph or a too-complex report.
    ///
    /// The node cap applies to the nuclides of every pathway, not only the
    /// shown ones, so a narrow view never hides an oversized run.
    #[must_use]
    pub fn view(&self, sort: PathwaySort, top_k: usize) -> PathwaySelection {
        let mut sorted: Vec<&Pathway> = self.pathways.iter().collect();
        sorted.sort_by(|a, b| sort.compare(a, b));
        let shown: Vec<Pathway> = sorted
            .into_iter()
            .take(top_k.min(self.max_shown))
            .cloned()
            .collect();

        let node_count = distinct_nuclides(&self.pathways);
        let graph = if node_count > self.max_graph_nodes {
            warn!(
                "pathway graph too complex: {node_count} nuclides exceed cap {}",
                self.max_graph_nodes
            );
            GraphOutcome::TooComplex {
                node_count,
                shown_node_count: distinct_nuclides(&shown),
                node_cap: self.max_graph_nodes,
                total_pathways: self.pathways.len(),
            }
        } else {
            GraphOutcome::Graph(FlowGraph::from_pathways(&shown))
        };

        PathwaySelection {
            sort,
            pathways: shown,
            total: self.pathways.len(),
            graph,
        }
    }
}

fn distinct_nuclides(pathways: &[Pathway]) -> usize {
    pathways
        .iter()
        .flat_map(|p| p.nuclides.iter())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Product distribution and pathways of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CascadeSummary {
    /// Output occurrence counts.
    pub products: ProductDistribution,
    /// Reconstructed pathways.
    pub pathways: PathwaySummary,
}

#[derive(Default)]
struct Accumulator {
    steps: Vec<usize>,
    occurrences: usize,
    total_energy_mev: f64,
    involves_feedback: bool,
    contains_cycle: bool,
    constituents: BTreeSet<usize>,
}

fn step_signature(reaction: &Reaction) -> String {
    let side = |ids: &[NuclideId]| {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.iter().map(NuclideId::symbol).collect::<Vec<_>>().join(" + ")
    };
    format!("{} → {}", side(reaction.inputs()), side(reaction.outputs()))
}

/// Post-processor bound to a query engine for dataset-wide counts.
#[derive(Clone)]
pub struct PathwayAnalyzer {
    engine: QueryEngine,
    config: PathwayConfig,
}

impl PathwayAnalyzer {
    /// Analyzer with default bounds.
    #[must_use]
    pub fn new(engine: QueryEngine) -> Self {
        Self::with_config(engine, PathwayConfig::default())
    }

    /// Analyzer with explicit bounds.
    #[must_use]
    pub const fn with_config(engine: QueryEngine, config: PathwayConfig) -> Self {
        Self { engine, config }
    }

    /// Active bounds.
    #[must_use]
    pub const fn config(&self) -> PathwayConfig {
        self.config
    }

    /// Product distribution and pathway summary of a discovered set.
    pub fn summarize(
        &self,
        reactions: &[DiscoveredReaction],
        fuel: &BTreeSet<NuclideId>,
    ) -> TransmuteResult<CascadeSummary> {
        let products = ProductDistribution::from_reactions(reactions, self.config.top_products);
        let pathways = self.pathways(reactions, fuel)?;
        Ok(CascadeSummary { products, pathways })
    }

    fn pathways(
        &self,
        reactions: &[DiscoveredReaction],
        fuel: &BTreeSet<NuclideId>,
    ) -> TransmuteResult<PathwaySummary> {
        let labels: Vec<String> = reactions
            .iter()
            .map(|d| step_signature(&d.reaction))
            .collect();

        let graph = DependencyGraph::build(reactions, fuel);
        let mut by_signature: BTreeMap<String, Accumulator> = BTreeMap::new();
        let stats = graph.walk(
            self.config.max_walk_depth,
            self.config.max_walks,
            |path, cyclic| {
                let signature = path
                    .iter()
                    .map(|&i| labels[i].as_str())
                    .collect::<Vec<_>>()
                    .join(STEP_SEPARATOR);
                let acc = by_signature.entry(signature).or_default();
                if acc.steps.is_empty() {
                    acc.steps = path.to_vec();
                }
                acc.occurrences += 1;
                acc.total_energy_mev += path
                    .iter()
                    .map(|&i| reactions[i].reaction.energy_mev)
                    .sum::<f64>();
                acc.involves_feedback |= path.iter().any(|&i| reactions[i].via_feedback);
                acc.contains_cycle |= cyclic;
                acc.constituents.extend(path.iter().copied());
            },
        );

        if stats.truncated {
            warn!(
                "pathway walk enumeration stopped at {} walks",
                self.config.max_walks
            );
        }

        let mut dataset_counts: HashMap<usize, usize> = HashMap::new();
        let mut pathways = Vec::with_capacity(by_signature.len());
        for (signature, acc) in by_signature {
            let mut min_count = usize::MAX;
            for &idx in &acc.constituents {
                let count = match dataset_counts.get(&idx) {
                    Some(c) => *c,
                    None => {
                        let c = self.dataset_count(&reactions[idx].reaction)?;
                        dataset_counts.insert(idx, c);
                        c
                    }
                };
                min_count = min_count.min(count);
            }

            #[allow(clippy::cast_precision_loss)]
            let (average_energy_mev, rarity) = {
                let occurrences = acc.occurrences as f64;
                let specificity = min_count.max(1) as f64;
                (
                    acc.total_energy_mev / occurrences,
                    RARITY_SCALE / (occurrences * specificity),
                )
            };

            let nuclides = acc
                .constituents
                .iter()
                .flat_map(|&i| reactions[i].reaction.participants())
                .collect();

            pathways.push(Pathway {
                signature,
                steps: acc.steps.iter().map(|&i| reactions[i].reaction).collect(),
                occurrences: acc.occurrences,
                total_energy_mev: acc.total_energy_mev,
                average_energy_mev,
                involves_feedback: acc.involves_feedback,
                contains_cycle: acc.contains_cycle,
                rarity,
                nuclides,
            });
        }
        pathways.sort_by(|a, b| PathwaySort::Frequency.compare(a, b));

        debug!(
            "pathways: {} signatures from {} walks (truncated={})",
            pathways.len(),
            stats.walks,
            stats.truncated
        );

        Ok(PathwaySummary {
            pathways,
            total_walks: stats.walks,
            walks_truncated: stats.truncated,
            max_shown: self.config.max_pathways_shown,
            max_graph_nodes: self.config.max_graph_nodes,
        })
    }

    /// Full-dataset reactions of the same kind sharing these exact inputs.
    fn dataset_count(&self, reaction: &Reaction) -> TransmuteResult<usize> {
        let filter = QueryFilter::exact_inputs(reaction.inputs());
        self.engine.true_total_count(&filter, reaction.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::nuclide::Nuclide;
    use crate::storage::InMemoryReactionStore;

    fn n(s: &str) -> NuclideId {
        NuclideId::parse(s).unwrap()
    }

    fn d(reaction: Reaction, via_feedback: bool) -> DiscoveredReaction {
        DiscoveredReaction {
            reaction,
            first_loop: 1,
            frequency: 1,
            via_feedback,
        }
    }

    fn analyzer(config: PathwayConfig) -> PathwayAnalyzer {
        let mut b = InMemoryReactionStore::builder();
        for s in ["H-1", "He-4", "Li-6", "Li-7", "Be-7", "Be-8"] {
            b.add_nuclide(Nuclide::stable(n(s), 1.0)).unwrap();
        }
        b.add_reaction(Reaction::fusion([n("H-1"), n("Li-7")], n("Be-8"), 17.255))
            .add_reaction(Reaction::fusion([n("H-1"), n("Li-6")], n("Be-7"), 5.606))
            .add_reaction(Reaction::fusion([n("H-1"), n("Li-6")], n("Li-7"), 7.250))
            .add_reaction(Reaction::fission(n("Be-8"), [n("He-4"), n("He-4")], 0.092))
            .add_reaction(Reaction::two_to_two(
                [n("H-1"), n("Li-7")],
                [n("He-4"), n("He-4")],
                17.347,
            ));
        let engine = QueryEngine::new(Arc::new(b.build().unwrap()));
        PathwayAnalyzer::with_config(engine, config)
    }

    fn discovered() -> Vec<DiscoveredReaction> {
        vec![
            d(Reaction::fusion([n("H-1"), n("Li-7")], n("Be-8"), 17.255), false),
            d(Reaction::fusion([n("H-1"), n("Li-6")], n("Be-7"), 5.606), false),
            d(Reaction::fission(n("Be-8"), [n("He-4"), n("He-4")], 0.092), true),
        ]
    }

    fn fuel() -> BTreeSet<NuclideId> {
        [n("H-1"), n("Li-6"), n("Li-7")].into_iter().collect()
    }

    #[test]
    fn walks_collapse_by_element_signature() {
        let summary = analyzer(PathwayConfig::default())
            .summarize(&discovered(), &fuel())
            .unwrap();
        let pathways = &summary.pathways;
        assert_eq!(pathways.total_walks, 3);
        assert!(!pathways.walks_truncated);

        let single = pathways.get("H + Li → Be").unwrap();
        assert_eq!(single.occurrences, 2);
        assert!((single.total_energy_mev - (17.255 + 5.606)).abs() < 1e-9);
        assert!(!single.involves_feedback);

        let chain = pathways.get("H + Li → Be ⇒ Be → He + He").unwrap();
        assert_eq!(chain.occurrences, 1);
        assert_eq!(chain.len(), 2);
        assert!(chain.involves_feedback);
        assert!(chain.nuclides.contains(&n("He-4")));

        assert_eq!(pathways.pathways[0].signature, "H + Li → Be");
    }

    #[test]
    fn rarity_scales_with_occurrence_and_dataset_count() {
        let summary = analyzer(PathwayConfig::default())
            .summarize(&discovered(), &fuel())
            .unwrap();
        let single = summary.pathways.get("H + Li → Be").unwrap();
        assert!((single.rarity - RARITY_SCALE / 2.0).abs() < 1e-9);
        let chain = summary.pathways.get("H + Li → Be ⇒ Be → He + He").unwrap();
        assert!((chain.rarity - RARITY_SCALE).abs() < 1e-9);
    }

    #[test]
    fn rarity_uses_rarest_reaction_of_any_realizing_walk() {
        // H-1 + Li-6 has two fusion channels in the dataset, H-1 + Li-7 one.
        // The Li-6 walk is the representative, the Li-7 walk sets the count.
        let reactions = vec![
            d(Reaction::fusion([n("H-1"), n("Li-6")], n("Be-7"), 5.606), false),
            d(Reaction::fusion([n("H-1"), n("Li-7")], n("Be-8"), 17.255), false),
        ];
        let summary = analyzer(PathwayConfig::default())
            .summarize(&reactions, &fuel())
            .unwrap();
        let single = summary.pathways.get("H + Li → Be").unwrap();
        assert_eq!(single.steps[0].inputs(), &[n("H-1"), n("Li-6")]);
        assert_eq!(single.occurrences, 2);
        assert!((single.rarity - RARITY_SCALE / 2.0).abs() < 1e-9);
    }

    #[test]
    fn feedback_flag_ignores_cycles_among_fuel_reactions() {
        let reactions = vec![
            d(Reaction::fusion([n("He-4"), n("He-4")], n("Be-8"), -0.092), false),
            d(Reaction::fission(n("Be-8"), [n("He-4"), n("He-4")], 0.092), false),
            d(Reaction::fusion([n("He-4"), n("Be-8")], n("C-12"), 7.367), false),
        ];
        let fuel = [n("He-4"), n("Be-8")].into_iter().collect();
        let summary = analyzer(PathwayConfig::default())
            .summarize(&reactions, &fuel)
            .unwrap();
        let pathways = &summary.pathways;

        assert!(pathways.pathways.iter().all(|p| !p.involves_feedback));
        let loop_back = pathways.get("He + He → Be ⇒ Be → He + He").unwrap();
        assert!(loop_back.contains_cycle);
        let extended = pathways
            .get("He + He → Be ⇒ Be → He + He ⇒ He + Be → C")
            .unwrap();
        assert!(extended.contains_cycle);
        let open = pathways.get("He + He → Be ⇒ He + Be → C").unwrap();
        assert!(!open.contains_cycle);
    }

    #[test]
    fn views_are_capped_and_captioned() {
        let config = PathwayConfig {
            max_pathways_shown: 1,
            ..PathwayConfig::default()
        };
        let summary = analyzer(config).summarize(&discovered(), &fuel()).unwrap();
        let view = summary.pathways.view(PathwaySort::Frequency, 30);
        assert_eq!(view.shown(), 1);
        assert_eq!(view.caption(), "showing 1 of 2 total pathways");

        let view = summary.pathways.view(PathwaySort::TotalEnergy, 30);
        assert_eq!(view.pathways[0].signature, "H + Li → Be");
        let graph = view.graph.graph().unwrap();
        assert_eq!(graph.node_count(), 5);
        assert!(graph.edges.iter().all(|e| e.occurrences == 2));
    }

    #[test]
    fn graph_over_node_cap_is_too_complex() {
        let config = PathwayConfig {
            max_graph_nodes: 3,
            ..PathwayConfig::default()
        };
        let summary = analyzer(config).summarize(&discovered(), &fuel()).unwrap();
        let view = summary.pathways.view(PathwaySort::Rarity, 30);
        assert_eq!(view.shown(), 2);
        match view.graph {
            GraphOutcome::TooComplex {
                node_count,
                shown_node_count,
                node_cap,
                total_pathways,
            } => {
                assert_eq!(node_count, 6);
                assert_eq!(shown_node_count, 6);
                assert_eq!(node_cap, 3);
                assert_eq!(total_pathways, 2);
            }
            GraphOutcome::Graph(_) => panic!("expected too-complex outcome"),
        }
    }

    #[test]
    fn node_cap_counts_pathways_outside_the_view() {
        let config = PathwayConfig {
            max_graph_nodes: 5,
            ..PathwayConfig::default()
        };
        let summary = analyzer(config).summarize(&discovered(), &fuel()).unwrap();
        let view = summary.pathways.view(PathwaySort::Frequency, 1);
        assert_eq!(view.shown(), 1);
        assert_eq!(
            view.graph,
            GraphOutcome::TooComplex {
                node_count: 6,
                shown_node_count: 5,
                node_cap: 5,
                total_pathways: 2,
            }
        );
    }

    #[test]
    fn summaries_without_bounds_fall_back_to_defaults() {
        assert_eq!(PathwaySummary::default().view(PathwaySort::Rarity, 30).shown(), 0);

        let summary = analyzer(PathwayConfig::default())
            .summarize(&discovered(), &fuel())
            .unwrap()
            .pathways;
        let mut json = serde_json::to_value(&summary).unwrap();
        let fields = json.as_object_mut().unwrap();
        fields.remove("max_shown");
        fields.remove("max_graph_nodes");
        let restored: PathwaySummary = serde_json::from_value(json).unwrap();

        let view = restored.view(PathwaySort::Frequency, 30);
        assert_eq!(view.shown(), 2);
        assert!(!view.graph.is_too_complex());
        assert_eq!(restored.total_walks, summary.total_walks);
    }

    #[test]
    fn products_use_configured_summary_size() {
        let config = PathwayConfig {
            top_products: 1,
            ..PathwayConfig::default()
        };
        let summary = analyzer(config).summarize(&discovered(), &fuel()).unwrap();
        assert_eq!(summary.products.distinct_count(), 3);
        assert_eq!(summary.products.top_products().len(), 1);
        assert_eq!(summary.products.top_products()[0].nuclide, n("He-4"));
    }
}
