use std::collections::HashMap;
use std::collections::hash_map::Entry;

use eframe::egui::{Color32, Vec2};
use tracing::debug;

use crate::analysis::{AccountRecord, GraphDataset, RiskLevel};

use super::super::annotations::AnnotationIndex;
use super::super::physics::{reheat, seed_position};
use super::super::render_utils::{edge_width, node_radius, risk_color, with_opacity};
use super::super::{
    Filters, PhysicsScratch, RenderEdge, RenderGraph, RenderNode, ViewModel, ViewScratch,
};

/// Edges under this share of the largest surviving amount are hidden unless low-weight
/// transfers are enabled.
const LOW_WEIGHT_FRACTION: f64 = 0.1;

const SUSPICIOUS_EDGE_COLOR: Color32 = Color32::from_rgb(229, 72, 77);
const PLAIN_EDGE_COLOR: Color32 = Color32::from_rgb(112, 124, 146);
const SUSPICIOUS_EDGE_MIN_WIDTH: f32 = 2.0;
const SUSPICIOUS_EDGE_WIDTH_SCALE: f32 = 1.3;

/// All transfers between one ordered pair of rendered accounts.
struct PairFlow {
    source: usize,
    target: usize,
    amount: f64,
    transaction_count: u32,
}

fn seed_spread(node_count: usize) -> f32 {
    40.0 + (node_count as f32).sqrt() * 30.0
}

fn make_render_node(
    account: &AccountRecord,
    annotations: &AnnotationIndex,
    spread: f32,
) -> RenderNode {
    let id = account.id.as_str();
    let is_suspicious = annotations.is_suspicious(id);
    let ring_id = annotations
        .suspicion(id)
        .and_then(|suspicion| suspicion.ring_id.clone())
        .or_else(|| annotations.ring_of(id).map(str::to_owned));
    let is_in_ring = annotations.ring_of(id).is_some();
    let risk_level = annotations.risk_level_for(id);
    let score = annotations.score_for(id);
    // Fill follows the visual score; only an explicit critical level overrides it.
    let color_level = match risk_level {
        RiskLevel::Critical => RiskLevel::Critical,
        _ => RiskLevel::from_score(score),
    };

    RenderNode {
        id: account.id.clone(),
        account: account.clone(),
        world_pos: seed_position(id, spread),
        velocity: Vec2::ZERO,
        base_radius: node_radius(account.degree(), is_in_ring, is_suspicious),
        color: risk_color(color_level),
        score,
        risk_level,
        is_suspicious,
        is_in_ring,
        ring_id,
        patterns: annotations.patterns_for(id),
    }
}

fn passes_amount_filters(amount: f64, low_weight_threshold: f64, filters: Filters) -> bool {
    if !filters.show_low_weight && amount < low_weight_threshold {
        return false;
    }
    !(filters.min_amount > 0.0 && amount < filters.min_amount)
}

/// Maps the raw dataset into render nodes and edges for the given filters. Positions are
/// freshly seeded; carrying over a previous layout is left to the caller.
pub(in crate::app) fn build_render_graph(
    dataset: &GraphDataset,
    annotations: &AnnotationIndex,
    filters: Filters,
) -> RenderGraph {
    let accounts = dataset
        .nodes
        .iter()
        .filter(|account| !filters.show_only_suspicious || annotations.is_suspicious(&account.id))
        .collect::<Vec<_>>();

    let spread = seed_spread(accounts.len());
    let mut nodes = Vec::with_capacity(accounts.len());
    let mut index_by_id = HashMap::with_capacity(accounts.len());
    for account in accounts {
        if index_by_id.contains_key(&account.id) {
            continue;
        }
        index_by_id.insert(account.id.clone(), nodes.len());
        nodes.push(make_render_node(account, annotations, spread));
    }

    let mut self_loops = 0usize;
    let mut slot_by_pair = HashMap::new();
    let mut flows: Vec<PairFlow> = Vec::new();
    for transfer in &dataset.edges {
        let (Some(&source), Some(&target)) = (
            index_by_id.get(&transfer.source),
            index_by_id.get(&transfer.target),
        ) else {
            continue;
        };
        if source == target {
            self_loops += 1;
            continue;
        }
        match slot_by_pair.entry((source, target)) {
            Entry::Occupied(slot) => {
                let flow: &mut PairFlow = &mut flows[*slot.get()];
                flow.amount += transfer.amount;
                flow.transaction_count = flow
                    .transaction_count
                    .saturating_add(transfer.transaction_count);
            }
            Entry::Vacant(slot) => {
                slot.insert(flows.len());
                flows.push(PairFlow {
                    source,
                    target,
                    amount: transfer.amount,
                    transaction_count: transfer.transaction_count,
                });
            }
        }
    }
    if self_loops > 0 {
        debug!(self_loops, "skipped self-transfers");
    }

    let max_amount = flows
        .iter()
        .map(|flow| flow.amount)
        .filter(|amount| amount.is_finite())
        .fold(0.0_f64, f64::max);
    let low_weight_threshold = max_amount * LOW_WEIGHT_FRACTION;

    let edges = flows
        .into_iter()
        .filter(|flow| passes_amount_filters(flow.amount, low_weight_threshold, filters))
        .map(|flow| {
            let is_suspicious =
                nodes[flow.source].is_suspicious || nodes[flow.target].is_suspicious;
            let base_width = edge_width(flow.amount, max_amount);
            let (color, width) = if is_suspicious {
                (
                    with_opacity(SUSPICIOUS_EDGE_COLOR, 0.72),
                    base_width.max(SUSPICIOUS_EDGE_MIN_WIDTH) * SUSPICIOUS_EDGE_WIDTH_SCALE,
                )
            } else {
                (with_opacity(PLAIN_EDGE_COLOR, 0.55), base_width)
            };
            RenderEdge {
                source: flow.source,
                target: flow.target,
                amount: flow.amount,
                transaction_count: flow.transaction_count,
                width,
                is_suspicious,
                color,
            }
        })
        .collect::<Vec<_>>();

    let mut outgoing = vec![Vec::new(); nodes.len()];
    let mut incoming = vec![Vec::new(); nodes.len()];
    for (edge_index, edge) in edges.iter().enumerate() {
        outgoing[edge.source].push(edge_index);
        incoming[edge.target].push(edge_index);
    }

    RenderGraph {
        nodes,
        edges,
        index_by_id,
        outgoing,
        incoming,
        max_amount,
        alpha: 1.0,
        physics_scratch: PhysicsScratch::default(),
        view_scratch: ViewScratch::default(),
    }
}

impl ViewModel {
    pub(in crate::app) fn rebuild_render_graph(&mut self) {
        self.render_graph_revision = self.render_graph_revision.wrapping_add(1);
        self.search_match_cache = None;
        self.pattern_cache = None;
        self.graph_dirty = false;

        let Some(dataset) = self.bundle.dataset.as_ref() else {
            self.graph_cache = None;
            self.visible_node_count = 0;
            self.visible_edge_count = 0;
            return;
        };

        let mut next = build_render_graph(dataset, &self.annotations, self.filters);

        if let Some(previous) = self.graph_cache.take() {
            let mut carried = 0usize;
            let mut prior = previous
                .nodes
                .into_iter()
                .map(|node| (node.id, (node.world_pos, node.velocity)))
                .collect::<HashMap<_, _>>();
            for node in &mut next.nodes {
                if let Some((world_pos, velocity)) = prior.remove(&node.id) {
                    node.world_pos = world_pos;
                    node.velocity = velocity;
                    carried += 1;
                }
            }

            next.alpha = previous.alpha;
            next.physics_scratch = previous.physics_scratch;
            next.view_scratch = previous.view_scratch;
            reheat(&mut next);
            debug!(carried, dropped = prior.len(), "carried layout across rebuild");
        }

        self.visible_node_count = next.nodes.len();
        self.visible_edge_count = next.edges.len();
        self.interaction.refresh(&next);
        debug!(
            revision = self.render_graph_revision,
            nodes = self.visible_node_count,
            edges = self.visible_edge_count,
            "rebuilt render graph"
        );
        self.graph_cache = Some(next);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::super::fixtures::{annotated, cycle_scenario, dataset, render_graph};
    use super::*;

    fn node_ids(graph: &RenderGraph) -> BTreeSet<String> {
        graph.nodes.iter().map(|node| node.id.clone()).collect()
    }

    fn edge_pairs(graph: &RenderGraph) -> Vec<(String, String)> {
        graph
            .edges
            .iter()
            .map(|edge| {
                (
                    graph.nodes[edge.source].id.clone(),
                    graph.nodes[edge.target].id.clone(),
                )
            })
            .collect()
    }

    #[test]
    fn dangling_edges_and_self_loops_are_discarded() {
        let graph = render_graph(
            &["A", "B"],
            &[("A", "B", 10.0), ("B", "Z", 10.0), ("A", "A", 10.0)],
        );
        assert_eq!(edge_pairs(&graph), vec![("A".to_owned(), "B".to_owned())]);
        assert_eq!(graph.outgoing[0], vec![0]);
        assert_eq!(graph.incoming[1], vec![0]);
    }

    #[test]
    fn low_weight_edges_follow_the_toggle() {
        let data = dataset(&["A", "B", "C"], &[("A", "B", 100.0), ("B", "C", 5.0)]);
        let annotations = AnnotationIndex::default();

        let all = build_render_graph(&data, &annotations, Filters::default());
        assert_eq!(all.edges.len(), 2);

        let filters = Filters {
            show_low_weight: false,
            ..Filters::default()
        };
        let heavy = build_render_graph(&data, &annotations, filters);
        assert_eq!(edge_pairs(&heavy), vec![("A".to_owned(), "B".to_owned())]);
        assert_eq!(heavy.nodes.len(), 3);
    }

    #[test]
    fn minimum_amount_drops_smaller_transfers() {
        let data = dataset(
            &["A", "B", "C"],
            &[("A", "B", 100.0), ("B", "C", 40.0), ("C", "A", 60.0)],
        );
        let filters = Filters {
            min_amount: 50.0,
            ..Filters::default()
        };
        let graph = build_render_graph(&data, &AnnotationIndex::default(), filters);
        let pairs = edge_pairs(&graph);
        assert_eq!(pairs.len(), 2);
        assert!(!pairs.contains(&("B".to_owned(), "C".to_owned())));
    }

    #[test]
    fn flags_and_sizes_come_from_annotations() {
        let (data, annotations) = cycle_scenario();
        let graph = build_render_graph(&data, &annotations, Filters::default());

        let a = &graph.nodes[graph.index_by_id["A"]];
        let d = &graph.nodes[graph.index_by_id["D"]];
        assert!(a.is_suspicious && a.is_in_ring);
        assert_eq!(a.ring_id.as_deref(), Some("R1"));
        assert!(!d.is_suspicious && !d.is_in_ring);
        assert!(a.base_radius >= d.base_radius);

        let cd = graph
            .edges
            .iter()
            .find(|edge| graph.nodes[edge.target].id == "D")
            .expect("C -> D survives");
        assert!(cd.is_suspicious);
        assert!(cd.width < graph.edges[0].width);
        assert!((graph.max_amount - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn node_fill_follows_suspicion_score_over_risk_level() {
        let data = dataset(&["A", "B", "C"], &[("A", "B", 10.0)]);
        let annotations = annotated(
            &[("A", 90.0)],
            &[("A", 10.0, "LOW"), ("B", 20.0, "CRITICAL"), ("C", 75.0, "MEDIUM")],
        );
        let graph = build_render_graph(&data, &annotations, Filters::default());

        let a = &graph.nodes[graph.index_by_id["A"]];
        assert_eq!(a.score, 90.0);
        assert_eq!(a.risk_level, RiskLevel::Low);
        assert_eq!(a.color, risk_color(RiskLevel::High));

        let b = &graph.nodes[graph.index_by_id["B"]];
        assert_eq!(b.color, risk_color(RiskLevel::Critical));

        let c = &graph.nodes[graph.index_by_id["C"]];
        assert_eq!(c.risk_level, RiskLevel::Medium);
        assert_eq!(c.color, risk_color(RiskLevel::High));
    }

    #[test]
    fn parallel_transfers_merge_into_one_edge() {
        let data = dataset(
            &["A", "B"],
            &[("A", "B", 30.0), ("B", "A", 5.0), ("A", "B", 70.0)],
        );
        let graph = build_render_graph(&data, &AnnotationIndex::default(), Filters::default());

        assert_eq!(
            edge_pairs(&graph),
            vec![
                ("A".to_owned(), "B".to_owned()),
                ("B".to_owned(), "A".to_owned()),
            ]
        );
        assert!((graph.edges[0].amount - 100.0).abs() < f64::EPSILON);
        assert_eq!(graph.edges[0].transaction_count, 2);
        assert!((graph.max_amount - 100.0).abs() < f64::EPSILON);
        assert!((graph.edges[0].width - edge_width(100.0, 100.0)).abs() < 1e-4);
    }

    #[test]
    fn merged_amount_decides_minimum_amount_filter() {
        let data = dataset(&["A", "B"], &[("A", "B", 30.0), ("A", "B", 30.0)]);
        let filters = Filters {
            min_amount: 50.0,
            ..Filters::default()
        };
        let graph = build_render_graph(&data, &AnnotationIndex::default(), filters);
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn build_is_idempotent() {
        let (data, annotations) = cycle_scenario();
        let first = build_render_graph(&data, &annotations, Filters::default());
        let second = build_render_graph(&data, &annotations, Filters::default());
        assert_eq!(node_ids(&first), node_ids(&second));
        assert_eq!(edge_pairs(&first), edge_pairs(&second));
        let positions = |graph: &RenderGraph| {
            graph.nodes.iter().map(|node| node.world_pos).collect::<Vec<_>>()
        };
        assert_eq!(positions(&first), positions(&second));
    }

    #[test]
    fn rebuild_keeps_surviving_positions_and_reheats() {
        let (data, _) = cycle_scenario();
        let bundle = crate::analysis::AnalysisBundle {
            dataset: Some(data),
            ..Default::default()
        };
        let mut model = ViewModel::new(bundle, &crate::app::StartupOptions::default());
        model.rebuild_render_graph();

        let moved = Vec2::new(123.0, -45.0);
        {
            let graph = model.graph_cache.as_mut().expect("graph built");
            let a = graph.index_by_id["A"];
            graph.nodes[a].world_pos = moved;
            graph.alpha = 0.0;
        }

        model.filters.min_amount = 50.0;
        model.rebuild_render_graph();

        let graph = model.graph_cache.as_ref().expect("graph rebuilt");
        assert_eq!(graph.nodes[graph.index_by_id["A"]].world_pos, moved);
        assert_eq!(graph.edges.len(), 3);
        assert!(graph.alpha >= 0.5);
        assert_eq!(model.render_graph_revision, 2);
    }

    fn arbitrary_dataset() -> impl Strategy<Value = (GraphDataset, Vec<usize>)> {
        (2usize..12).prop_flat_map(|count| {
            (
                prop::collection::vec((0..count + 2, 0..count + 2, 0.0f64..1_000.0), 0..30),
                prop::collection::vec(0..count, 0..count),
            )
                .prop_map(move |(raw_edges, suspicious)| {
                    let ids = (0..count).map(|index| format!("N{index}")).collect::<Vec<_>>();
                    let names = (0..count + 2).map(|index| format!("N{index}")).collect::<Vec<_>>();
                    let data = GraphDataset {
                        nodes: ids.iter().map(|id| super::super::fixtures::account(id)).collect(),
                        edges: raw_edges
                            .iter()
                            .map(|(source, target, amount)| {
                                super::super::fixtures::transfer(
                                    &names[*source],
                                    &names[*target],
                                    *amount,
                                )
                            })
                            .collect(),
                    };
                    (data, suspicious)
                })
        })
    }

    fn suspicious_index(data: &GraphDataset, picks: &[usize]) -> AnnotationIndex {
        use crate::analysis::{FraudResult, SuspiciousAccount};

        let fraud = FraudResult {
            fraud_rings: Vec::new(),
            suspicious_accounts: picks
                .iter()
                .map(|pick| SuspiciousAccount {
                    account_id: data.nodes[*pick].id.clone(),
                    score: 50.0,
                    patterns: Vec::new(),
                    ring_id: None,
                })
                .collect(),
        };
        AnnotationIndex::build(Some(&fraud), None)
    }

    proptest! {
        #[test]
        fn every_edge_endpoint_is_a_rendered_node(
            (data, picks) in arbitrary_dataset(),
            suspicious_only in any::<bool>(),
            show_low_weight in any::<bool>(),
        ) {
            let annotations = suspicious_index(&data, &picks);
            let filters = Filters { show_low_weight, show_only_suspicious: suspicious_only, min_amount: 0.0 };
            let graph = build_render_graph(&data, &annotations, filters);

            for edge in &graph.edges {
                prop_assert!(edge.source < graph.nodes.len());
                prop_assert!(edge.target < graph.nodes.len());
                prop_assert_ne!(edge.source, edge.target);
            }
            for (index, node) in graph.nodes.iter().enumerate() {
                prop_assert_eq!(graph.index_by_id[&node.id], index);
            }
        }

        #[test]
        fn suspicious_only_narrows_and_restores(
            (data, picks) in arbitrary_dataset(),
        ) {
            let annotations = suspicious_index(&data, &picks);
            let full = build_render_graph(&data, &annotations, Filters::default());
            let narrowed = build_render_graph(
                &data,
                &annotations,
                Filters { show_only_suspicious: true, ..Filters::default() },
            );
            let restored = build_render_graph(&data, &annotations, Filters::default());

            let expected = annotations.suspicious_ids().map(str::to_owned).collect::<BTreeSet<_>>();
            prop_assert_eq!(node_ids(&narrowed), expected);
            prop_assert_eq!(node_ids(&full), node_ids(&restored));
        }
    }
}
