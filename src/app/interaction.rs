use tracing::debug;

use super::RenderGraph;
use super::annotations::FraudPattern;
use super::highlight::HighlightSet;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) enum NeighborDepth {
    #[default]
    One,
    Two,
}

impl NeighborDepth {
    pub(super) fn hops(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    pub(super) fn label(self) -> &'static str {
        match self {
            Self::One => "1 hop",
            Self::Two => "2 hops",
        }
    }
}

/// What the camera should do after an interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum CameraRequest {
    None,
    FocusNode(usize),
    Fit,
}

#[derive(Clone, Debug, PartialEq)]
struct Selection {
    id: String,
    index: usize,
}

#[derive(Debug, Default)]
pub(super) struct InteractionState {
    selected: Option<Selection>,
    highlight: HighlightSet,
    hover_node: Option<usize>,
    hover_link: Option<usize>,
    neighbor_depth: NeighborDepth,
    active_pattern: Option<FraudPattern>,
}

impl InteractionState {
    pub(super) fn new(neighbor_depth: NeighborDepth) -> Self {
        Self {
            neighbor_depth,
            ..Self::default()
        }
    }

    pub(super) fn selected_index(&self) -> Option<usize> {
        self.selected.as_ref().map(|selection| selection.index)
    }

    pub(super) fn selected_id(&self) -> Option<&str> {
        self.selected.as_ref().map(|selection| selection.id.as_str())
    }

    pub(super) fn highlight(&self) -> &HighlightSet {
        &self.highlight
    }

    pub(super) fn hover_node(&self) -> Option<usize> {
        self.hover_node
    }

    pub(super) fn hover_link(&self) -> Option<usize> {
        self.hover_link
    }

    pub(super) fn neighbor_depth(&self) -> NeighborDepth {
        self.neighbor_depth
    }

    pub(super) fn active_pattern(&self) -> Option<FraudPattern> {
        self.active_pattern
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.highlight.clear();
        self.hover_node = None;
        self.hover_link = None;
    }

    fn select(&mut self, graph: &RenderGraph, index: usize) {
        self.selected = Some(Selection {
            id: graph.nodes[index].id.clone(),
            index,
        });
        self.highlight = HighlightSet::ego_network(graph, index, self.neighbor_depth.hops());
    }

    /// Selects `index`, or clears the selection when it is already selected.
    pub(super) fn click_node(&mut self, graph: &RenderGraph, index: usize) -> CameraRequest {
        if index >= graph.nodes.len() {
            return CameraRequest::None;
        }

        if self.selected_index() == Some(index) {
            debug!(account = %graph.nodes[index].id, "selection cleared");
            self.clear_selection();
            return CameraRequest::Fit;
        }

        self.select(graph, index);
        debug!(
            account = %graph.nodes[index].id,
            nodes = self.highlight.nodes.len(),
            links = self.highlight.links.len(),
            "node selected"
        );
        CameraRequest::FocusNode(index)
    }

    pub(super) fn click_background(&mut self) -> CameraRequest {
        let had_selection = self.selected.is_some();
        self.clear_selection();
        if had_selection {
            CameraRequest::Fit
        } else {
            CameraRequest::None
        }
    }

    /// Pointer entered or left a node. Hover only drives highlighting while nothing is selected.
    pub(super) fn hover(&mut self, graph: &RenderGraph, index: Option<usize>) {
        let index = index.filter(|&index| index < graph.nodes.len());
        if self.hover_node == index {
            return;
        }
        self.hover_node = index;

        if self.selected.is_some() {
            return;
        }
        match index {
            Some(index) => self.highlight = HighlightSet::adjacency(graph, index),
            None => self.highlight.clear(),
        }
    }

    pub(super) fn set_hover_link(&mut self, edge: Option<usize>) {
        self.hover_link = edge;
    }

    pub(super) fn toggle_pattern(&mut self, pattern: FraudPattern) {
        self.active_pattern = if self.active_pattern == Some(pattern) {
            None
        } else {
            Some(pattern)
        };
        debug!(pattern = ?self.active_pattern, "pattern toggled");
    }

    pub(super) fn set_neighbor_depth(&mut self, graph: Option<&RenderGraph>, depth: NeighborDepth) {
        if self.neighbor_depth == depth {
            return;
        }
        self.neighbor_depth = depth;
        if let (Some(graph), Some(index)) = (graph, self.selected_index()) {
            self.select(graph, index);
        }
    }

    /// Re-resolves indices after the render graph was rebuilt.
    pub(super) fn refresh(&mut self, graph: &RenderGraph) {
        self.hover_node = None;
        self.hover_link = None;
        self.highlight.clear();

        let Some(selection) = self.selected.take() else {
            return;
        };
        match graph.index_by_id.get(&selection.id) {
            Some(&index) => self.select(graph, index),
            None => debug!(account = %selection.id, "selected account filtered out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::super::graph::fixtures::render_graph;
    use super::*;

    fn cycle() -> RenderGraph {
        render_graph(
            &["A", "B", "C"],
            &[("A", "B", 10.0), ("B", "C", 10.0), ("C", "A", 10.0)],
        )
    }

    #[test]
    fn selecting_a_cycle_member_highlights_its_ego_network() {
        let graph = cycle();
        let a = graph.index_by_id["A"];
        let mut state = InteractionState::default();

        assert_eq!(state.click_node(&graph, a), CameraRequest::FocusNode(a));
        assert_eq!(state.selected_id(), Some("A"));
        assert_eq!(
            state.highlight().nodes,
            HashSet::from([a, graph.index_by_id["B"], graph.index_by_id["C"]])
        );
        let pairs = state
            .highlight()
            .links
            .iter()
            .map(|edge| {
                let edge = &graph.edges[*edge];
                (graph.nodes[edge.source].id.as_str(), graph.nodes[edge.target].id.as_str())
            })
            .collect::<HashSet<_>>();
        assert_eq!(pairs, HashSet::from([("A", "B"), ("C", "A")]));
    }

    #[test]
    fn selecting_the_same_node_twice_returns_to_idle() {
        let graph = cycle();
        let mut state = InteractionState::default();

        state.click_node(&graph, 0);
        assert_eq!(state.click_node(&graph, 0), CameraRequest::Fit);
        assert_eq!(state.selected_index(), None);
        assert!(state.highlight().is_empty());
        assert_eq!(state.hover_node(), None);
    }

    #[test]
    fn selecting_another_node_replaces_the_selection() {
        let graph = cycle();
        let mut state = InteractionState::default();

        state.click_node(&graph, 0);
        assert_eq!(state.click_node(&graph, 1), CameraRequest::FocusNode(1));
        assert_eq!(state.selected_index(), Some(1));
    }

    #[test]
    fn background_click_clears_and_fits_only_with_selection() {
        let graph = cycle();
        let mut state = InteractionState::default();

        assert_eq!(state.click_background(), CameraRequest::None);
        state.click_node(&graph, 2);
        assert_eq!(state.click_background(), CameraRequest::Fit);
        assert_eq!(state.selected_index(), None);
        assert!(state.highlight().is_empty());
    }

    #[test]
    fn hover_highlights_only_without_selection() {
        let graph = render_graph(&["A", "B", "C"], &[("A", "B", 10.0)]);
        let a = graph.index_by_id["A"];
        let c = graph.index_by_id["C"];
        let mut state = InteractionState::default();

        state.hover(&graph, Some(a));
        assert_eq!(state.highlight().nodes.len(), 2);
        state.hover(&graph, None);
        assert!(state.highlight().is_empty());

        state.click_node(&graph, c);
        let selected = state.highlight().clone();
        state.hover(&graph, Some(a));
        assert_eq!(state.hover_node(), Some(a));
        assert_eq!(state.highlight(), &selected);
    }

    #[test]
    fn pattern_toggle_is_exclusive() {
        let mut state = InteractionState::default();
        state.toggle_pattern(FraudPattern::Cycle);
        assert_eq!(state.active_pattern(), Some(FraudPattern::Cycle));
        state.toggle_pattern(FraudPattern::Smurfing);
        assert_eq!(state.active_pattern(), Some(FraudPattern::Smurfing));
        state.toggle_pattern(FraudPattern::Smurfing);
        assert_eq!(state.active_pattern(), None);
    }

    #[test]
    fn depth_change_recomputes_the_ego_network() {
        let graph = render_graph(&["A", "B", "C"], &[("A", "B", 10.0), ("B", "C", 10.0)]);
        let mut state = InteractionState::default();
        state.click_node(&graph, graph.index_by_id["A"]);
        assert_eq!(state.highlight().nodes.len(), 2);

        state.set_neighbor_depth(Some(&graph), NeighborDepth::Two);
        assert_eq!(state.highlight().nodes.len(), 3);
    }

    #[test]
    fn refresh_keeps_surviving_selection() {
        let graph = cycle();
        let mut state = InteractionState::default();
        state.click_node(&graph, graph.index_by_id["B"]);

        let rebuilt = render_graph(&["C", "B"], &[("B", "C", 10.0)]);
        state.refresh(&rebuilt);
        assert_eq!(state.selected_index(), Some(rebuilt.index_by_id["B"]));
        assert_eq!(state.highlight().links.len(), 1);

        let without = render_graph(&["C"], &[]);
        state.refresh(&without);
        assert_eq!(state.selected_index(), None);
        assert!(state.highlight().is_empty());
    }
}
