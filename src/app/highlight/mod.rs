use std::collections::HashSet;

use crate::analysis::TransferRecord;

mod collect;

use self::collect::{collect_adjacent, collect_ego_network};
use super::annotations::{AnnotationIndex, FraudPattern};
use super::{PatternHighlight, RenderGraph};

/// Node and edge indices emphasised by a selection or hover.
#[derive(Clone, Debug, Default, PartialEq)]
pub(super) struct HighlightSet {
    pub(super) nodes: HashSet<usize>,
    pub(super) links: HashSet<usize>,
}

impl HighlightSet {
    pub(super) fn ego_network(graph: &RenderGraph, center: usize, depth: usize) -> Self {
        let (nodes, links) = collect_ego_network(graph, center, depth);
        Self { nodes, links }
    }

    /// The hovered node plus the far endpoints of every edge touching it.
    pub(super) fn adjacency(graph: &RenderGraph, index: usize) -> Self {
        let mut set = Self::default();
        if index < graph.nodes.len() {
            set.nodes.insert(index);
            collect_adjacent(graph, index, &mut set.nodes, &mut set.links);
        }
        set
    }

    pub(super) fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }

    pub(super) fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
    }
}

pub(super) fn build_pattern_highlight(
    graph: &RenderGraph,
    annotations: &AnnotationIndex,
    transfers: &[TransferRecord],
    pattern: FraudPattern,
    graph_revision: u64,
) -> PatternHighlight {
    let nodes = annotations
        .pattern_nodes(pattern)
        .iter()
        .filter_map(|id| graph.index_by_id.get(id).copied())
        .collect::<HashSet<_>>();

    let keys = annotations.pattern_links(pattern, transfers);
    let links = graph
        .edges
        .iter()
        .enumerate()
        .filter(|(_, edge)| {
            let key = (
                graph.nodes[edge.source].id.clone(),
                graph.nodes[edge.target].id.clone(),
            );
            keys.contains(&key)
        })
        .map(|(index, _)| index)
        .collect();

    PatternHighlight {
        pattern,
        graph_revision,
        nodes,
        links,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Emphasis {
    Dimmed,
    Pattern(FraudPattern),
    Focused,
    Normal,
}

/// Which highlight source decides dimming this frame. An active pattern wins over a
/// selection or hover highlight.
#[derive(Clone, Copy, Debug)]
pub(super) enum DisplayMode<'a> {
    Pattern {
        pattern: FraudPattern,
        nodes: &'a HashSet<usize>,
        links: &'a HashSet<usize>,
    },
    Focus {
        nodes: &'a HashSet<usize>,
        links: &'a HashSet<usize>,
    },
    Plain,
}

impl<'a> DisplayMode<'a> {
    pub(super) fn resolve(
        pattern: Option<&'a PatternHighlight>,
        highlight: &'a HighlightSet,
    ) -> Self {
        if let Some(pattern) = pattern {
            return Self::Pattern {
                pattern: pattern.pattern,
                nodes: &pattern.nodes,
                links: &pattern.links,
            };
        }
        if !highlight.is_empty() {
            return Self::Focus {
                nodes: &highlight.nodes,
                links: &highlight.links,
            };
        }
        Self::Plain
    }

    pub(super) fn node_emphasis(&self, index: usize) -> Emphasis {
        match self {
            Self::Pattern { pattern, nodes, .. } if nodes.contains(&index) => {
                Emphasis::Pattern(*pattern)
            }
            Self::Focus { nodes, .. } if nodes.contains(&index) => Emphasis::Focused,
            Self::Pattern { .. } | Self::Focus { .. } => Emphasis::Dimmed,
            Self::Plain => Emphasis::Normal,
        }
    }

    pub(super) fn edge_emphasis(&self, index: usize) -> Emphasis {
        match self {
            Self::Pattern { pattern, links, .. } if links.contains(&index) => {
                Emphasis::Pattern(*pattern)
            }
            Self::Focus { links, .. } if links.contains(&index) => Emphasis::Focused,
            Self::Pattern { .. } | Self::Focus { .. } => Emphasis::Dimmed,
            Self::Plain => Emphasis::Normal,
        }
    }

    /// Any highlight or active pattern keeps the flow clock running.
    pub(super) fn animates(&self) -> bool {
        !matches!(self, Self::Plain)
    }
}
