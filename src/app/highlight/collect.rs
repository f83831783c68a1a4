use std::collections::HashSet;

use super::super::RenderGraph;

fn touching_edges(graph: &RenderGraph, index: usize) -> impl Iterator<Item = usize> + '_ {
    let outgoing = graph.outgoing.get(index).into_iter().flatten();
    let incoming = graph.incoming.get(index).into_iter().flatten();
    outgoing.chain(incoming).copied()
}

fn other_endpoint(graph: &RenderGraph, edge_index: usize, from: usize) -> Option<usize> {
    let edge = graph.edges.get(edge_index)?;
    Some(if edge.source == from {
        edge.target
    } else {
        edge.source
    })
}

/// Adds every edge touching `index` plus its far endpoints. Returns the newly reached nodes.
pub(super) fn collect_adjacent(
    graph: &RenderGraph,
    index: usize,
    nodes: &mut HashSet<usize>,
    links: &mut HashSet<usize>,
) -> Vec<usize> {
    let mut reached = Vec::new();
    for edge_index in touching_edges(graph, index) {
        links.insert(edge_index);
        if let Some(neighbor) = other_endpoint(graph, edge_index, index)
            && nodes.insert(neighbor)
        {
            reached.push(neighbor);
        }
    }
    reached
}

/// Ego network around `center`. With `depth >= 2` every edge touching a first-hop neighbor
/// is included together with its far endpoint.
pub(super) fn collect_ego_network(
    graph: &RenderGraph,
    center: usize,
    depth: usize,
) -> (HashSet<usize>, HashSet<usize>) {
    let mut nodes = HashSet::new();
    let mut links = HashSet::new();
    if center >= graph.nodes.len() {
        return (nodes, links);
    }

    nodes.insert(center);
    let first_hop = collect_adjacent(graph, center, &mut nodes, &mut links);

    if depth >= 2 {
        for neighbor in first_hop {
            collect_adjacent(graph, neighbor, &mut nodes, &mut links);
        }
    }

    (nodes, links)
}

#[cfg(test)]
mod tests {
    use super::super::super::graph::fixtures::render_graph;
    use super::*;

    fn ids(graph: &RenderGraph, nodes: &HashSet<usize>) -> Vec<String> {
        let mut ids = nodes
            .iter()
            .map(|index| graph.nodes[*index].id.clone())
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }

    fn pairs(graph: &RenderGraph, links: &HashSet<usize>) -> Vec<(String, String)> {
        let mut pairs = links
            .iter()
            .map(|edge| {
                let edge = &graph.edges[*edge];
                (
                    graph.nodes[edge.source].id.clone(),
                    graph.nodes[edge.target].id.clone(),
                )
            })
            .collect::<Vec<_>>();
        pairs.sort();
        pairs
    }

    #[test]
    fn depth_one_takes_edges_in_both_directions() {
        let graph = render_graph(
            &["A", "B", "C"],
            &[("A", "B", 10.0), ("B", "C", 10.0), ("C", "A", 10.0)],
        );
        let (nodes, links) = collect_ego_network(&graph, graph.index_by_id["A"], 1);

        assert_eq!(ids(&graph, &nodes), vec!["A", "B", "C"]);
        assert_eq!(
            pairs(&graph, &links),
            vec![
                ("A".to_owned(), "B".to_owned()),
                ("C".to_owned(), "A".to_owned()),
            ]
        );
    }

    #[test]
    fn depth_two_includes_edges_of_first_hop_neighbors() {
        let graph = render_graph(
            &["A", "B", "C", "D", "E"],
            &[("A", "B", 10.0), ("B", "C", 10.0), ("D", "C", 10.0), ("E", "D", 10.0)],
        );
        let center = graph.index_by_id["A"];

        let (nodes, _) = collect_ego_network(&graph, center, 1);
        assert_eq!(ids(&graph, &nodes), vec!["A", "B"]);

        let (nodes, links) = collect_ego_network(&graph, center, 2);
        assert_eq!(ids(&graph, &nodes), vec!["A", "B", "C"]);
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn out_of_range_center_is_empty() {
        let graph = render_graph(&["A"], &[]);
        let (nodes, links) = collect_ego_network(&graph, 7, 2);
        assert!(nodes.is_empty() && links.is_empty());
    }
}
