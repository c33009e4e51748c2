//! Reduces the full graph to the neighbourhood of a ranking result.

use crate::core::graph::CourseGraph;
use crate::core::ranking::Ranking;
use crate::domain::model::{GraphNode, GraphView};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Keep only the strongest edges of each recommended course when
    /// pulling in neighbours. `None` keeps every neighbour.
    pub max_neighbors_per_node: Option<usize>,
}

/// Top-K recommended courses plus their one-hop neighbours, and every graph
/// edge between nodes of that set. Recommended nodes come first in rank
/// order, neighbours follow by ascending code.
pub fn project(
    graph: &CourseGraph,
    ranking: &Ranking,
    top_k: usize,
    config: &ProjectionConfig,
) -> GraphView {
    let catalogue = graph.catalogue();
    let courses = graph.courses();
    let recommended: Vec<usize> = ranking
        .courses
        .iter()
        .take(top_k)
        .filter_map(|r| catalogue.position(&r.code))
        .collect();
    let recommended_set: HashSet<usize> = recommended.iter().copied().collect();

    let mut neighbors = BTreeSet::new();
    for &node in &recommended {
        let mut adjacent: Vec<(usize, f64)> = graph.neighbors(node).to_vec();
        if let Some(cap) = config.max_neighbors_per_node {
            adjacent.sort_by(|a, b| {
                b.1.total_cmp(&a.1)
                    .then_with(|| courses[a.0].code.cmp(&courses[b.0].code))
            });
            adjacent.truncate(cap);
        }
        neighbors.extend(
            adjacent
                .into_iter()
                .map(|(n, _)| n)
                .filter(|n| !recommended_set.contains(n)),
        );
    }

    let score_of = |node: usize| -> f64 {
        ranking
            .node_scores
            .get(&courses[node].code)
            .copied()
            .unwrap_or(0.0)
    };
    let node_for = |node: usize, is_recommended: bool| {
        let course = &courses[node];
        GraphNode {
            code: course.code.clone(),
            label: course.name.clone(),
            score: score_of(node),
            is_recommended,
            group: Some(course.group.clone()).filter(|g| !g.is_empty()),
        }
    };

    let mut nodes: Vec<GraphNode> = recommended.iter().map(|&n| node_for(n, true)).collect();
    nodes.extend(neighbors.iter().map(|&n| node_for(n, false)));

    let in_view: HashSet<&str> = nodes.iter().map(|n| n.code.as_str()).collect();
    let edges = graph
        .edges()
        .iter()
        .filter(|e| in_view.contains(e.source.as_str()) && in_view.contains(e.target.as_str()))
        .cloned()
        .collect();

    tracing::debug!(
        "Projected graph view: {} recommended, {} neighbours",
        recommended.len(),
        neighbors.len()
    );
    GraphView { nodes, edges }
}
