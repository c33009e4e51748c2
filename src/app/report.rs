use crate::core::engine::EngineState;
use crate::core::graph::{AdjacencyJson, GraphStats};
use crate::core::Storage;
use crate::utils::error::Result;
use serde::Serialize;

pub const ADJACENCY_FILENAME: &str = "graph_adjacency.json";
pub const REPORT_FILENAME: &str = "graph_report.json";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentralCourse {
    pub code: String,
    pub name: String,
    pub score: f64,
    pub degree: usize,
}

/// Structural summary of a built graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphReport {
    pub stats: GraphStats,
    pub pagerank_converged: bool,
    pub pagerank_iterations: usize,
    pub most_central: Vec<CentralCourse>,
}

impl GraphReport {
    pub fn from_state(state: &EngineState, top_n: usize) -> Self {
        let graph = &state.graph;
        let mut central: Vec<CentralCourse> = graph
            .courses()
            .iter()
            .zip(&state.centrality.scores)
            .enumerate()
            .map(|(i, (course, &score))| CentralCourse {
                code: course.code.clone(),
                name: course.name.clone(),
                score,
                degree: graph.degree(i),
            })
            .collect();
        central.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.code.cmp(&b.code)));
        central.truncate(top_n);

        Self {
            stats: graph.stats(),
            pagerank_converged: state.centrality.converged,
            pagerank_iterations: state.centrality.iterations,
            most_central: central,
        }
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "{} courses, {} edges, average degree {:.2}, {} isolated",
            self.stats.nodes, self.stats.edges, self.stats.avg_degree, self.stats.isolated
        )];
        for (i, c) in self.most_central.iter().enumerate() {
            lines.push(format!(
                "{:>3}. {:<12} {:.5}  deg {:>3}  {}",
                i + 1,
                c.code,
                c.score,
                c.degree,
                c.name
            ));
        }
        lines
    }
}

/// Writes the report and the adjacency export, returning the file names.
pub async fn write_report<S: Storage>(
    storage: &S,
    report: &GraphReport,
    adjacency: &AdjacencyJson,
) -> Result<Vec<&'static str>> {
    storage
        .write_file(REPORT_FILENAME, &serde_json::to_vec_pretty(report)?)
        .await?;
    storage
        .write_file(ADJACENCY_FILENAME, &serde_json::to_vec_pretty(adjacency)?)
        .await?;
    Ok(vec![REPORT_FILENAME, ADJACENCY_FILENAME])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalogue::tests::course;
    use crate::core::catalogue::Catalogue;
    use crate::core::engine::{EngineSettings, RecommendationEngine};

    #[test]
    fn test_report_orders_by_centrality() {
        let catalogue = Catalogue::new(vec![
            course("100", "Distributed Systems", "SYSTEMS"),
            course("200", "Operating Systems", "SYSTEMS"),
            course("300", "Computer Systems", "SYSTEMS"),
            course("400", "Painting", "ARTS"),
        ])
        .unwrap();
        let engine = RecommendationEngine::new(catalogue, EngineSettings::default());
        let report = GraphReport::from_state(&engine.snapshot(), 2);

        assert_eq!(report.stats.nodes, 4);
        assert_eq!(report.stats.isolated, 1);
        assert_eq!(report.most_central.len(), 2);
        assert!(report.most_central.iter().all(|c| c.code != "400"));
        assert!(report.summary_lines()[0].starts_with("4 courses, 3 edges"));
    }
}
