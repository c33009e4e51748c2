//! Course similarity graph: construction and query interface.

use crate::core::catalogue::Catalogue;
use crate::core::text::{self, TokenSet};
use crate::domain::model::{Course, CourseEdge, ReasonKind, ReasonTag, UNKNOWN};
use crate::utils::error::{RecoError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Signal weights and thresholds for edge construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphBuildConfig {
    pub w_group: f64,
    pub w_ssd: f64,
    pub w_text: f64,
    pub text_sim_threshold: f64,
    pub w_instructor: f64,
    pub w_semester: f64,
    pub w_language: f64,
    /// Pairs whose aggregate weight stays below this get no edge.
    pub min_edge_weight: f64,
    pub max_edge_weight: f64,
}

impl Default for GraphBuildConfig {
    fn default() -> Self {
        Self {
            w_group: 0.6,
            w_ssd: 0.9,
            w_text: 1.0,
            text_sim_threshold: 0.18,
            w_instructor: 0.3,
            w_semester: 0.05,
            w_language: 0.05,
            min_edge_weight: 0.2,
            max_edge_weight: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub avg_degree: f64,
    pub isolated: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub code: String,
    pub weight: f64,
}

/// `{code: [{code, weight}, ...]}`, neighbours by descending weight then code.
pub type AdjacencyJson = BTreeMap<String, Vec<Neighbor>>;

/// Weighted undirected graph over a catalogue. Every course is a node,
/// including those with no qualifying edge.
#[derive(Debug, Clone)]
pub struct CourseGraph {
    catalogue: Catalogue,
    tokens: Vec<TokenSet>,
    edges: Vec<CourseEdge>,
    adjacency: Vec<Vec<(usize, f64)>>,
}

struct CourseFeatures {
    group: String,
    ssd: BTreeSet<String>,
    lecturer: Option<String>,
}

impl CourseFeatures {
    fn of(course: &Course) -> Self {
        let group = text::normalize_label(&course.group);
        let ssd = course
            .ssd
            .iter()
            .map(|s| text::normalize_label(s))
            .filter(|s| !s.is_empty())
            .collect();
        let lecturer = course
            .lecturer
            .as_deref()
            .map(text::normalize_label)
            .filter(|l| !l.is_empty());
        Self { group, ssd, lecturer }
    }
}

/// Builds the similarity graph. Pairs are visited in ascending code order,
/// so the output depends only on catalogue content.
pub fn build_graph(catalogue: Catalogue, config: &GraphBuildConfig) -> CourseGraph {
    let courses = catalogue.courses();
    let tokens: Vec<TokenSet> = courses
        .iter()
        .map(|c| text::course_tokens(&c.name, &c.description, &c.keywords))
        .collect();
    let features: Vec<CourseFeatures> = courses.iter().map(CourseFeatures::of).collect();

    let mut edges = Vec::new();
    for i in 0..courses.len() {
        for j in (i + 1)..courses.len() {
            if let Some(edge) = score_pair(
                (&courses[i], &features[i], &tokens[i]),
                (&courses[j], &features[j], &tokens[j]),
                config,
            ) {
                edges.push((i, j, edge));
            }
        }
    }

    let graph = CourseGraph::assemble(catalogue, tokens, edges);
    let stats = graph.stats();
    tracing::info!(
        "Built course graph: {} nodes, {} edges, avg degree {:.2}, {} isolated",
        stats.nodes,
        stats.edges,
        stats.avg_degree,
        stats.isolated
    );
    graph
}

fn score_pair(
    (a, fa, ta): (&Course, &CourseFeatures, &TokenSet),
    (b, fb, tb): (&Course, &CourseFeatures, &TokenSet),
    config: &GraphBuildConfig,
) -> Option<CourseEdge> {
    let mut reasons = Vec::new();

    if !fa.group.is_empty() && fa.group != UNKNOWN && fa.group == fb.group {
        reasons.push(ReasonTag::new(ReasonKind::GroupMatch, fa.group.clone(), config.w_group));
    }

    let shared_ssd: Vec<&String> = fa.ssd.intersection(&fb.ssd).collect();
    if !shared_ssd.is_empty() {
        let value = shared_ssd
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        reasons.push(ReasonTag::new(ReasonKind::SectorMatch, value, config.w_ssd));
    }

    let concepts = text::shared_tokens(ta, tb);
    let sim = text::jaccard(ta, tb);
    if sim > 0.0 && sim >= config.text_sim_threshold {
        reasons.push(ReasonTag::new(
            ReasonKind::KeywordMatch,
            concepts.join(", "),
            config.w_text * sim,
        ));
    }

    if let (Some(la), Some(lb)) = (&fa.lecturer, &fb.lecturer) {
        if la == lb {
            reasons.push(ReasonTag::new(
                ReasonKind::InstructorMatch,
                la.clone(),
                config.w_instructor,
            ));
        }
    }

    if a.semester != 0 && a.semester == b.semester {
        reasons.push(ReasonTag::new(
            ReasonKind::SemesterMatch,
            a.semester.to_string(),
            config.w_semester,
        ));
    }

    if a.has_known_language() && a.language == b.language {
        reasons.push(ReasonTag::new(
            ReasonKind::LanguageMatch,
            a.language.clone(),
            config.w_language,
        ));
    }

    reasons.retain(|r| r.contribution > 0.0);
    let total: f64 = reasons.iter().map(|r| r.contribution).sum();
    if reasons.is_empty() || total < config.min_edge_weight {
        return None;
    }

    Some(CourseEdge {
        source: a.code.clone(),
        target: b.code.clone(),
        weight: total.min(config.max_edge_weight),
        concepts,
        reasons,
    })
}

impl CourseGraph {
    fn assemble(
        catalogue: Catalogue,
        tokens: Vec<TokenSet>,
        pairs: Vec<(usize, usize, CourseEdge)>,
    ) -> Self {
        let mut adjacency = vec![Vec::new(); catalogue.len()];
        let mut edges = Vec::with_capacity(pairs.len());

        for (i, j, edge) in pairs {
            adjacency[i].push((j, edge.weight));
            adjacency[j].push((i, edge.weight));
            edges.push(edge);
        }
        for neighbors in &mut adjacency {
            neighbors.sort_by_key(|&(n, _)| n);
        }

        Self {
            catalogue,
            tokens,
            edges,
            adjacency,
        }
    }

    /// Builds a graph from explicit weighted pairs instead of computed
    /// similarity. Duplicate pairs are merged by summing (clipped to 1.0);
    /// self-loops and non-positive weights are skipped.
    pub fn from_edges(catalogue: Catalogue, edges: &[(String, String, f64)]) -> Result<Self> {
        let mut merged: BTreeMap<(usize, usize), f64> = BTreeMap::new();

        for (a, b, weight) in edges {
            let ia = catalogue
                .position(a)
                .ok_or_else(|| RecoError::UnknownCourse { code: a.clone() })?;
            let ib = catalogue
                .position(b)
                .ok_or_else(|| RecoError::UnknownCourse { code: b.clone() })?;

            if ia == ib || !weight.is_finite() || *weight <= 0.0 {
                tracing::debug!("Skipping edge {} - {} (weight {})", a, b, weight);
                continue;
            }
            *merged.entry((ia.min(ib), ia.max(ib))).or_default() += weight;
        }

        let courses = catalogue.courses();
        let pairs = merged
            .into_iter()
            .map(|((i, j), weight)| {
                let edge = CourseEdge {
                    source: courses[i].code.clone(),
                    target: courses[j].code.clone(),
                    weight: weight.min(1.0),
                    concepts: Vec::new(),
                    reasons: Vec::new(),
                };
                (i, j, edge)
            })
            .collect();

        let tokens = courses
            .iter()
            .map(|c| text::course_tokens(&c.name, &c.description, &c.keywords))
            .collect();

        Ok(Self::assemble(catalogue, tokens, pairs))
    }

    /// Inverse of [`CourseGraph::adjacency_json`].
    pub fn from_adjacency(catalogue: Catalogue, adjacency: &AdjacencyJson) -> Result<Self> {
        let mut pairs: BTreeMap<(String, String), f64> = BTreeMap::new();
        for (code, neighbors) in adjacency {
            for n in neighbors {
                let key = if *code <= n.code {
                    (code.clone(), n.code.clone())
                } else {
                    (n.code.clone(), code.clone())
                };
                // both directions carry the same weight in an export
                pairs.entry(key).or_insert(n.weight);
            }
        }
        let edges: Vec<(String, String, f64)> =
            pairs.into_iter().map(|((a, b), w)| (a, b, w)).collect();
        Self::from_edges(catalogue, &edges)
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn courses(&self) -> &[Course] {
        self.catalogue.courses()
    }

    pub fn node_count(&self) -> usize {
        self.catalogue.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges in ascending `(source, target)` order.
    pub fn edges(&self) -> &[CourseEdge] {
        &self.edges
    }

    pub fn neighbors(&self, node: usize) -> &[(usize, f64)] {
        &self.adjacency[node]
    }

    pub fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }

    /// Sum of incident edge weights.
    pub fn strength(&self, node: usize) -> f64 {
        self.adjacency[node].iter().map(|&(_, w)| w).sum()
    }

    pub fn tokens(&self, node: usize) -> &TokenSet {
        &self.tokens[node]
    }

    pub fn stats(&self) -> GraphStats {
        let nodes = self.node_count();
        let isolated = self.adjacency.iter().filter(|n| n.is_empty()).count();
        let avg_degree = if nodes == 0 {
            0.0
        } else {
            (2 * self.edges.len()) as f64 / nodes as f64
        };
        GraphStats {
            nodes,
            edges: self.edges.len(),
            avg_degree,
            isolated,
        }
    }

    pub fn adjacency_json(&self) -> AdjacencyJson {
        let courses = self.courses();
        courses
            .iter()
            .enumerate()
            .map(|(i, course)| {
                let mut neighbors: Vec<Neighbor> = self.adjacency[i]
                    .iter()
                    .map(|&(j, weight)| Neighbor {
                        code: courses[j].code.clone(),
                        weight,
                    })
                    .collect();
                neighbors.sort_by(|a, b| b.weight.total_cmp(&a.weight).then_with(|| a.code.cmp(&b.code)));
                (course.code.clone(), neighbors)
            })
            .collect()
    }
}
