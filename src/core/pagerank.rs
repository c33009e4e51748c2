//! `PageRank` variants over the course graph.

use crate::core::graph::CourseGraph;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankConfig {
    pub damping: f64,
    /// Stop once the L1 change between iterations falls below this.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iterations: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageRankResult {
    /// Indexed like `graph.courses()`, summing to 1 (or empty).
    pub scores: Vec<f64>,
    /// Teleport distribution actually used.
    pub teleport: Vec<f64>,
    /// Sum of the raw fixed point before normalisation.
    pub raw_total: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl PageRankResult {
    fn empty() -> Self {
        Self {
            scores: Vec::new(),
            teleport: Vec::new(),
            raw_total: 0.0,
            iterations: 0,
            converged: true,
        }
    }

    /// Share of a node's score coming straight from teleportation rather
    /// than from its neighbours, in [0, 1].
    pub fn direct_share(&self, node: usize, damping: f64) -> f64 {
        let raw = self.scores[node] * self.raw_total;
        if raw <= 0.0 {
            return 0.0;
        }
        ((1.0 - damping) * self.teleport[node] / raw).clamp(0.0, 1.0)
    }
}

/// Normalises to a probability vector, falling back to uniform when the
/// input carries no mass.
fn teleport_vector(n: usize, personalization: Option<&[f64]>) -> Vec<f64> {
    let uniform = || vec![1.0 / n as f64; n];
    let Some(p) = personalization else {
        return uniform();
    };
    let total: f64 = p.iter().filter(|v| v.is_finite() && **v > 0.0).sum();
    if total <= 0.0 {
        return uniform();
    }
    p.iter()
        .map(|&v| if v.is_finite() && v > 0.0 { v / total } else { 0.0 })
        .collect()
}

fn normalize(scores: &mut [f64]) -> f64 {
    let total: f64 = scores.iter().sum();
    if total > 0.0 {
        for s in scores.iter_mut() {
            *s /= total;
        }
    }
    total
}

fn l1_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

/// Random-walk `PageRank`: each node splits its score across neighbours in
/// proportion to edge weight. Mass on zero-degree nodes is redistributed
/// along the teleport vector. `None` personalization means uniform teleport.
pub fn pagerank(
    graph: &CourseGraph,
    config: &PageRankConfig,
    personalization: Option<&[f64]>,
) -> PageRankResult {
    let n = graph.node_count();
    if n == 0 {
        return PageRankResult::empty();
    }

    let d = config.damping;
    let teleport = teleport_vector(n, personalization);
    let strength: Vec<f64> = (0..n).map(|i| graph.strength(i)).collect();

    let mut ranks = teleport.clone();
    let mut next = vec![0.0; n];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        iterations += 1;

        let dangling: f64 = (0..n)
            .filter(|&i| strength[i] <= 0.0)
            .map(|i| ranks[i])
            .sum();
        for i in 0..n {
            next[i] = (1.0 - d) * teleport[i] + d * dangling * teleport[i];
        }
        for u in 0..n {
            if strength[u] <= 0.0 {
                continue;
            }
            let share = d * ranks[u] / strength[u];
            for &(v, w) in graph.neighbors(u) {
                next[v] += share * w;
            }
        }

        let diff = l1_diff(&ranks, &next);
        std::mem::swap(&mut ranks, &mut next);
        if diff < config.tolerance {
            converged = true;
            break;
        }
    }

    let raw_total = normalize(&mut ranks);
    PageRankResult {
        scores: ranks,
        teleport,
        raw_total,
        iterations,
        converged,
    }
}

/// Uniform-teleport `PageRank`: plain graph centrality.
pub fn global_pagerank(graph: &CourseGraph, config: &PageRankConfig) -> PageRankResult {
    pagerank(graph, config, None)
}

/// Seeded diffusion with restart: `r = (1 - d) p + d S r` where
/// `S = D^-1/2 W D^-1/2`. Degree-balanced propagation keeps scores
/// decaying with graph distance from the seed instead of pooling on hubs.
/// Zero-degree nodes keep only their restart share.
pub fn personalized_pagerank(
    graph: &CourseGraph,
    config: &PageRankConfig,
    seed: &[f64],
) -> PageRankResult {
    let n = graph.node_count();
    if n == 0 {
        return PageRankResult::empty();
    }

    let d = config.damping;
    let teleport = teleport_vector(n, Some(seed));
    let inv_sqrt: Vec<f64> = (0..n)
        .map(|i| {
            let s = graph.strength(i);
            if s > 0.0 {
                1.0 / s.sqrt()
            } else {
                0.0
            }
        })
        .collect();

    let mut ranks = teleport.clone();
    let mut next = vec![0.0; n];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        iterations += 1;

        for v in 0..n {
            let spread: f64 = graph
                .neighbors(v)
                .iter()
                .map(|&(u, w)| ranks[u] * w * inv_sqrt[u])
                .sum();
            next[v] = (1.0 - d) * teleport[v] + d * inv_sqrt[v] * spread;
        }

        let diff = l1_diff(&ranks, &next);
        std::mem::swap(&mut ranks, &mut next);
        if diff < config.tolerance {
            converged = true;
            break;
        }
    }

    let raw_total = normalize(&mut ranks);
    PageRankResult {
        scores: ranks,
        teleport,
        raw_total,
        iterations,
        converged,
    }
}
