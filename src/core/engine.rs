//! Process-wide recommendation engine over an immutable, swappable state.

use crate::core::cache::{self, RankingCache, DEFAULT_CACHE_SIZE};
use crate::core::catalogue::Catalogue;
use crate::core::graph::{build_graph, CourseGraph, GraphBuildConfig};
use crate::core::pagerank::{self, PageRankResult};
use crate::core::projection::{self, ProjectionConfig};
use crate::core::ranking::{self, Ranking, RankingConfig};
use crate::domain::model::{GraphView, StudentProfile};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub graph: GraphBuildConfig,
    pub ranking: RankingConfig,
    pub projection: ProjectionConfig,
    pub cache_size: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            graph: GraphBuildConfig::default(),
            ranking: RankingConfig::default(),
            projection: ProjectionConfig::default(),
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

/// Everything a ranking call reads. Never mutated once built.
#[derive(Debug)]
pub struct EngineState {
    pub graph: CourseGraph,
    pub centrality: PageRankResult,
    pub generation: u64,
}

impl EngineState {
    fn build(catalogue: Catalogue, settings: &EngineSettings, generation: u64) -> Self {
        let graph = build_graph(catalogue, &settings.graph);
        let centrality = pagerank::global_pagerank(&graph, &settings.ranking.pagerank());
        tracing::debug!(
            "Global PageRank for generation {} converged={} after {} iterations",
            generation,
            centrality.converged,
            centrality.iterations
        );
        Self {
            graph,
            centrality,
            generation,
        }
    }
}

pub struct RecommendationEngine {
    settings: EngineSettings,
    state: RwLock<Arc<EngineState>>,
    cache: RankingCache,
    generations: AtomicU64,
}

impl RecommendationEngine {
    pub fn new(catalogue: Catalogue, settings: EngineSettings) -> Self {
        let state = EngineState::build(catalogue, &settings, 0);
        Self {
            cache: RankingCache::new(settings.cache_size),
            settings,
            state: RwLock::new(Arc::new(state)),
            generations: AtomicU64::new(0),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Current state. Callers holding the returned `Arc` keep a consistent
    /// view even if a reload happens meanwhile.
    pub fn snapshot(&self) -> Arc<EngineState> {
        let guard = self.state.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    pub fn rank(&self, profile: &StudentProfile, top_k: usize) -> Arc<Ranking> {
        self.rank_in(&self.snapshot(), profile, top_k)
    }

    fn rank_in(&self, state: &EngineState, profile: &StudentProfile, top_k: usize) -> Arc<Ranking> {
        let key = cache::cache_key(profile, &self.settings.ranking, top_k, state.generation);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!("Ranking cache hit");
            return hit;
        }

        let mut result = ranking::rank_with_centrality(
            profile,
            &state.graph,
            top_k,
            &self.settings.ranking,
            Some(&state.centrality),
        );
        result.generation = state.generation;
        let result = Arc::new(result);
        self.cache.insert(key, Arc::clone(&result));
        result
    }

    /// Projects `ranking` onto the current graph. A ranking from an older
    /// generation is still projected, but courses dropped by the reload
    /// disappear from the view.
    pub fn graph_view(&self, ranking: &Ranking, top_k: usize) -> GraphView {
        let state = self.snapshot();
        if ranking.generation != state.generation {
            tracing::warn!(
                "Projecting a generation {} ranking onto generation {} graph",
                ranking.generation,
                state.generation
            );
        }
        projection::project(&state.graph, ranking, top_k, &self.settings.projection)
    }

    /// Ranks and projects against one snapshot, so both halves agree even
    /// when a reload lands in between.
    pub fn recommend(&self, profile: &StudentProfile, top_k: usize) -> (Arc<Ranking>, GraphView) {
        let state = self.snapshot();
        let ranking = self.rank_in(&state, profile, top_k);
        let view = projection::project(&state.graph, &ranking, top_k, &self.settings.projection);
        (ranking, view)
    }

    /// Builds a new state off-lock, then swaps it in and drops cached
    /// rankings of the previous generation.
    pub fn reload(&self, catalogue: Catalogue) {
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let next = Arc::new(EngineState::build(catalogue, &self.settings, generation));
        {
            let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
            *guard = next;
        }
        self.cache.clear();
        tracing::info!("Engine state swapped to generation {}", generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalogue::tests::course;

    fn engine() -> RecommendationEngine {
        let catalogue = Catalogue::new(vec![
            course("100", "Distributed Systems", "SYSTEMS"),
            course("200", "Operating Systems", "SYSTEMS"),
            course("300", "Painting", "ARTS"),
        ])
        .unwrap();
        RecommendationEngine::new(catalogue, EngineSettings::default())
    }

    fn profile(json: &str) -> StudentProfile {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_rank_is_cached_per_generation() {
        let engine = engine();
        let p = profile(r#"{"interests": ["operating systems"]}"#);
        let first = engine.rank(&p, 2);
        let second = engine.rank(&p, 2);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.courses[0].code, "200");
    }

    #[test]
    fn test_cached_rank_matches_direct_rank() {
        let catalogue = Catalogue::new(vec![
            course("A", "Robotics", "ENGINEERING"),
            course("B", "Machine Learning", "COMPUTING"),
        ])
        .unwrap();
        let engine = RecommendationEngine::new(catalogue, EngineSettings::default());

        let plain = profile(r#"{"interests": ["robotics", "machine learning"]}"#);
        let repeated = profile(r#"{"interests": ["robotics", "Robotics", "machine learning"]}"#);
        engine.rank(&plain, 2);
        let cached = engine.rank(&repeated, 2);

        let state = engine.snapshot();
        let direct = ranking::rank(&repeated, &state.graph, 2, &engine.settings().ranking);
        assert_eq!(cached.codes(), direct.codes());
        for (c, d) in cached.courses.iter().zip(&direct.courses) {
            assert!((c.score - d.score).abs() < 1e-12);
            assert_eq!(c.explanation, d.explanation);
        }
    }

    #[test]
    fn test_recommend_projects_the_ranked_generation() {
        let engine = engine();
        let p = profile(r#"{"interests": ["distributed"]}"#);
        let (ranking, view) = engine.recommend(&p, 1);
        assert_eq!(ranking.generation, 0);
        assert_eq!(view.nodes[0].code, "100");

        engine.reload(Catalogue::new(vec![course("300", "Painting", "ARTS")]).unwrap());
        let (ranking, view) = engine.recommend(&p, 1);
        assert_eq!(ranking.generation, 1);
        assert_eq!(view.nodes[0].code, "300");
    }

    #[test]
    fn test_reload_swaps_state_and_clears_cache() {
        let engine = engine();
        let p = profile(r#"{"interests": ["painting"]}"#);
        let before = engine.rank(&p, 3);
        assert_eq!(before.courses.len(), 3);

        engine.reload(Catalogue::new(vec![course("300", "Painting", "ARTS")]).unwrap());
        assert_eq!(engine.snapshot().generation, 1);
        let after = engine.rank(&p, 3);
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.codes(), vec!["300"]);
    }

    #[test]
    fn test_graph_view_uses_current_graph() {
        let engine = engine();
        let ranking = engine.rank(&profile(r#"{"interests": ["distributed"]}"#), 1);
        let view = engine.graph_view(&ranking, 1);
        let codes: Vec<&str> = view.nodes.iter().map(|n| n.code.as_str()).collect();
        assert_eq!(codes, vec!["100", "200"]);
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        let engine = Arc::new(engine());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    engine
                        .rank(&StudentProfile::default(), 3)
                        .codes()
                        .iter()
                        .map(|c| c.to_string())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let results: Vec<Vec<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }
}
