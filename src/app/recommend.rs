use crate::adapters::catalogue::{load_catalogue, source_for};
use crate::app::output::{RecommendationDocument, CSV_FILENAME, JSON_FILENAME};
use crate::core::engine::RecommendationEngine;
use crate::core::{ConfigProvider, Storage};
use crate::domain::model::StudentProfile;
use crate::utils::error::Result;
use crate::utils::monitor::PhaseMonitor;
use std::path::Path;

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub recommended: usize,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub files: Vec<String>,
}

/// Reads a profile file. A missing path means an empty profile; a document
/// that is not a JSON object is treated as empty too.
pub async fn load_profile(path: Option<&str>) -> Result<StudentProfile> {
    let Some(path) = path else {
        tracing::info!("No profile given, ranking by graph centrality");
        return Ok(StudentProfile::default());
    };

    let bytes = tokio::fs::read(Path::new(path)).await?;
    let document: serde_json::Value = serde_json::from_slice(&bytes)?;
    if !document.is_object() {
        tracing::warn!("Profile {} is not a JSON object, using an empty profile", path);
        return Ok(StudentProfile::default());
    }
    let profile: StudentProfile = serde_json::from_value(document)?;
    if profile.is_empty() {
        tracing::info!("Profile {} carries no usable preferences", path);
    }
    Ok(profile)
}

/// Catalogue → engine → ranking → graph view → output files.
pub struct RecommendJob<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    monitor: PhaseMonitor,
}

impl<S: Storage, C: ConfigProvider> RecommendJob<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self::new_with_monitoring(storage, config, false)
    }

    pub fn new_with_monitoring(storage: S, config: C, monitor_enabled: bool) -> Self {
        Self {
            storage,
            config,
            monitor: PhaseMonitor::new(monitor_enabled),
        }
    }

    pub async fn build_engine(&self) -> Result<RecommendationEngine> {
        let source = source_for(self.config.catalogue_kind(), self.config.catalogue_location())?;
        let catalogue = load_catalogue(source.as_ref()).await?;
        self.monitor.end_phase("catalogue");

        let engine = RecommendationEngine::new(catalogue, self.config.engine_settings());
        self.monitor.end_phase("graph");
        Ok(engine)
    }

    pub async fn run(&self, profile: &StudentProfile) -> Result<RunSummary> {
        tracing::info!("🚀 Starting recommendation run");
        let engine = self.build_engine().await?;
        let summary = self.run_with_engine(&engine, profile).await?;
        self.monitor.log_final_stats();
        Ok(summary)
    }

    pub async fn run_with_engine(
        &self,
        engine: &RecommendationEngine,
        profile: &StudentProfile,
    ) -> Result<RunSummary> {
        let top_k = self.config.top_k();
        let (ranking, graph_view) = engine.recommend(profile, top_k);
        tracing::info!(
            "Ranked {} courses ({:?} mode, {} iterations)",
            ranking.courses.len(),
            ranking.mode,
            ranking.iterations
        );
        if !ranking.converged {
            tracing::warn!("Propagation stopped at the iteration cap before converging");
        }
        self.monitor.end_phase("ranking");

        let document = RecommendationDocument::new(top_k, ranking.courses.clone(), graph_view);
        let files = self.write_outputs(&document).await?;
        self.monitor.end_phase("output");

        Ok(RunSummary {
            recommended: document.recommendations.len(),
            graph_nodes: document.graph_view.nodes.len(),
            graph_edges: document.graph_view.edges.len(),
            files,
        })
    }

    async fn write_outputs(&self, document: &RecommendationDocument) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for format in self.config.output_formats() {
            let (name, data) = match format.as_str() {
                "json" => (JSON_FILENAME, document.to_json()?),
                "csv" => (CSV_FILENAME, document.to_csv()?),
                other => {
                    tracing::warn!("Skipping unsupported output format '{}'", other);
                    continue;
                }
            };
            self.storage.write_file(name, &data).await?;
            let full = format!("{}/{}", self.config.output_path(), name);
            tracing::info!("📁 Wrote {}", full);
            files.push(full);
        }
        Ok(files)
    }
}
