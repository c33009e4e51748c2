use anyhow::Context;
use clap::Parser;
use course_reco::adapters::catalogue::{load_catalogue, source_for};
use course_reco::app::report::{write_report, GraphReport};
use course_reco::core::ConfigProvider;
use course_reco::utils::{logger, monitor::PhaseMonitor, validation::Validate};
use course_reco::{EngineSettings, LocalStorage, RecommendationEngine, TomlConfig};

#[derive(Parser)]
#[command(name = "graph-report")]
#[command(about = "Summarise the course similarity graph and export its adjacency")]
struct Args {
    /// Catalogue file path or HTTP URL
    #[arg(long, default_value = "demos/courses.json")]
    catalogue: String,

    #[arg(long, default_value = "auto")]
    catalogue_type: String,

    /// TOML configuration; its catalogue and graph settings win over flags
    #[arg(short, long)]
    config: Option<String>,

    /// How many of the most central courses to list
    #[arg(long, default_value = "10")]
    top: usize,

    /// Directory for graph_report.json and graph_adjacency.json
    #[arg(long)]
    output_path: Option<String>,

    #[arg(short, long)]
    verbose: bool,

    #[arg(long)]
    monitor: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let (kind, location, settings) = match &args.config {
        Some(path) => {
            let config = TomlConfig::from_file(path)
                .with_context(|| format!("failed to load config file '{}'", path))?;
            config.validate().context("invalid configuration")?;
            (
                config.catalogue_kind().to_string(),
                config.catalogue_location().to_string(),
                config.engine_settings(),
            )
        }
        None => (
            args.catalogue_type.clone(),
            args.catalogue.clone(),
            EngineSettings::default(),
        ),
    };

    let monitor = PhaseMonitor::new(args.monitor);
    let source = source_for(&kind, &location)?;
    let catalogue = load_catalogue(source.as_ref())
        .await
        .with_context(|| format!("failed to load catalogue from {}", source.describe()))?;
    monitor.end_phase("catalogue");

    let engine = RecommendationEngine::new(catalogue, settings);
    monitor.end_phase("graph");

    let state = engine.snapshot();
    let report = GraphReport::from_state(&state, args.top);
    for line in report.summary_lines() {
        println!("{}", line);
    }

    if let Some(dir) = &args.output_path {
        let storage = LocalStorage::new(dir.as_str());
        let files = write_report(&storage, &report, &state.graph.adjacency_json()).await?;
        for file in files {
            println!("📁 Output saved to: {}/{}", dir, file);
        }
    }
    monitor.end_phase("report");
    monitor.log_final_stats();

    Ok(())
}
