use clap::Parser;
use course_reco::app::load_profile;
use course_reco::core::ConfigProvider;
use course_reco::utils::{logger, validation::Validate};
use course_reco::{CliConfig, LocalStorage, RecoError, RecommendJob, RunSummary, TomlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting course-reco");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let outcome = match cli.config.as_deref() {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            match TomlConfig::from_file(path) {
                Ok(config) => {
                    let monitor = cli.monitor || config.monitoring_enabled();
                    run(config, cli.profile.as_deref(), monitor).await
                }
                Err(e) => Err(e),
            }
        }
        None => run(cli.clone(), cli.profile.as_deref(), cli.monitor).await,
    };

    match outcome {
        Ok(summary) => {
            tracing::info!(
                "✅ Recommended {} courses, graph view with {} nodes and {} edges",
                summary.recommended,
                summary.graph_nodes,
                summary.graph_edges
            );
            for file in &summary.files {
                println!("📁 Output saved to: {}", file);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Recommendation run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = e.severity().exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run<C>(config: C, profile: Option<&str>, monitor: bool) -> Result<RunSummary, RecoError>
where
    C: ConfigProvider + Validate,
{
    config.validate()?;
    tracing::info!("✅ Configuration validated");
    if monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let profile = load_profile(profile).await?;
    let storage = LocalStorage::new(config.output_path());
    let job = RecommendJob::new_with_monitoring(storage, config, monitor);
    job.run(&profile).await
}
