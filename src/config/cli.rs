use super::OUTPUT_FORMATS;
use crate::core::engine::EngineSettings;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "course-reco")]
#[command(about = "Rank a course catalogue for a student profile")]
pub struct CliConfig {
    /// Catalogue file path or HTTP URL
    #[arg(long, default_value = "demos/courses.json")]
    pub catalogue: String,

    /// json, csv, http, or auto to infer from the location
    #[arg(long, default_value = "auto")]
    pub catalogue_type: String,

    /// Student profile JSON; omitted means an empty profile
    #[arg(long)]
    pub profile: Option<String>,

    #[arg(long, default_value = "10")]
    pub top_k: usize,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_value = "json,csv")]
    pub formats: Vec<String>,

    /// TOML configuration file; overrides the flags above
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, default_value = "0.85")]
    pub damping: f64,

    /// Drop courses taught in a language other than the preferred one
    #[arg(long)]
    pub strict_language: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Report time and memory per phase")]
    pub monitor: bool,
}

impl ConfigProvider for CliConfig {
    fn catalogue_kind(&self) -> &str {
        &self.catalogue_type
    }

    fn catalogue_location(&self) -> &str {
        &self.catalogue
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn top_k(&self) -> usize {
        self.top_k
    }

    fn engine_settings(&self) -> EngineSettings {
        let mut settings = EngineSettings::default();
        settings.ranking.damping = self.damping;
        settings.ranking.strict_language = self.strict_language;
        settings
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("catalogue", &self.catalogue)?;
        validation::validate_one_of(
            "catalogue_type",
            &self.catalogue_type.to_lowercase(),
            crate::adapters::catalogue::SOURCE_KINDS,
        )?;
        if let Some(profile) = &self.profile {
            validation::validate_path("profile", profile)?;
        }
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_open_unit("damping", self.damping)?;
        for format in &self.formats {
            validation::validate_one_of("formats", format, OUTPUT_FORMATS)?;
        }
        Ok(())
    }
}
