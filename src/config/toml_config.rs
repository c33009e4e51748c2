use super::OUTPUT_FORMATS;
use crate::adapters::catalogue::SOURCE_KINDS;
use crate::core::cache::DEFAULT_CACHE_SIZE;
use crate::core::engine::EngineSettings;
use crate::core::graph::GraphBuildConfig;
use crate::core::projection::ProjectionConfig;
use crate::core::ranking::RankingConfig;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub catalogue: CatalogueConfig,
    #[serde(default)]
    pub graph: GraphBuildConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueConfig {
    #[serde(default = "default_source_type")]
    pub r#type: String,
    pub location: String,
}

fn default_source_type() -> String {
    "auto".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub formats: Vec<String>,
    pub top_k: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "./output".to_string(),
            formats: vec!["json".to_string(), "csv".to_string()],
            top_k: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Zero disables the ranking cache.
    pub size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_CACHE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed)?)
    }

    /// Replaces `${VAR}` with the environment value; unset variables are
    /// left as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        let kind = self.catalogue.r#type.to_lowercase();
        validation::validate_one_of("catalogue.type", &kind, SOURCE_KINDS)?;
        let location = &self.catalogue.location;
        if kind == "http" || location.starts_with("http://") || location.starts_with("https://") {
            validation::validate_url("catalogue.location", location)?;
        } else {
            validation::validate_path("catalogue.location", location)?;
        }

        let g = &self.graph;
        for (field, value) in [
            ("graph.text_sim_threshold", g.text_sim_threshold),
            ("graph.min_edge_weight", g.min_edge_weight),
            ("graph.max_edge_weight", g.max_edge_weight),
        ] {
            validation::validate_range(field, value, 0.0, 1.0)?;
        }

        let r = &self.ranking;
        validation::validate_open_unit("ranking.damping", r.damping)?;
        validation::validate_range("ranking.tolerance", r.tolerance, f64::MIN_POSITIVE, 1.0)?;
        validation::validate_positive_number("ranking.max_iterations", r.max_iterations, 1)?;
        for (field, value) in [
            ("ranking.language_mismatch_factor", r.language_mismatch_factor),
            ("ranking.workload_penalty_factor", r.workload_penalty_factor),
            ("ranking.avoid_penalty", r.avoid_penalty),
        ] {
            validation::validate_range(field, value, 0.0, 1.0)?;
        }

        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_positive_number("output.top_k", self.output.top_k, 1)?;
        for format in &self.output.formats {
            validation::validate_one_of("output.formats", format, OUTPUT_FORMATS)?;
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn catalogue_kind(&self) -> &str {
        &self.catalogue.r#type
    }

    fn catalogue_location(&self) -> &str {
        &self.catalogue.location
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }

    fn top_k(&self) -> usize {
        self.output.top_k
    }

    fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            graph: self.graph.clone(),
            ranking: self.ranking.clone(),
            projection: self.projection.clone(),
            cache_size: self.cache.size,
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_minimal_config() {
        let config = TomlConfig::from_toml_str(
            r#"
[catalogue]
location = "data/courses.json"
"#,
        )
        .unwrap();

        assert_eq!(config.catalogue_kind(), "auto");
        assert_eq!(config.top_k(), 10);
        assert_eq!(config.engine_settings(), EngineSettings::default());
        assert!(config.validate().is_ok());
        assert!(!config.monitoring_enabled());
    }

    #[test]
    fn test_parse_full_config() {
        let config = TomlConfig::from_toml_str(
            r#"
[catalogue]
type = "csv"
location = "data/courses.csv"

[graph]
w_group = 0.4
min_edge_weight = 0.3

[ranking]
damping = 0.9
strict_language = true

[projection]
max_neighbors_per_node = 5

[output]
path = "./out"
formats = ["json"]
top_k = 5

[cache]
size = 0

[monitoring]
enabled = true
"#,
        )
        .unwrap();

        let settings = config.engine_settings();
        assert_eq!(settings.graph.w_group, 0.4);
        assert_eq!(settings.graph.w_ssd, 0.9);
        assert_eq!(settings.ranking.damping, 0.9);
        assert!(settings.ranking.strict_language);
        assert_eq!(settings.projection.max_neighbors_per_node, Some(5));
        assert_eq!(settings.cache_size, 0);
        assert_eq!(config.output_formats(), ["json".to_string()]);
        assert!(config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("COURSE_RECO_TEST_CATALOGUE", "https://catalogue.example.com/courses");

        let config = TomlConfig::from_toml_str(
            r#"
[catalogue]
type = "http"
location = "${COURSE_RECO_TEST_CATALOGUE}"
"#,
        )
        .unwrap();
        assert_eq!(config.catalogue.location, "https://catalogue.example.com/courses");
        assert!(config.validate().is_ok());

        std::env::remove_var("COURSE_RECO_TEST_CATALOGUE");
    }

    #[test]
    fn test_config_validation() {
        let bad_damping = TomlConfig::from_toml_str(
            r#"
[catalogue]
location = "courses.json"

[ranking]
damping = 1.0
"#,
        )
        .unwrap();
        assert!(bad_damping.validate().is_err());

        let bad_url = TomlConfig::from_toml_str(
            r#"
[catalogue]
type = "http"
location = "not a url"
"#,
        )
        .unwrap();
        assert!(bad_url.validate().is_err());
    }

    #[test]
    fn test_missing_catalogue_section_fails() {
        assert!(TomlConfig::from_toml_str("[output]\ntop_k = 3\n").is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[catalogue]\ntype = \"json\"\nlocation = \"courses.json\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.catalogue_location(), "courses.json");
    }
}
