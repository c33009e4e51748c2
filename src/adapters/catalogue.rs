//! Catalogue sources: JSON file, CSV file and HTTP endpoint.

use crate::core::catalogue::Catalogue;
use crate::domain::model::{Course, WorkloadLevel, UNKNOWN};
use crate::domain::ports::CatalogueSource;
use crate::utils::error::{RecoError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

/// Loosely typed course as found in the wild: numbers may arrive as
/// strings, lists as single strings, anything may be null.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CourseRecord {
    pub code: Value,
    pub name: Value,
    pub cfu: Value,
    pub semester: Value,
    pub language: Value,
    pub group: Value,
    pub ssd: Value,
    pub description: Value,
    pub keywords: Value,
    #[serde(alias = "instructor")]
    pub lecturer: Value,
    pub exam_types: Value,
    pub workload: Value,
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().replace(',', ".").parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn semester(value: &Value) -> u32 {
    let raw = number(value);
    if raw.is_finite() && raw >= 0.0 {
        raw as u32
    } else {
        0
    }
}

fn list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(text).filter(|s| !s.is_empty()).collect(),
        Value::String(s) => s
            .split(';')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        Value::Number(_) => vec![text(value)],
        _ => Vec::new(),
    }
}

fn or_unknown(raw: String) -> String {
    if raw.is_empty() {
        UNKNOWN.to_string()
    } else {
        raw
    }
}

impl CourseRecord {
    pub fn into_course(self) -> Course {
        let lecturer = Some(text(&self.lecturer)).filter(|l| !l.is_empty());
        Course {
            code: text(&self.code),
            name: text(&self.name),
            cfu: number(&self.cfu),
            semester: semester(&self.semester),
            language: or_unknown(text(&self.language).to_uppercase()),
            group: or_unknown(text(&self.group)),
            ssd: list(&self.ssd),
            description: text(&self.description),
            keywords: list(&self.keywords),
            lecturer,
            exam_types: list(&self.exam_types),
            workload: WorkloadLevel::parse(&text(&self.workload)),
        }
    }
}

/// Accepts a bare array or an object wrapping one under `courses`.
pub fn parse_courses_json(document: Value) -> Result<Vec<Course>> {
    let items = match document {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("courses") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(RecoError::CatalogueSource {
                    message: "expected a JSON array of courses or a 'courses' array".to_string(),
                })
            }
        },
        other => {
            return Err(RecoError::CatalogueSource {
                message: format!("expected a JSON array of courses, got {}", type_name(&other)),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            if !item.is_object() {
                return Err(RecoError::InvalidCourse {
                    code: format!("#{}", i),
                    reason: format!("record is a {}, not an object", type_name(&item)),
                });
            }
            let record: CourseRecord = serde_json::from_value(item)?;
            Ok(record.into_course())
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone)]
pub struct JsonFileCatalogue {
    path: PathBuf,
}

impl JsonFileCatalogue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogueSource for JsonFileCatalogue {
    async fn fetch(&self) -> Result<Vec<Course>> {
        let bytes = tokio::fs::read(&self.path).await?;
        let document: Value = serde_json::from_slice(&bytes)?;
        parse_courses_json(document)
    }

    fn describe(&self) -> String {
        format!("json file {}", self.path.display())
    }
}

/// One CSV row; list columns hold `;`-separated values.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvRow {
    code: String,
    name: String,
    cfu: String,
    semester: String,
    language: String,
    group: String,
    ssd: String,
    description: String,
    keywords: String,
    #[serde(alias = "instructor")]
    lecturer: String,
    exam_types: String,
    workload: String,
}

impl From<CsvRow> for CourseRecord {
    fn from(row: CsvRow) -> Self {
        Self {
            code: Value::String(row.code),
            name: Value::String(row.name),
            cfu: Value::String(row.cfu),
            semester: Value::String(row.semester),
            language: Value::String(row.language),
            group: Value::String(row.group),
            ssd: Value::String(row.ssd),
            description: Value::String(row.description),
            keywords: Value::String(row.keywords),
            lecturer: Value::String(row.lecturer),
            exam_types: Value::String(row.exam_types),
            workload: Value::String(row.workload),
        }
    }
}

pub fn parse_courses_csv(content: &[u8]) -> Result<Vec<Course>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let mut courses = Vec::new();
    for row in reader.deserialize::<CsvRow>() {
        courses.push(CourseRecord::from(row?).into_course());
    }
    Ok(courses)
}

#[derive(Debug, Clone)]
pub struct CsvFileCatalogue {
    path: PathBuf,
}

impl CsvFileCatalogue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogueSource for CsvFileCatalogue {
    async fn fetch(&self) -> Result<Vec<Course>> {
        let bytes = tokio::fs::read(&self.path).await?;
        parse_courses_csv(&bytes)
    }

    fn describe(&self) -> String {
        format!("csv file {}", self.path.display())
    }
}

#[derive(Debug, Clone)]
pub struct HttpCatalogue {
    client: Client,
    url: String,
}

impl HttpCatalogue {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl CatalogueSource for HttpCatalogue {
    async fn fetch(&self) -> Result<Vec<Course>> {
        tracing::debug!("Requesting course catalogue from: {}", self.url);
        let response = self.client.get(&self.url).send().await?;
        tracing::debug!("Catalogue response status: {}", response.status());

        if !response.status().is_success() {
            return Err(RecoError::CatalogueSource {
                message: format!("{} returned status {}", self.url, response.status()),
            });
        }

        let document: Value = response.json().await?;
        parse_courses_json(document)
    }

    fn describe(&self) -> String {
        format!("http endpoint {}", self.url)
    }
}

pub const SOURCE_KINDS: &[&str] = &["auto", "json", "csv", "http"];

/// Picks a source by kind. `auto` infers it from the location.
pub fn source_for(kind: &str, location: &str) -> Result<Box<dyn CatalogueSource>> {
    let kind = match kind.trim().to_lowercase().as_str() {
        "auto" | "" => infer_kind(location),
        other => other.to_string(),
    };
    match kind.as_str() {
        "json" => Ok(Box::new(JsonFileCatalogue::new(location))),
        "csv" => Ok(Box::new(CsvFileCatalogue::new(location))),
        "http" => Ok(Box::new(HttpCatalogue::new(location))),
        other => Err(RecoError::InvalidConfigValue {
            field: "catalogue.type".to_string(),
            value: other.to_string(),
            reason: format!("Unsupported source. Valid types: {}", SOURCE_KINDS.join(", ")),
        }),
    }
}

fn infer_kind(location: &str) -> String {
    let lowered = location.to_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        "http".to_string()
    } else if lowered.ends_with(".csv") {
        "csv".to_string()
    } else {
        "json".to_string()
    }
}

/// Fetches and validates the whole catalogue; nothing partial gets out.
pub async fn load_catalogue(source: &dyn CatalogueSource) -> Result<Catalogue> {
    tracing::info!("Loading course catalogue from {}", source.describe());
    let courses = source.fetch().await?;
    let catalogue = Catalogue::new(courses)?;
    tracing::info!("Loaded {} courses", catalogue.len());
    Ok(catalogue)
}
