use serde::{Deserialize, Deserializer, Serialize};

pub const UNKNOWN: &str = "UNKNOWN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadLevel {
    Low,
    Medium,
    High,
}

impl WorkloadLevel {
    /// Lenient parse; anything unrecognised is treated as absent.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" | "light" => Some(WorkloadLevel::Low),
            "medium" | "moderate" | "normal" => Some(WorkloadLevel::Medium),
            "high" | "heavy" => Some(WorkloadLevel::High),
            _ => None,
        }
    }

    pub fn from_credits(cfu: f64) -> Self {
        if cfu <= 6.0 {
            WorkloadLevel::Low
        } else if cfu <= 9.0 {
            WorkloadLevel::Medium
        } else {
            WorkloadLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadLevel::Low => "low",
            WorkloadLevel::Medium => "medium",
            WorkloadLevel::High => "high",
        }
    }
}

/// A catalogue entry. Identity is `code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    pub name: String,
    pub cfu: f64,
    pub semester: u32,
    pub language: String,
    pub group: String,
    /// Scientific-disciplinary sectors.
    #[serde(default)]
    pub ssd: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub lecturer: Option<String>,
    #[serde(default)]
    pub exam_types: Vec<String>,
    #[serde(default)]
    pub workload: Option<WorkloadLevel>,
}

impl Course {
    pub fn workload_level(&self) -> WorkloadLevel {
        self.workload
            .unwrap_or_else(|| WorkloadLevel::from_credits(self.cfu))
    }

    pub fn has_known_language(&self) -> bool {
        !self.language.is_empty() && self.language != UNKNOWN
    }
}

/// What the student told us, already extracted into structured form.
/// Every field is optional; malformed values read as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentProfile {
    #[serde(deserialize_with = "lenient_list")]
    pub interests: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub avoid: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub goals: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub language_preference: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub workload_tolerance: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub preferred_exam_types: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub liked_courses: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub disliked_courses: Vec<String>,
}

impl StudentProfile {
    /// Upper-cased language code, `None` for missing or `ANY`.
    pub fn language(&self) -> Option<String> {
        let lang = self.language_preference.as_deref()?.trim().to_uppercase();
        if lang.is_empty() || lang == "ANY" {
            None
        } else {
            Some(lang)
        }
    }

    pub fn workload(&self) -> Option<WorkloadLevel> {
        self.workload_tolerance
            .as_deref()
            .and_then(WorkloadLevel::parse)
    }

    pub fn is_empty(&self) -> bool {
        let blank = |items: &[String]| items.iter().all(|s| s.trim().is_empty());
        blank(&self.interests)
            && blank(&self.avoid)
            && blank(&self.goals)
            && blank(&self.preferred_exam_types)
            && blank(&self.liked_courses)
            && blank(&self.disliked_courses)
            && self.language().is_none()
            && self.workload().is_none()
    }
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.trim().is_empty())
            .collect(),
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

/// Closed set of justification types, shared by graph edges and rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind {
    KeywordMatch,
    GoalMatch,
    GroupMatch,
    SectorMatch,
    InstructorMatch,
    SemesterMatch,
    LanguageMatch,
    LanguagePenalty,
    WorkloadMatch,
    WorkloadPenalty,
    ExamTypeMatch,
    LikedCourse,
    LikedNeighbor,
    AvoidPenalty,
    GraphPropagation,
    GraphCentrality,
}

impl ReasonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonKind::KeywordMatch => "keyword_match",
            ReasonKind::GoalMatch => "goal_match",
            ReasonKind::GroupMatch => "group_match",
            ReasonKind::SectorMatch => "sector_match",
            ReasonKind::InstructorMatch => "instructor_match",
            ReasonKind::SemesterMatch => "semester_match",
            ReasonKind::LanguageMatch => "language_match",
            ReasonKind::LanguagePenalty => "language_penalty",
            ReasonKind::WorkloadMatch => "workload_match",
            ReasonKind::WorkloadPenalty => "workload_penalty",
            ReasonKind::ExamTypeMatch => "exam_type_match",
            ReasonKind::LikedCourse => "liked_course",
            ReasonKind::LikedNeighbor => "liked_neighbor",
            ReasonKind::AvoidPenalty => "avoid_penalty",
            ReasonKind::GraphPropagation => "graph_propagation",
            ReasonKind::GraphCentrality => "graph_centrality",
        }
    }
}

impl std::fmt::Display for ReasonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasonTag {
    #[serde(rename = "type")]
    pub kind: ReasonKind,
    pub value: String,
    pub contribution: f64,
}

impl ReasonTag {
    pub fn new(kind: ReasonKind, value: impl Into<String>, contribution: f64) -> Self {
        Self {
            kind,
            value: value.into(),
            contribution,
        }
    }
}

/// Undirected similarity edge; `source < target` by code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseEdge {
    pub source: String,
    pub target: String,
    pub weight: f64,
    pub concepts: Vec<String>,
    pub reasons: Vec<ReasonTag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCourse {
    pub code: String,
    pub name: String,
    pub cfu: f64,
    pub semester: u32,
    pub language: String,
    pub group: String,
    pub score: f64,
    pub explanation: Option<String>,
    pub reason_tags: Vec<ReasonTag>,
}

impl RankedCourse {
    pub fn from_course(course: &Course, score: f64) -> Self {
        Self {
            code: course.code.clone(),
            name: course.name.clone(),
            cfu: course.cfu,
            semester: course.semester,
            language: course.language.clone(),
            group: course.group.clone(),
            score,
            explanation: None,
            reason_tags: Vec::new(),
        }
    }

    pub fn has_reason(&self, kind: ReasonKind) -> bool {
        self.reason_tags.iter().any(|t| t.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub code: String,
    pub label: String,
    pub score: f64,
    pub is_recommended: bool,
    pub group: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<CourseEdge>,
}
