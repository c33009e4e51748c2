//! Serialised forms of a recommendation run.

use crate::domain::model::{GraphView, RankedCourse};
use crate::utils::error::{RecoError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const JSON_FILENAME: &str = "recommendations.json";
pub const CSV_FILENAME: &str = "recommendations.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationDocument {
    pub generated_at: DateTime<Utc>,
    pub top_k: usize,
    pub recommendations: Vec<RankedCourse>,
    pub graph_view: GraphView,
}

impl RecommendationDocument {
    pub fn new(top_k: usize, recommendations: Vec<RankedCourse>, graph_view: GraphView) -> Self {
        Self {
            generated_at: Utc::now(),
            top_k,
            recommendations,
            graph_view,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "rank",
            "code",
            "name",
            "cfu",
            "semester",
            "language",
            "group",
            "score",
            "explanation",
        ])?;

        for (i, course) in self.recommendations.iter().enumerate() {
            writer.write_record([
                (i + 1).to_string(),
                course.code.clone(),
                course.name.clone(),
                course.cfu.to_string(),
                course.semester.to_string(),
                course.language.clone(),
                course.group.clone(),
                format!("{:.6}", course.score),
                course.explanation.clone().unwrap_or_default(),
            ])?;
        }

        writer.flush()?;
        writer
            .into_inner()
            .map_err(|e| RecoError::IoError(std::io::Error::other(e.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{GraphNode, ReasonKind, ReasonTag};

    fn document() -> RecommendationDocument {
        let ranked = RankedCourse {
            code: "100".to_string(),
            name: "Algorithms, advanced".to_string(),
            cfu: 6.0,
            semester: 1,
            language: "EN".to_string(),
            group: "THEORY".to_string(),
            score: 0.5,
            explanation: Some("Matches your interest in graphs.".to_string()),
            reason_tags: vec![ReasonTag::new(ReasonKind::KeywordMatch, "graphs", 1.0)],
        };
        let view = GraphView {
            nodes: vec![GraphNode {
                code: "100".to_string(),
                label: "Algorithms, advanced".to_string(),
                score: 0.5,
                is_recommended: true,
                group: Some("THEORY".to_string()),
            }],
            edges: Vec::new(),
        };
        RecommendationDocument::new(1, vec![ranked], view)
    }

    #[test]
    fn test_json_uses_wire_names() {
        let json: serde_json::Value = serde_json::from_slice(&document().to_json().unwrap()).unwrap();
        assert_eq!(json["top_k"], 1);
        assert_eq!(json["recommendations"][0]["code"], "100");
        assert_eq!(json["recommendations"][0]["reason_tags"][0]["type"], "keyword_match");
        assert_eq!(json["graph_view"]["nodes"][0]["is_recommended"], true);
        assert!(json["generated_at"].is_string());
    }

    #[test]
    fn test_csv_quotes_fields() {
        let csv = String::from_utf8(document().to_csv().unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "rank,code,name,cfu,semester,language,group,score,explanation"
        );
        assert_eq!(
            lines.next().unwrap(),
            "1,100,\"Algorithms, advanced\",6,1,EN,THEORY,0.500000,Matches your interest in graphs."
        );
    }
}
