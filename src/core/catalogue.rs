use crate::domain::model::Course;
use crate::utils::error::{RecoError, Result};
use std::collections::HashMap;

/// Validated, immutable course set ordered by code.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    courses: Vec<Course>,
    index: HashMap<String, usize>,
}

impl Catalogue {
    /// Fails on the first malformed record so a partial catalogue never
    /// reaches the graph builder.
    pub fn new(mut courses: Vec<Course>) -> Result<Self> {
        for course in &courses {
            validate_course(course)?;
        }

        courses.sort_by(|a, b| a.code.cmp(&b.code));

        let mut index = HashMap::with_capacity(courses.len());
        for (i, course) in courses.iter().enumerate() {
            if index.insert(course.code.clone(), i).is_some() {
                return Err(RecoError::DuplicateCourse {
                    code: course.code.clone(),
                });
            }
        }

        tracing::debug!("Catalogue validated with {} courses", courses.len());
        Ok(Self { courses, index })
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn get(&self, code: &str) -> Option<&Course> {
        self.index.get(code).map(|&i| &self.courses[i])
    }

    pub fn position(&self, code: &str) -> Option<usize> {
        self.index.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Case-insensitive substring search on name, optional exact group and
    /// semester filters.
    pub fn search(&self, query: Option<&str>, group: Option<&str>, semester: Option<u32>) -> Vec<&Course> {
        let needle = query.map(|q| q.trim().to_lowercase());
        self.courses
            .iter()
            .filter(|c| semester.is_none_or(|s| c.semester == s))
            .filter(|c| group.is_none_or(|g| c.group == g))
            .filter(|c| {
                needle
                    .as_deref()
                    .is_none_or(|n| c.name.to_lowercase().contains(n))
            })
            .collect()
    }
}

fn validate_course(course: &Course) -> Result<()> {
    if course.code.trim().is_empty() {
        return Err(RecoError::InvalidCourse {
            code: course.code.clone(),
            reason: format!("empty course code (name: '{}')", course.name),
        });
    }
    if course.code.trim() != course.code {
        return Err(RecoError::InvalidCourse {
            code: course.code.clone(),
            reason: "course code has surrounding whitespace".to_string(),
        });
    }
    if !course.cfu.is_finite() || course.cfu < 0.0 {
        return Err(RecoError::InvalidCourse {
            code: course.code.clone(),
            reason: format!("invalid credit value {}", course.cfu),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn course(code: &str, name: &str, group: &str) -> Course {
        Course {
            code: code.to_string(),
            name: name.to_string(),
            cfu: 6.0,
            semester: 1,
            language: "EN".to_string(),
            group: group.to_string(),
            ssd: Vec::new(),
            description: String::new(),
            keywords: Vec::new(),
            lecturer: None,
            exam_types: Vec::new(),
            workload: None,
        }
    }

    #[test]
    fn test_catalogue_is_sorted_by_code() {
        let catalogue = Catalogue::new(vec![
            course("300", "Networks", "SYSTEMS"),
            course("100", "Algorithms", "THEORY"),
            course("200", "Databases", "SYSTEMS"),
        ])
        .unwrap();

        let codes: Vec<&str> = catalogue.courses().iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["100", "200", "300"]);
        assert_eq!(catalogue.get("200").unwrap().name, "Databases");
        assert_eq!(catalogue.position("300"), Some(2));
    }

    #[test]
    fn test_duplicate_code_fails_fast() {
        let err = Catalogue::new(vec![
            course("100", "Algorithms", "THEORY"),
            course("100", "Algorithms II", "THEORY"),
        ])
        .unwrap_err();
        assert!(matches!(err, RecoError::DuplicateCourse { code } if code == "100"));
    }

    #[test]
    fn test_malformed_course_fails_fast() {
        let mut bad = course("100", "Algorithms", "THEORY");
        bad.cfu = f64::NAN;
        assert!(Catalogue::new(vec![bad]).is_err());
        assert!(Catalogue::new(vec![course(" ", "Nameless", "THEORY")]).is_err());
    }

    #[test]
    fn test_search() {
        let catalogue = Catalogue::new(vec![
            course("100", "Algorithms", "THEORY"),
            course("200", "Distributed Algorithms", "SYSTEMS"),
            course("300", "Networks", "SYSTEMS"),
        ])
        .unwrap();

        assert_eq!(catalogue.search(Some("algo"), None, None).len(), 2);
        assert_eq!(catalogue.search(Some("algo"), Some("SYSTEMS"), None).len(), 1);
        assert_eq!(catalogue.search(None, None, Some(2)).len(), 0);
    }
}
