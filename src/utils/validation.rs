use crate::utils::error::{RecoError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(RecoError::InvalidConfigValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(RecoError::InvalidConfigValue {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(RecoError::InvalidConfigValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(RecoError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(RecoError::InvalidConfigValue {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(RecoError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    // written so that NaN fails too
    if !(value >= min && value <= max) {
        return Err(RecoError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Open interval check, used for the damping factor.
pub fn validate_open_unit(field_name: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(RecoError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must be strictly between 0 and 1".to_string(),
        });
    }
    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if !allowed.contains(&value) {
        return Err(RecoError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Supported values: {}", allowed.join(", ")),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("catalogue.location", "https://example.com/courses").is_ok());
        assert!(validate_url("catalogue.location", "http://localhost:8000").is_ok());
        assert!(validate_url("catalogue.location", "").is_err());
        assert!(validate_url("catalogue.location", "courses.json").is_err());
        assert!(validate_url("catalogue.location", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_range_rejects_nan() {
        assert!(validate_range("graph.min_edge_weight", 0.2, 0.0, 1.0).is_ok());
        assert!(validate_range("graph.min_edge_weight", 1.5, 0.0, 1.0).is_err());
        assert!(validate_range("graph.min_edge_weight", f64::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_validate_open_unit() {
        assert!(validate_open_unit("ranking.damping", 0.85).is_ok());
        assert!(validate_open_unit("ranking.damping", 0.0).is_err());
        assert!(validate_open_unit("ranking.damping", 1.0).is_err());
    }

    #[test]
    fn test_validate_one_of() {
        assert!(validate_one_of("output.formats", "csv", &["json", "csv"]).is_ok());
        assert!(validate_one_of("output.formats", "zip", &["json", "csv"]).is_err());
    }
}
