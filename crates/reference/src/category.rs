//! Reference categories, their declared schemas and default skeletons.

use copyforge_config::ReferenceConfig;
use copyforge_core::error::ReferenceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// One of the three reference tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    BrandInfo,
    BestPractices,
    ComplianceInfo,
}

/// Column layout and key requirements for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    /// Expected header names, or `None` when columns are positional
    pub columns: Option<[&'static str; 2]>,

    /// Keys that should be present; absence is logged, not fatal
    pub required_keys: &'static [&'static str],
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::BrandInfo,
        Category::BestPractices,
        Category::ComplianceInfo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::BrandInfo => "brand_info",
            Category::BestPractices => "best_practices",
            Category::ComplianceInfo => "compliance_info",
        }
    }

    pub fn schema(&self) -> Schema {
        match self {
            Category::BrandInfo => Schema {
                columns: Some(["Area", "Key Info"]),
                required_keys: &["Brand Name", "Tone of Voice"],
            },
            Category::BestPractices => Schema {
                columns: Some(["Content Type", "Engagement Guidelines"]),
                required_keys: &[],
            },
            Category::ComplianceInfo => Schema {
                columns: None,
                required_keys: &[],
            },
        }
    }

    /// Location of this category's file relative to the configured base dir.
    pub fn path_in(&self, config: &ReferenceConfig) -> PathBuf {
        let relative = match self {
            Category::BrandInfo => &config.brand_info,
            Category::BestPractices => &config.best_practices,
            Category::ComplianceInfo => &config.compliance_info,
        };
        config.base_dir.join(relative)
    }

    /// The skeleton written when the category's file does not exist.
    /// The first record is the header.
    pub fn default_records(&self) -> Vec<Vec<String>> {
        let rows: &[(&str, &str)] = match self {
            Category::BrandInfo => &[
                ("Area", "Key Info"),
                ("Brand Name", ""),
                ("Website Link", ""),
                ("Long Description", ""),
                ("Short Description", ""),
                ("Target Audience", ""),
                ("Tone of Voice", ""),
            ],
            Category::BestPractices => &[
                ("Content Type", "Engagement Guidelines"),
                ("Social Media Post", "Use emojis and hashtags strategically"),
                ("Blog Article", "Incorporate storytelling elements"),
                ("Video Script", "Include call-to-action within first 15 seconds"),
                ("Newsletter", "Personalize subject lines with reader's name"),
                ("Infographic", "Use bold visuals with minimal text"),
            ],
            Category::ComplianceInfo => &[
                ("", ""),
                ("settore", ""),
                ("regolamentazione", ""),
                ("disclaimer_necessari", ""),
            ],
        };
        rows.iter()
            .map(|(k, v)| vec![k.to_string(), v.to_string()])
            .collect()
    }
}

impl FromStr for Category {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brand_info" => Ok(Category::BrandInfo),
            "best_practices" => Ok(Category::BestPractices),
            "compliance_info" => Ok(Category::ComplianceInfo),
            _ => Err(ReferenceError::InvalidCategory(s.to_string())),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn name_matching_ignores_case() {
        assert_eq!("Brand_Info".parse::<Category>().unwrap(), Category::BrandInfo);
    }

    #[test]
    fn unknown_name_is_invalid_category() {
        let err = "recipes".parse::<Category>().unwrap_err();
        assert!(matches!(err, ReferenceError::InvalidCategory(ref s) if s == "recipes"));
    }

    #[test]
    fn default_paths_follow_reference_layout() {
        let config = ReferenceConfig::rooted_at("/data/RAG");
        assert_eq!(
            Category::BestPractices.path_in(&config),
            PathBuf::from("/data/RAG/Rag 2/best_practices.csv")
        );
    }

    #[test]
    fn skeleton_headers_match_schema() {
        for category in Category::ALL {
            let records = category.default_records();
            if let Some(columns) = category.schema().columns {
                assert_eq!(records[0], columns.map(String::from).to_vec());
            }
            assert!(records.len() > 1);
        }
    }
}
