//! Typed key-value tables and term-based search over them.

use crate::category::Category;
use crate::csv::Sheet;
use copyforge_core::error::ReferenceError;
use serde::Serialize;
use std::path::Path;
use tracing::warn;

/// A loaded reference table: unique keys in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceTable {
    category: Category,
    entries: Vec<(String, String)>,
}

/// Entries matched by a query, in table scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    entries: Vec<(String, String)>,
}

impl ReferenceTable {
    pub fn empty(category: Category) -> Self {
        Self {
            category,
            entries: Vec::new(),
        }
    }

    /// Validate a parsed sheet against the category schema and keep the
    /// first two columns as key and value.
    ///
    /// Rows with a missing or blank key or value are dropped. A repeated key
    /// keeps its first position and takes the later value.
    pub fn from_sheet(category: Category, sheet: &Sheet, source: &Path) -> Result<Self, ReferenceError> {
        let malformed = |reason: String| ReferenceError::Malformed {
            path: source.to_path_buf(),
            reason,
        };

        if sheet.header.len() < 2 {
            return Err(malformed(format!(
                "expected 2 columns, found {}",
                sheet.header.len()
            )));
        }

        let schema = category.schema();
        if let Some(expected) = schema.columns {
            let matches = expected
                .iter()
                .zip(&sheet.header)
                .all(|(want, got)| want.eq_ignore_ascii_case(got.trim()));
            if !matches {
                return Err(malformed(format!(
                    "expected header ({}, {}), found ({}, {})",
                    expected[0], expected[1], sheet.header[0], sheet.header[1]
                )));
            }
        }

        let mut entries: Vec<(String, String)> = Vec::new();
        for row in &sheet.rows {
            let (Some(key), Some(value)) = (row.first(), row.get(1)) else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                continue;
            }

            match entries.iter_mut().find(|(k, _)| k == key) {
                Some(existing) => {
                    warn!(category = %category, key, "Duplicate reference key, keeping last value");
                    existing.1 = value.to_string();
                }
                None => entries.push((key.to_string(), value.to_string())),
            }
        }

        for required in schema.required_keys {
            if !entries.iter().any(|(k, _)| k.eq_ignore_ascii_case(required)) {
                warn!(category = %category, key = *required, "Required reference key has no value");
            }
        }

        Ok(Self { category, entries })
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries where any lowercase whitespace-separated query term is a
    /// substring of the lowercased key or value.
    pub fn search(&self, query: &str) -> QueryResult {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();

        let entries = self
            .entries
            .iter()
            .filter(|(key, value)| {
                let key = key.to_lowercase();
                let value = value.to_lowercase();
                terms
                    .iter()
                    .any(|term| key.contains(term.as_str()) || value.contains(term.as_str()))
            })
            .cloned()
            .collect();

        QueryResult { entries }
    }
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_entries(self) -> Vec<(String, String)> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sheet(text: &str) -> Sheet {
        Sheet::parse(text).unwrap()
    }

    fn brand_table(text: &str) -> ReferenceTable {
        ReferenceTable::from_sheet(Category::BrandInfo, &sheet(text), &PathBuf::from("brand.csv")).unwrap()
    }

    #[test]
    fn drops_rows_with_blank_key_or_value() {
        let table = brand_table("Area,Key Info\nBrand Name,Siebert\nWebsite Link,\n,orphan\nShort\n");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("Brand Name"), Some("Siebert"));
    }

    #[test]
    fn duplicate_keys_keep_position_and_last_value() {
        let table = brand_table("Area,Key Info\nA,1\nB,2\nA,3\n");
        let entries: Vec<_> = table.iter().collect();
        assert_eq!(entries, vec![("A", "3"), ("B", "2")]);
    }

    #[test]
    fn wrong_header_is_malformed() {
        let err = ReferenceTable::from_sheet(
            Category::BestPractices,
            &sheet("Area,Key Info\nBlog Article,Tell stories\n"),
            &PathBuf::from("bp.csv"),
        )
        .unwrap_err();
        assert!(matches!(err, ReferenceError::Malformed { .. }));
    }

    #[test]
    fn compliance_header_is_positional() {
        let table = ReferenceTable::from_sheet(
            Category::ComplianceInfo,
            &sheet("regola,valore\nsettore,finanza\n"),
            &PathBuf::from("c.csv"),
        )
        .unwrap();
        assert_eq!(table.get("settore"), Some("finanza"));
    }

    #[test]
    fn single_column_is_malformed() {
        let err = ReferenceTable::from_sheet(
            Category::ComplianceInfo,
            &sheet("only\nrow\n"),
            &PathBuf::from("c.csv"),
        )
        .unwrap_err();
        assert!(err.is_retrieval_failure());
    }

    #[test]
    fn search_matches_key_case_insensitively() {
        let table = brand_table("Area,Key Info\nMinimum Investment,$500\nTone of Voice,Warm\n");
        let result = table.search("minimum investment");
        assert_eq!(result.len(), 1);
        assert_eq!(result.get("Minimum Investment"), Some("$500"));
    }

    #[test]
    fn search_matches_any_term_in_key_or_value() {
        let table = brand_table(
            "Area,Key Info\nBrand Name,Siebert\nTone of Voice,Warm and expert\nColors,Blue\n",
        );
        let result = table.search("EXPERT siebert");
        let keys: Vec<_> = result.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Brand Name", "Tone of Voice"]);
    }

    #[test]
    fn every_match_contains_a_term() {
        let table = brand_table("Area,Key Info\nA,alpha\nB,beta\nC,gamma\nD,delta\n");
        let query = "ta mm";
        let terms: Vec<_> = query.split_whitespace().collect();
        for (key, value) in table.search(query).iter() {
            let haystack = format!("{} {}", key.to_lowercase(), value.to_lowercase());
            assert!(terms.iter().any(|t| haystack.contains(t)));
        }
        assert_eq!(table.search(query).len(), 3);
    }

    #[test]
    fn blank_query_matches_nothing() {
        let table = brand_table("Area,Key Info\nA,alpha\n");
        assert!(table.search("   ").is_empty());
    }
}
