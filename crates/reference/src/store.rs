//! Loading reference tables from disk.

use crate::category::Category;
use crate::csv::Sheet;
use crate::fuzzy::{ComplianceRuleResolution, MANDATORY_RULES};
use crate::table::ReferenceTable;
use copyforge_config::ReferenceConfig;
use copyforge_core::error::ReferenceError;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Reads the three reference tables from their configured files.
///
/// Every load goes back to disk; callers that need a stable snapshot load
/// once and keep the returned table.
#[derive(Debug, Clone)]
pub struct ReferenceStore {
    config: ReferenceConfig,
}

impl ReferenceStore {
    pub fn new(config: ReferenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReferenceConfig {
        &self.config
    }

    pub fn path_for(&self, category: Category) -> PathBuf {
        category.path_in(&self.config)
    }

    /// Load a table by category name.
    pub fn load_named(&self, name: &str) -> Result<ReferenceTable, ReferenceError> {
        self.load(name.parse()?)
    }

    /// Load a category's table, writing the default skeleton first if the
    /// file does not exist.
    pub fn load(&self, category: Category) -> Result<ReferenceTable, ReferenceError> {
        let path = self.path_for(category);
        let sheet = self.read_sheet(category, &path)?;
        let table = ReferenceTable::from_sheet(category, &sheet, &path)?;

        info!(
            target: "copyforge::audit",
            source = %path.display(),
            rows = table.len(),
            category = %category,
            "reference table loaded"
        );
        Ok(table)
    }

    /// Load a category, degrading retrieval failures to an empty table.
    pub fn load_or_empty(&self, category: Category) -> ReferenceTable {
        match self.load(category) {
            Ok(table) => table,
            Err(e) => {
                error!(category = %category, error = %e, "Reference table unavailable, using empty table");
                ReferenceTable::empty(category)
            }
        }
    }

    /// All three tables, in category order. Unavailable tables are empty.
    pub fn load_all(&self) -> Vec<ReferenceTable> {
        Category::ALL
            .into_iter()
            .map(|category| self.load_or_empty(category))
            .collect()
    }

    /// Resolve the mandatory compliance rules against the compliance sheet.
    /// An unreadable sheet resolves every rule to the placeholder.
    pub fn resolve_compliance_rules(&self) -> ComplianceRuleResolution {
        let category = Category::ComplianceInfo;
        let path = self.path_for(category);

        let resolution = match self.read_sheet(category, &path) {
            Ok(sheet) => ComplianceRuleResolution::resolve(&sheet, &MANDATORY_RULES),
            Err(e) => {
                error!(error = %e, "Compliance rules unavailable, using placeholders");
                ComplianceRuleResolution::unresolved(&MANDATORY_RULES)
            }
        };

        let unresolved = resolution.unresolved_rules();
        if !unresolved.is_empty() {
            warn!(rules = ?unresolved, "Compliance rules fell back to placeholder");
        }
        resolution
    }

    /// Write skeletons for any missing category files. Returns the paths
    /// that were created.
    pub fn ensure_defaults(&self) -> Result<Vec<PathBuf>, ReferenceError> {
        let mut created = Vec::new();
        for category in Category::ALL {
            let path = self.path_for(category);
            if !path.exists() {
                write_skeleton(category, &path)?;
                created.push(path);
            }
        }
        Ok(created)
    }

    fn read_sheet(&self, category: Category, path: &Path) -> Result<Sheet, ReferenceError> {
        if !path.exists() {
            write_skeleton(category, path)?;
        }

        let content = std::fs::read_to_string(path).map_err(|e| ReferenceError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Sheet::parse(&content).map_err(|e| ReferenceError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

fn write_skeleton(category: Category, path: &Path) -> Result<(), ReferenceError> {
    let write_err = |e: std::io::Error| ReferenceError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let sheet = Sheet::from_records(category.default_records());
    std::fs::write(path, sheet.to_csv()).map_err(write_err)?;

    warn!(category = %category, path = %path.display(), "Reference file missing, created default skeleton");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::RULE_PLACEHOLDER;

    fn store_in(dir: &Path) -> ReferenceStore {
        ReferenceStore::new(ReferenceConfig::rooted_at(dir))
    }

    fn write(store: &ReferenceStore, category: Category, content: &str) {
        let path = store.path_for(category);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn missing_file_is_backfilled_with_skeleton() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let table = store.load(Category::BestPractices).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.get("Blog Article"), Some("Incorporate storytelling elements"));
        assert!(store.path_for(Category::BestPractices).exists());
    }

    #[test]
    fn skeleton_placeholder_rows_are_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        assert!(store.load(Category::BrandInfo).unwrap().is_empty());
        assert!(store.load(Category::ComplianceInfo).unwrap().is_empty());
    }

    #[test]
    fn reloads_from_disk_on_every_call() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        write(&store, Category::BrandInfo, "Area,Key Info\nBrand Name,Old\n");
        assert_eq!(store.load(Category::BrandInfo).unwrap().get("Brand Name"), Some("Old"));

        write(&store, Category::BrandInfo, "Area,Key Info\nBrand Name,New\n");
        assert_eq!(store.load(Category::BrandInfo).unwrap().get("Brand Name"), Some("New"));
    }

    #[test]
    fn unknown_category_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = store_in(dir.path()).load_named("recipes").unwrap_err();
        assert!(matches!(err, ReferenceError::InvalidCategory(_)));
    }

    #[test]
    fn malformed_file_degrades_to_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        write(&store, Category::BrandInfo, "Area,Key Info\n\"never closed\n");

        assert!(matches!(
            store.load(Category::BrandInfo),
            Err(ReferenceError::Malformed { .. })
        ));
        assert!(store.load_or_empty(Category::BrandInfo).is_empty());
    }

    #[test]
    fn load_all_returns_three_tables() {
        let dir = tempfile::tempdir().unwrap();
        let tables = store_in(dir.path()).load_all();
        let categories: Vec<_> = tables.iter().map(|t| t.category()).collect();
        assert_eq!(categories, Category::ALL.to_vec());
    }

    #[test]
    fn compliance_rules_resolve_from_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        write(
            &store,
            Category::ComplianceInfo,
            "disclaimer_necessari,data_protection\nInvesting involves risk.,GDPR notice\n",
        );

        let rules = store.resolve_compliance_rules();
        assert_eq!(rules.get("disclaimer"), Some("Investing involves risk."));
        assert_eq!(rules.get("data_protection"), Some("GDPR notice"));
    }

    #[test]
    fn default_compliance_sheet_resolves_to_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let rules = store_in(dir.path()).resolve_compliance_rules();
        assert_eq!(rules.get("disclaimer"), Some(RULE_PLACEHOLDER));
        assert_eq!(rules.get("data_protection"), Some(RULE_PLACEHOLDER));
    }

    #[test]
    fn ensure_defaults_creates_only_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        write(&store, Category::BrandInfo, "Area,Key Info\nBrand Name,Acme\n");

        let created = store.ensure_defaults().unwrap();
        assert_eq!(created.len(), 2);
        assert!(store.ensure_defaults().unwrap().is_empty());
        assert_eq!(store.load(Category::BrandInfo).unwrap().get("Brand Name"), Some("Acme"));
    }
}
