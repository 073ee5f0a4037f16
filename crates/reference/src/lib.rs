//! Reference data for CopyForge.
//!
//! Three categorized lookup tables back the content pipeline: brand facts,
//! content best practices, and compliance rules. Each lives in a two-column
//! CSV file under a configured base directory. Missing files are recreated
//! from a default skeleton so retrieval never fails for that reason alone.

pub mod category;
pub mod csv;
pub mod fuzzy;
pub mod store;
pub mod table;

pub use category::{Category, Schema};
pub use csv::Sheet;
pub use fuzzy::{partial_ratio, ComplianceRuleResolution, MANDATORY_RULES, RULE_PLACEHOLDER};
pub use store::ReferenceStore;
pub use table::{QueryResult, ReferenceTable};
