//! Category configuration
//!
//! Two YAML documents drive categorization:
//!
//! ```yaml
//! # categories.yaml
//! categories: [Uncategorized, Food, Travel]
//! ```
//!
//! ```yaml
//! # default_categories.yaml
//! default_categories:
//!   "Cafe X": Food
//! ```
//!
//! Either key may appear in either file. The configuration is loaded once at
//! startup and handed to the ingestion and aggregation code by reference.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::UNCATEGORIZED;

/// File name looked up for the category list
pub const CATEGORIES_FILE: &str = "categories.yaml";

/// Older name for the category list, used when `categories.yaml` is absent
pub const LEGACY_CATEGORIES_FILE: &str = "config.yaml";

/// File name looked up for the merchant-to-category mapping
pub const MAPPING_FILE: &str = "default_categories.yaml";

/// Built-in category list used when no file provides one
pub const DEFAULT_CATEGORIES: &[&str] = &[
    UNCATEGORIZED,
    "Food",
    "Clothing",
    "Travel",
    "Entertainment",
    "Utilities",
    "Healthcare",
    "Education",
    "Car Expenses",
    "Other",
    "fines",
];

/// Recognized category labels and the default merchant mapping
#[derive(Debug, Clone, Serialize)]
pub struct CategoryConfig {
    categories: Vec<String>,
    default_categories: HashMap<String, String>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            HashMap::new(),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    categories: Option<Vec<String>>,
    default_categories: Option<HashMap<String, String>>,
}

impl CategoryConfig {
    /// Build a config; `Uncategorized` is always a valid label
    pub fn new(categories: Vec<String>, default_categories: HashMap<String, String>) -> Self {
        let mut categories = categories;
        if !categories.iter().any(|c| c == UNCATEGORIZED) {
            categories.insert(0, UNCATEGORIZED.to_string());
        }

        for (merchant, category) in &default_categories {
            if !categories.contains(category) {
                warn!(
                    merchant = %merchant,
                    category = %category,
                    "Default mapping points to an unknown category"
                );
            }
        }

        Self {
            categories,
            default_categories,
        }
    }

    /// Load from explicit paths, falling back to the usual locations
    ///
    /// An explicit path that does not exist is an error. Without a path the
    /// working directory and then `<config dir>/spendscan/` are searched, and
    /// built-in defaults apply when nothing is found. The category list is
    /// also read from `config.yaml` when no `categories.yaml` exists.
    pub fn load(categories_path: Option<&Path>, mapping_path: Option<&Path>) -> Result<Self> {
        let categories_file =
            resolve_path(categories_path, &[CATEGORIES_FILE, LEGACY_CATEGORIES_FILE])?;
        let mapping_file = resolve_path(mapping_path, &[MAPPING_FILE])?;

        let mut categories: Option<Vec<String>> = None;
        let mut mapping: HashMap<String, String> = HashMap::new();

        for path in [&categories_file, &mapping_file].into_iter().flatten() {
            let raw = read_raw(path)?;
            if categories.is_none() {
                categories = raw.categories;
            }
            if let Some(entries) = raw.default_categories {
                mapping.extend(entries);
            }
        }

        let config = Self::new(
            categories
                .unwrap_or_else(|| DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()),
            mapping,
        );
        info!(
            categories = config.categories.len(),
            mapped_merchants = config.default_categories.len(),
            "Loaded category configuration"
        );
        Ok(config)
    }

    /// Parse a single YAML document holding either or both keys
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let raw = parse_raw(content)?;
        Ok(Self::new(
            raw.categories
                .unwrap_or_else(|| DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()),
            raw.default_categories.unwrap_or_default(),
        ))
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn default_categories(&self) -> &HashMap<String, String> {
        &self.default_categories
    }

    /// Category for a merchant from the default mapping (exact name match)
    pub fn default_category(&self, merchant: &str) -> &str {
        self.default_categories
            .get(merchant)
            .map(String::as_str)
            .unwrap_or(UNCATEGORIZED)
    }

    pub fn is_known(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    /// Reject labels outside the configured enumeration
    pub fn validate(&self, category: &str) -> Result<()> {
        if self.is_known(category) {
            Ok(())
        } else {
            Err(Error::InvalidCategory(category.to_string()))
        }
    }
}

/// Default per-user config directory
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("spendscan"))
}

fn resolve_path(explicit: Option<&Path>, file_names: &[&str]) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    let mut search_dirs = vec![PathBuf::new()];
    search_dirs.extend(default_config_dir());

    let found = find_config_file(&search_dirs, file_names);
    if found.is_none() {
        debug!(files = ?file_names, "No config file found, using defaults");
    }
    Ok(found)
}

/// First existing file, trying every name in a directory before the next one
fn find_config_file(dirs: &[PathBuf], file_names: &[&str]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| file_names.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

fn read_raw(path: &Path) -> Result<RawConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    debug!(path = %path.display(), "Reading category config");
    parse_raw(&content)
}

fn parse_raw(content: &str) -> Result<RawConfig> {
    if content.trim().is_empty() {
        return Ok(RawConfig::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = CategoryConfig::default();
        assert_eq!(config.categories().len(), DEFAULT_CATEGORIES.len());
        assert!(config.is_known("Car Expenses"));
        assert_eq!(config.default_category("Anything"), UNCATEGORIZED);
    }

    #[test]
    fn test_uncategorized_always_present() {
        let config = CategoryConfig::new(vec!["Food".into()], HashMap::new());
        assert_eq!(config.categories()[0], UNCATEGORIZED);
        assert!(config.validate(UNCATEGORIZED).is_ok());
    }

    #[test]
    fn test_from_yaml_str() {
        let config = CategoryConfig::from_yaml_str(
            r#"
categories: [Food, Travel]
default_categories:
  "Cafe X": Food
  "El Al": Travel
"#,
        )
        .unwrap();

        assert_eq!(config.categories(), &["Uncategorized", "Food", "Travel"]);
        assert_eq!(config.default_category("Cafe X"), "Food");
        assert_eq!(config.default_category("cafe x"), UNCATEGORIZED);
        assert!(matches!(
            config.validate("Clothing"),
            Err(Error::InvalidCategory(_))
        ));
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = CategoryConfig::from_yaml_str("").unwrap();
        assert_eq!(config.categories().len(), DEFAULT_CATEGORIES.len());
        assert!(config.default_categories().is_empty());
    }

    #[test]
    fn test_load_two_files() {
        let dir = tempfile::tempdir().unwrap();
        let categories_path = dir.path().join("config.yaml");
        let mapping_path = dir.path().join("mapping.yaml");

        let mut f = std::fs::File::create(&categories_path).unwrap();
        writeln!(f, "categories:\n  - Food\n  - Fuel").unwrap();
        let mut f = std::fs::File::create(&mapping_path).unwrap();
        writeln!(f, "default_categories:\n  Paz: Fuel\n  Aroma: Food").unwrap();

        let config =
            CategoryConfig::load(Some(&categories_path), Some(&mapping_path)).unwrap();
        assert!(config.is_known("Fuel"));
        assert!(!config.is_known("Travel"));
        assert_eq!(config.default_category("Paz"), "Fuel");
        assert_eq!(config.default_category("Aroma"), "Food");
    }

    #[test]
    fn test_find_config_file_falls_back_to_legacy_name() {
        let local = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        let dirs = vec![local.path().to_path_buf(), user.path().to_path_buf()];
        let names = [CATEGORIES_FILE, LEGACY_CATEGORIES_FILE];

        assert_eq!(find_config_file(&dirs, &names), None);

        std::fs::write(user.path().join(CATEGORIES_FILE), "categories: [Food]").unwrap();
        assert_eq!(
            find_config_file(&dirs, &names),
            Some(user.path().join(CATEGORIES_FILE))
        );

        // Earlier directories win, whichever name they hold
        let legacy = local.path().join(LEGACY_CATEGORIES_FILE);
        std::fs::write(&legacy, "categories: [Fuel]").unwrap();
        assert_eq!(find_config_file(&dirs, &names), Some(legacy.clone()));

        let preferred = local.path().join(CATEGORIES_FILE);
        std::fs::write(&preferred, "categories: [Travel]").unwrap();
        assert_eq!(find_config_file(&dirs, &names), Some(preferred));

        let config = CategoryConfig::load(Some(&legacy), None).unwrap();
        assert!(config.is_known("Fuel"));
    }

    #[test]
    fn test_load_missing_explicit_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        let result = CategoryConfig::load(Some(&missing), None);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let result = CategoryConfig::from_yaml_str("categories: {not: [a list");
        assert!(matches!(result, Err(Error::Yaml(_))));
    }
}
