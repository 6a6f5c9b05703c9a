//! Seed reference data from YAML.
//!
//! # File format
//!
//! ```yaml
//! categories:
//!   - name: Surgical Supplies
//!     description: Gloves, gowns, drapes and sutures
//!   - name: Diagnostics
//! ```
//!
//! Categories are matched by name. Existing rows keep their ID and get the
//! description from the file.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use super::{CommandError, connect};

/// Top-level shape of a categories seed file.
#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub categories: Vec<CategoryEntry>,
}

/// One category to upsert.
#[derive(Debug, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Parse and validate a categories seed file.
///
/// # Errors
///
/// Returns `CommandError::Yaml` on malformed input and
/// `CommandError::Invalid` for empty or duplicate names.
pub fn parse_categories(content: &str) -> Result<CategorySeed, CommandError> {
    let mut seed: CategorySeed = serde_yaml::from_str(content)?;

    let mut seen = HashSet::new();
    for entry in &mut seed.categories {
        entry.name = entry.name.trim().to_owned();
        entry.description = entry
            .description
            .take()
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        if entry.name.is_empty() {
            return Err(CommandError::Invalid("category name is empty".to_owned()));
        }
        if !seen.insert(entry.name.to_lowercase()) {
            return Err(CommandError::Invalid(format!(
                "duplicate category: {}",
                entry.name
            )));
        }
    }

    Ok(seed)
}

/// Upsert categories from a YAML file in one transaction.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a database
/// operation fails.
pub async fn categories(file_path: &str) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: file_path.to_owned(),
            source,
        })?;

    // Validate before touching the database
    let seed = parse_categories(&content)?;
    tracing::info!(path = %file_path, categories = seed.categories.len(), "Parsed seed file");

    let pool = connect().await?;
    let mut tx = pool.begin().await?;

    let mut inserted = 0_usize;
    let mut updated = 0_usize;
    for entry in &seed.categories {
        let was_insert = sqlx::query_scalar::<_, bool>(
            r"
            INSERT INTO categories (name, description)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description
            RETURNING (xmax = 0)
            ",
        )
        .bind(&entry.name)
        .bind(&entry.description)
        .fetch_one(&mut *tx)
        .await?;

        if was_insert {
            inserted += 1;
        } else {
            updated += 1;
        }
    }

    tx.commit().await?;

    tracing::info!("Seeding complete!");
    tracing::info!("  Categories inserted: {inserted}");
    tracing::info!("  Categories updated: {updated}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_drops_blank_descriptions() {
        let seed = parse_categories(
            "categories:\n  - name: '  Diagnostics '\n    description: '  '\n  - name: PPE\n    description: Masks and gloves\n",
        )
        .unwrap();

        assert_eq!(seed.categories.len(), 2);
        assert_eq!(seed.categories[0].name, "Diagnostics");
        assert!(seed.categories[0].description.is_none());
        assert_eq!(
            seed.categories[1].description.as_deref(),
            Some("Masks and gloves")
        );
    }

    #[test]
    fn test_parse_rejects_duplicate_names_case_insensitively() {
        let err = parse_categories("categories:\n  - name: PPE\n  - name: ppe\n").unwrap_err();
        assert!(matches!(err, CommandError::Invalid(_)));
    }

    #[test]
    fn test_parse_rejects_empty_name() {
        let err = parse_categories("categories:\n  - name: ' '\n").unwrap_err();
        assert!(matches!(err, CommandError::Invalid(_)));
    }

    #[test]
    fn test_parse_rejects_malformed_yaml() {
        let err = parse_categories("categories: 3").unwrap_err();
        assert!(matches!(err, CommandError::Yaml(_)));
    }
}
