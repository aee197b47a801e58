use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::command::CommandSuggestion;
use crate::error::{Result, ViewError};

const DEFAULT_CATALOG: [(&str, &str, &str); 6] = [
    (
        "combine-thesis",
        "Combine Thesis",
        "Merge drafted chapters into one thesis document",
    ),
    (
        "literature-review",
        "Literature Review",
        "Survey sources for a topic and summarize findings",
    ),
    (
        "summarize-paper",
        "Summarize Paper",
        "Condense an attached paper into key points",
    ),
    (
        "draft-outline",
        "Draft Outline",
        "Propose a section outline for the current work",
    ),
    (
        "check-citations",
        "Check Citations",
        "Verify references against the attached sources",
    ),
    (
        "university-search",
        "University Search",
        "Find programs matching the stated criteria",
    ),
];

/// Source of the workflow catalog. Consulted once per view lifetime.
pub trait CatalogProvider {
    fn load(&self) -> Result<Vec<CommandSuggestion>>;
}

/// Catalog stored as a JSON array of `{token, name, description}`.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogProvider for FileCatalog {
    fn load(&self) -> Result<Vec<CommandSuggestion>> {
        let raw = fs::read_to_string(&self.path).map_err(|err| ViewError::io(&self.path, err))?;
        let entries: Vec<CommandSuggestion> = serde_json::from_str(&raw)?;
        let entries = normalize(entries);
        if entries.is_empty() {
            return Err(ViewError::Catalog(format!(
                "{} has no usable entries",
                self.path.display()
            )));
        }
        Ok(entries)
    }
}

pub fn default_catalog() -> Vec<CommandSuggestion> {
    DEFAULT_CATALOG
        .iter()
        .map(|(token, name, description)| CommandSuggestion::new(*token, *name, *description))
        .collect()
}

/// Loads the catalog, falling back to the built-in set on any failure.
pub fn load_or_default(provider: Option<&dyn CatalogProvider>) -> Vec<CommandSuggestion> {
    let Some(provider) = provider else {
        return default_catalog();
    };
    match provider.load() {
        Ok(entries) => {
            info!(entries = entries.len(), "loaded workflow catalog");
            entries
        }
        Err(err) => {
            warn!(error = %err, "workflow catalog unavailable, using built-in defaults");
            default_catalog()
        }
    }
}

/// Strips leading slashes and whitespace from tokens, drops blanks, keeps the
/// first entry for each token.
fn normalize(entries: Vec<CommandSuggestion>) -> Vec<CommandSuggestion> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter_map(|mut entry| {
            entry.token = entry.token.trim().trim_start_matches('/').to_string();
            if entry.token.is_empty() || entry.token.contains(char::is_whitespace) {
                return None;
            }
            if entry.display_name.trim().is_empty() {
                entry.display_name = entry.token.clone();
            }
            seen.insert(entry.token.clone()).then_some(entry)
        })
        .collect()
}
