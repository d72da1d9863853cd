//! Service catalog lookups.
//!
//! The engine matches services to rules by name, resolved through this
//! lookup boundary. Keeping it behind a trait means an identifier-based
//! matcher can replace the name-based one without touching the
//! threshold logic.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Read-only, synchronous catalog lookups. A name unknown to the
/// catalog matches nothing.
pub trait ServiceCatalog {
    fn resolve_category(&self, service_name: &str) -> Option<&str>;
    fn resolve_service_id(&self, service_name: &str) -> Option<&str>;
}

/// One catalog row, as supplied by the surrounding system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub category_id: String,
}

/// In-memory catalog. On duplicate service names the first entry wins.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    by_name: HashMap<String, CatalogEntry>,
}

impl StaticCatalog {
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut by_name = HashMap::new();
        for entry in entries {
            by_name.entry(entry.name.clone()).or_insert(entry);
        }
        Self { by_name }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl ServiceCatalog for StaticCatalog {
    fn resolve_category(&self, service_name: &str) -> Option<&str> {
        self.by_name
            .get(service_name)
            .map(|e| e.category_id.as_str())
    }

    fn resolve_service_id(&self, service_name: &str) -> Option<&str> {
        self.by_name.get(service_name).map(|e| e.id.as_str())
    }
}
