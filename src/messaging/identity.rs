//! Identity Resolver - Maps a principal's email to a display role label

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Label returned for addresses missing from the catalog.
pub const DEFAULT_ROLE: &str = "Volunteer";

/// Organization addresses known out of the box.
const KNOWN_ROLES: &[(&str, &str)] = &[
    ("ceo@example.com", "CEO"),
    ("volunteer@example.com", "Volunteer"),
    ("boardmember@example.com", "Board Member"),
    ("reptile-caregiver@example.com", "Caregiver"),
    ("hr@example.com", "HR"),
    ("dog-caregiver@example.com", "Caregiver"),
    ("cat-caregiver@example.com", "Caregiver"),
    ("caregivers@example.com", "Caregiver"),
    ("headcare@example.com", "Head Caregiver"),
    ("bird-caregiver@nsae.com", "Caregiver"),
    ("wildlife-caregiver@nsae.com", "Caregiver"),
    ("mamal-caregiver@nase.com", "Caregiver"),
    ("other-caregiver@nase.com", "Caregiver"),
];

/// Static email -> role lookup table, injected into the application state.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RoleCatalog {
    roles: BTreeMap<String, String>,
    default_role: String,
}

impl Default for RoleCatalog {
    fn default() -> Self {
        Self::from_pairs(KNOWN_ROLES.iter().copied())
    }
}

impl RoleCatalog {
    /// Empty catalog: every address resolves to the default role.
    pub fn empty() -> Self {
        Self {
            roles: BTreeMap::new(),
            default_role: DEFAULT_ROLE.to_string(),
        }
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut catalog = Self::empty();
        for (email, role) in pairs {
            catalog.insert(email, role);
        }
        catalog
    }

    /// Loads a JSON object `{ "email": "Role" }` and merges it over the
    /// built-in addresses. File entries win on conflict.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_overrides(mut self, path: impl AsRef<Path>) -> Result<Self, String> {
        let raw = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Unable to read role catalog: {}", e))?;
        let overrides: BTreeMap<String, String> = serde_json::from_str(&raw)
            .map_err(|e| format!("Invalid role catalog JSON: {}", e))?;

        info!(entries = overrides.len(), "Role catalog overrides loaded");
        for (email, role) in overrides {
            self.insert(&email, &role);
        }
        Ok(self)
    }

    pub fn insert(&mut self, email: &str, role: &str) {
        self.roles
            .insert(email.trim().to_lowercase(), role.trim().to_string());
    }

    /// Total lookup: unknown addresses get the default label.
    pub fn resolve_role(&self, email: &str) -> &str {
        let role = self
            .roles
            .get(&email.trim().to_lowercase())
            .map(String::as_str)
            .unwrap_or(&self.default_role);
        debug!(email, role, "Role resolved");
        role
    }

    /// Addresses present in the catalog, sorted.
    pub fn known_addresses(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
