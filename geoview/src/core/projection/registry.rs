//! Session registry of projected reference systems

use super::definition::canonicalize;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// A reference system code bound to its definition string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSystem {
    pub code: String,
    pub definition: String,
}

impl ReferenceSystem {
    pub fn new(code: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            code: normalize_code(&code.into()),
            definition: canonicalize(&definition.into()),
        }
    }
}

/// Maps each code to exactly one definition for the lifetime of the session
///
/// Registering a code again with the same definition is a no-op; registering
/// it with a different one is rejected.
#[derive(Debug, Default)]
pub struct CrsRegistry {
    systems: HashMap<String, ReferenceSystem>,
}

impl CrsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a code/definition pair
    pub fn register(&mut self, code: &str, definition: &str) -> Result<&ReferenceSystem, ConfigError> {
        let system = ReferenceSystem::new(code, definition);

        if let Some(existing) = self.systems.get(&system.code) {
            if existing.definition != system.definition {
                return Err(ConfigError::ConflictingDefinition {
                    code: system.code,
                    existing: existing.definition.clone(),
                    requested: system.definition,
                });
            }
            debug!(code = %system.code, "Reference system already registered");
        } else {
            info!(code = %system.code, definition = %system.definition, "Registered reference system");
        }

        let key = system.code.clone();
        Ok(self.systems.entry(key).or_insert(system))
    }

    pub fn get(&self, code: &str) -> Option<&ReferenceSystem> {
        self.systems.get(&normalize_code(code))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.systems.contains_key(&normalize_code(code))
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> + '_ {
        self.systems.keys().map(String::as_str)
    }

    /// Forget every registration
    pub fn clear(&mut self) {
        self.systems.clear();
    }
}

/// Upper-case authority and strip surrounding whitespace
///
/// `"epsg:32633"` and `" EPSG:32633"` name the same system.
pub fn normalize_code(code: &str) -> String {
    let trimmed = code.trim();
    match trimmed.split_once(':') {
        Some((authority, id)) => format!("{}:{}", authority.trim().to_ascii_uppercase(), id.trim()),
        None => trimmed.to_ascii_uppercase(),
    }
}

/// Definitions derivable from an EPSG code without a lookup service
///
/// Covers geographic WGS84/ETRS89, web mercator, and the UTM families on
/// WGS84 (326zz north, 327zz south) and ETRS89 (258zz).
pub fn well_known_definition(code: &str) -> Option<String> {
    let code = normalize_code(code);
    let id = code.strip_prefix("EPSG:")?;

    match id {
        "4326" => return Some("+proj=longlat +datum=WGS84 +no_defs".to_string()),
        "4258" => return Some("+proj=longlat +ellps=GRS80 +no_defs".to_string()),
        "3857" | "900913" => {
            return Some(
                "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs"
                    .to_string(),
            )
        }
        _ => {}
    }

    let number: u32 = id.parse().ok()?;
    let zone = number % 100;
    if !(1..=60).contains(&zone) {
        return None;
    }

    match number / 100 {
        326 => Some(format!("+proj=utm +zone={zone} +datum=WGS84 +units=m +no_defs")),
        327 => Some(format!("+proj=utm +zone={zone} +south +datum=WGS84 +units=m +no_defs")),
        258 => Some(format!("+proj=utm +zone={zone} +ellps=GRS80 +units=m +no_defs")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UTM33: &str = "+proj=utm +zone=33 +datum=WGS84 +units=m +no_defs";

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = CrsRegistry::new();
        registry.register("EPSG:32633", UTM33).unwrap();
        registry.register("epsg:32633", &format!("  {UTM33} ")).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_conflicting_definition_is_rejected() {
        let mut registry = CrsRegistry::new();
        registry.register("EPSG:32633", UTM33).unwrap();

        let result = registry.register("EPSG:32633", "+proj=utm +zone=32 +datum=WGS84");
        assert!(matches!(result, Err(ConfigError::ConflictingDefinition { .. })));
        assert_eq!(registry.get("EPSG:32633").unwrap().definition, UTM33);
    }

    #[test]
    fn test_clear() {
        let mut registry = CrsRegistry::new();
        registry.register("EPSG:32633", UTM33).unwrap();
        registry.clear();
        assert!(registry.is_empty());
        assert!(!registry.contains("EPSG:32633"));
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(" epsg:32633 "), "EPSG:32633");
        assert_eq!(normalize_code("EPSG : 4326"), "EPSG:4326");
    }

    #[test]
    fn test_well_known_definitions() {
        assert_eq!(well_known_definition("EPSG:32633").as_deref(), Some(UTM33));
        assert!(well_known_definition("EPSG:32756").unwrap().contains("+south"));
        assert!(well_known_definition("EPSG:25832").unwrap().contains("GRS80"));
        assert!(well_known_definition("EPSG:3857").is_some());
        assert!(well_known_definition("EPSG:32661").is_none());
        assert!(well_known_definition("EPSG:2056").is_none());
        assert!(well_known_definition("urn:foo").is_none());
    }
}
