//! Asynchronous lookup of definitions for codes the registry does not know

use crate::error::ResourceError;
use async_trait::async_trait;
use std::collections::HashMap;

use super::registry::normalize_code;

/// Source of reference-system definitions, e.g. a remote EPSG service
#[async_trait(?Send)]
pub trait DefinitionResolver {
    /// Look up the definition string for a code
    ///
    /// `Ok(None)` means the resolver does not know the code; `Err` means the
    /// lookup itself failed.
    async fn resolve(&self, code: &str) -> Result<Option<String>, ResourceError>;
}

/// Resolver that knows nothing; used when no lookup service is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRemoteResolver;

#[async_trait(?Send)]
impl DefinitionResolver for NoRemoteResolver {
    async fn resolve(&self, _code: &str) -> Result<Option<String>, ResourceError> {
        Ok(None)
    }
}

/// In-memory resolver backed by a fixed table
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
    definitions: HashMap<String, String>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, code: &str, definition: impl Into<String>) -> Self {
        self.definitions.insert(normalize_code(code), definition.into());
        self
    }
}

#[async_trait(?Send)]
impl DefinitionResolver for StaticResolver {
    async fn resolve(&self, code: &str) -> Result<Option<String>, ResourceError> {
        Ok(self.definitions.get(&normalize_code(code)).cloned())
    }
}
