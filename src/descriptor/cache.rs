//! Descriptor Cache
//!
//! Memoizes loaded descriptor pools per (module, search path). Entries are
//! populated lazily and never invalidated; failed loads are not cached.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::DescriptorPool;
use crate::error::Result;

/// Identity of a loaded module
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleKey {
    /// Schema source or descriptor set the pool was loaded from
    pub module: PathBuf,
    /// Include root used when compiling, if any
    pub search_path: Option<PathBuf>,
}

impl ModuleKey {
    pub fn new(module: impl Into<PathBuf>, search_path: Option<&Path>) -> Self {
        Self {
            module: module.into(),
            search_path: search_path.map(Path::to_path_buf),
        }
    }
}

/// Read-through cache of descriptor pools
#[derive(Debug, Default)]
pub struct DescriptorCache {
    entries: HashMap<ModuleKey, Arc<DescriptorPool>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ModuleKey) -> Option<Arc<DescriptorPool>> {
        self.entries.get(key).cloned()
    }

    /// Return the cached pool, loading it on first use
    pub fn get_or_try_load<F>(&mut self, key: ModuleKey, load: F) -> Result<Arc<DescriptorPool>>
    where
        F: FnOnce(&ModuleKey) -> Result<DescriptorPool>,
    {
        if let Some(pool) = self.entries.get(&key) {
            tracing::debug!(module = %key.module.display(), "descriptor cache hit");
            return Ok(Arc::clone(pool));
        }

        tracing::debug!(module = %key.module.display(), "descriptor cache miss");
        let pool = Arc::new(load(&key)?);
        self.entries.insert(key, Arc::clone(&pool));
        Ok(pool)
    }

    pub fn contains(&self, key: &ModuleKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
