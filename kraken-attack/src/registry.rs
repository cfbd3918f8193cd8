//! Module registry for lookup by identifier
//!
//! Thread-safe map from module id to implementation. Modules are looked up
//! by the id callers pass on the command line.

use kraken_core::{Error, Module, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Summary of a registered module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub finding_id: &'static str,
    pub description: &'static str,
}

/// Registry of available modules
pub struct ModuleRegistry {
    modules: RwLock<BTreeMap<&'static str, Arc<dyn Module>>>,
}

impl ModuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            modules: RwLock::new(BTreeMap::new()),
        }
    }

    /// Registry pre-filled with `modules`
    pub fn with_modules<I>(modules: I) -> Result<Self>
    where
        I: IntoIterator<Item = Arc<dyn Module>>,
    {
        let registry = Self::new();
        for module in modules {
            registry.register(module)?;
        }
        Ok(registry)
    }

    /// Register a module; fails when the id is taken
    pub fn register(&self, module: Arc<dyn Module>) -> Result<()> {
        let id = module.id();
        let mut modules = self.modules.write();

        if modules.contains_key(id) {
            warn!(module = id, "Module already registered");
            return Err(Error::AlreadyExists(format!(
                "module '{}' already registered",
                id
            )));
        }

        modules.insert(id, module);
        debug!(module = id, "Module registered");
        Ok(())
    }

    /// Remove a module by id
    pub fn unregister(&self, id: &str) -> Result<()> {
        match self.modules.write().remove(id) {
            Some(_) => {
                info!(module = id, "Module unregistered");
                Ok(())
            }
            None => Err(Error::NotFound(format!("module '{}'", id))),
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Module>> {
        self.modules.read().get(id).cloned()
    }

    /// Look up a module, turning a miss into `Error::NotFound`
    pub fn require(&self, id: &str) -> Result<Arc<dyn Module>> {
        self.get(id)
            .ok_or_else(|| Error::NotFound(format!("module '{}'", id)))
    }

    /// Registered modules ordered by id
    pub fn list(&self) -> Vec<ModuleInfo> {
        self.modules
            .read()
            .values()
            .map(|module| {
                let d = module.descriptor();
                ModuleInfo {
                    id: d.id,
                    name: d.name,
                    finding_id: d.finding_id,
                    description: d.description,
                }
            })
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.read().contains_key(id)
    }

    pub fn count(&self) -> usize {
        self.modules.read().len()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
