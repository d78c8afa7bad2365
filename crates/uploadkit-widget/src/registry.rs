//! Custom tab registry
//!
//! Renderers are looked up by tab name when a dialog activates a tab for the
//! first time.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use uploadkit_core::Settings;

use crate::dialog::{Dialog, TabButton, TabPanel};

/// Everything a tab renderer gets to work with
#[derive(Debug, Clone)]
pub struct TabContext {
    pub container: TabPanel,
    pub button: TabButton,
    pub dialog: Dialog,
    pub settings: Arc<Settings>,
    pub name: String,
}

pub type TabRenderer = Arc<dyn Fn(TabContext) + Send + Sync>;

/// Tab registry for managing custom tab renderers
#[derive(Clone, Default)]
pub struct TabRegistry {
    renderers: Arc<RwLock<HashMap<String, TabRenderer>>>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a renderer. Returns `true` if an existing one was replaced.
    pub fn register(&self, name: impl Into<String>, renderer: TabRenderer) -> bool {
        let name = name.into();
        let replaced = self
            .renderers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.clone(), renderer)
            .is_some();
        tracing::info!(tab = %name, replaced, "Tab registered");
        replaced
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.renderers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(name)
            .is_some()
    }

    pub fn get(&self, name: &str) -> Option<TabRenderer> {
        self.renderers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered tab names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .renderers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl fmt::Debug for TabRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabRegistry")
            .field("tabs", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_replace() {
        let registry = TabRegistry::new();
        assert!(!registry.register("data", Arc::new(|_ctx: TabContext| {})));
        assert!(registry.register("data", Arc::new(|_ctx: TabContext| {})));
        registry.register("album", Arc::new(|_ctx: TabContext| {}));

        assert_eq!(registry.names(), vec!["album", "data"]);
        assert!(registry.unregister("album"));
        assert!(!registry.contains("album"));
        assert!(registry.get("data").is_some());
    }
}
