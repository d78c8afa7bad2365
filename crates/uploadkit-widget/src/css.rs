//! Stylesheets injected into the dialog for custom tabs

use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleEntry {
    /// Inline CSS text
    Inline(String),
    /// URL of an external stylesheet
    Url(String),
}

/// Shared, ordered list of stylesheet entries
#[derive(Debug, Clone, Default)]
pub struct TabsCss {
    entries: Arc<Mutex<Vec<StyleEntry>>>,
}

impl TabsCss {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StyleEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add inline CSS. Blank input is ignored and returns `false`.
    pub fn add_style(&self, css: impl Into<String>) -> bool {
        self.push(StyleEntry::Inline(css.into()))
    }

    /// Add a stylesheet URL. Blank input is ignored and returns `false`.
    pub fn add_url(&self, url: impl Into<String>) -> bool {
        self.push(StyleEntry::Url(url.into()))
    }

    fn push(&self, entry: StyleEntry) -> bool {
        let blank = match &entry {
            StyleEntry::Inline(text) | StyleEntry::Url(text) => text.trim().is_empty(),
        };
        if blank {
            return false;
        }
        self.lock().push(entry);
        true
    }

    /// Entries in insertion order
    pub fn styles(&self) -> Vec<StyleEntry> {
        self.lock().clone()
    }

    /// Render all entries as one stylesheet, URLs as `@import` rules first
    pub fn render(&self) -> String {
        let entries = self.lock();
        let imports = entries.iter().filter_map(|entry| match entry {
            StyleEntry::Url(url) => Some(format!("@import url(\"{}\");", url.trim())),
            StyleEntry::Inline(_) => None,
        });
        let inline = entries.iter().filter_map(|entry| match entry {
            StyleEntry::Inline(css) => Some(css.trim().to_string()),
            StyleEntry::Url(_) => None,
        });
        imports.chain(inline).collect::<Vec<_>>().join("\n")
    }
}
