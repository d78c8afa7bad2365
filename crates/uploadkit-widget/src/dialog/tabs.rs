//! Tab panel and tab button handles
//!
//! Both are cheap clones over shared state. Custom tab renderers receive
//! them and write into them; the dialog owns activation and visibility.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Name of the built-in preview tab
pub const PREVIEW_TAB: &str = "preview";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct PanelState {
    content: String,
    active: bool,
}

/// Content area of one tab
#[derive(Clone)]
pub struct TabPanel {
    tab: Arc<str>,
    state: Arc<Mutex<PanelState>>,
}

impl TabPanel {
    pub(crate) fn new(tab: &str) -> Self {
        Self {
            tab: Arc::from(tab),
            state: Arc::new(Mutex::new(PanelState::default())),
        }
    }

    pub fn tab(&self) -> &str {
        &self.tab
    }

    pub fn content(&self) -> String {
        lock(&self.state).content.clone()
    }

    pub fn set_content(&self, content: impl Into<String>) {
        lock(&self.state).content = content.into();
    }

    pub fn append(&self, content: &str) {
        lock(&self.state).content.push_str(content);
    }

    /// Whether this is the dialog's current tab
    pub fn is_active(&self) -> bool {
        lock(&self.state).active
    }

    pub(crate) fn set_active(&self, active: bool) {
        lock(&self.state).active = active;
    }
}

impl fmt::Debug for TabPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabPanel")
            .field("tab", &self.tab)
            .field("active", &self.is_active())
            .finish()
    }
}

#[derive(Debug)]
struct ButtonState {
    title: String,
    visible: bool,
}

/// Entry for one tab in the dialog's tab bar
#[derive(Clone)]
pub struct TabButton {
    tab: Arc<str>,
    state: Arc<Mutex<ButtonState>>,
}

impl TabButton {
    pub(crate) fn new(tab: &str, visible: bool) -> Self {
        Self {
            tab: Arc::from(tab),
            state: Arc::new(Mutex::new(ButtonState {
                title: tab.to_string(),
                visible,
            })),
        }
    }

    pub fn tab(&self) -> &str {
        &self.tab
    }

    pub fn title(&self) -> String {
        lock(&self.state).title.clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        lock(&self.state).title = title.into();
    }

    pub fn is_visible(&self) -> bool {
        lock(&self.state).visible
    }

    /// Returns `true` if the visibility changed
    pub(crate) fn set_visible(&self, visible: bool) -> bool {
        let mut state = lock(&self.state);
        let changed = state.visible != visible;
        state.visible = visible;
        changed
    }
}

impl fmt::Debug for TabButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabButton")
            .field("tab", &self.tab)
            .field("visible", &self.is_visible())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_visibility_change() {
        let button = TabButton::new("url", true);
        assert_eq!(button.title(), "url");
        assert!(!button.set_visible(true));
        assert!(button.set_visible(false));
        assert!(!button.is_visible());
    }

    #[test]
    fn test_panel_content_is_shared() {
        let panel = TabPanel::new("data");
        let clone = panel.clone();
        clone.set_content("<ul>");
        panel.append("</ul>");
        assert_eq!(clone.content(), "<ul></ul>");
    }
}
