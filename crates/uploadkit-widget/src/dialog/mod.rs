//! Dialog handles
//!
//! A dialog collects files into a [`FileCollection`] and settles once: the
//! host confirms (resolving with a [`Selection`]) or cancels (rejecting
//! with [`UploadError::Cancelled`]).

mod tabs;

pub use tabs::{TabButton, TabPanel, PREVIEW_TAB};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::join_all;
use uploadkit_core::{FileInfo, Settings, UploadError};

use crate::collection::FileCollection;
use crate::deferred::{Deferred, Promise, PromiseState};
use crate::error::WidgetError;
use crate::file::FilePromise;
use crate::registry::{TabContext, TabRegistry};

static NEXT_DIALOG_ID: AtomicU64 = AtomicU64::new(1);

/// Files the dialog opens with
#[derive(Debug, Clone, Default)]
pub enum InitialSelection {
    #[default]
    None,
    Single(FilePromise),
    Multiple(Vec<FilePromise>),
}

impl InitialSelection {
    fn into_files(self) -> Vec<FilePromise> {
        match self {
            Self::None => Vec::new(),
            Self::Single(file) => vec![file],
            Self::Multiple(files) => files,
        }
    }
}

impl From<FilePromise> for InitialSelection {
    fn from(file: FilePromise) -> Self {
        Self::Single(file)
    }
}

impl From<Option<FilePromise>> for InitialSelection {
    fn from(file: Option<FilePromise>) -> Self {
        file.map_or(Self::None, Self::Single)
    }
}

impl From<Vec<FilePromise>> for InitialSelection {
    fn from(files: Vec<FilePromise>) -> Self {
        Self::Multiple(files)
    }
}

/// What a confirmed dialog resolves with
#[derive(Debug, Clone)]
pub enum Selection {
    Single(FilePromise),
    Multiple(Vec<FilePromise>),
}

impl Selection {
    pub fn files(&self) -> Vec<FilePromise> {
        match self {
            Self::Single(file) => vec![file.clone()],
            Self::Multiple(files) => files.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multiple(files) => files.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, Self::Multiple(_))
    }

    /// Wait for every selected file to settle, in selection order
    pub async fn wait_all(&self) -> Vec<Result<FileInfo, UploadError>> {
        let files = self.files();
        join_all(files.iter().map(|file| file.wait())).await
    }
}

type VisibilityListener = Arc<dyn Fn(&str, bool) + Send + Sync>;

struct TabSlot {
    name: String,
    panel: TabPanel,
    button: TabButton,
    rendered: bool,
    listeners: Vec<VisibilityListener>,
}

struct DialogState {
    tabs: Vec<TabSlot>,
    current: String,
}

impl DialogState {
    fn slot(&self, tab: &str) -> Option<&TabSlot> {
        self.tabs.iter().find(|slot| slot.name == tab)
    }

    fn slot_mut(&mut self, tab: &str) -> Option<&mut TabSlot> {
        self.tabs.iter_mut().find(|slot| slot.name == tab)
    }
}

struct Shared {
    id: u64,
    settings: Arc<Settings>,
    multiple: bool,
    files: FileCollection,
    deferred: Deferred<Selection>,
    registry: TabRegistry,
    state: Mutex<DialogState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, DialogState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Handle to an open (or settled) dialog
#[derive(Clone)]
pub struct Dialog {
    shared: Arc<Shared>,
}

impl Dialog {
    /// Open a dialog on `tab`, or on the first enabled tab.
    ///
    /// The result shape is multiple when `settings.multiple` is set or the
    /// initial selection is a list.
    pub(crate) fn open(
        settings: Arc<Settings>,
        initial: InitialSelection,
        tab: Option<&str>,
        registry: TabRegistry,
    ) -> Result<Self, WidgetError> {
        let multiple = settings.multiple || matches!(initial, InitialSelection::Multiple(_));

        let mut names: Vec<String> = settings.tabs.clone();
        if !names.iter().any(|name| name == PREVIEW_TAB) {
            names.push(PREVIEW_TAB.to_string());
        }
        let tabs = names
            .into_iter()
            .map(|name| TabSlot {
                panel: TabPanel::new(&name),
                button: TabButton::new(&name, name != PREVIEW_TAB),
                rendered: false,
                listeners: Vec::new(),
                name,
            })
            .collect::<Vec<_>>();

        let files = initial.into_files();
        let start = match tab {
            Some(tab) => tab.to_string(),
            None if !multiple && !files.is_empty() && settings.preview_step => {
                PREVIEW_TAB.to_string()
            }
            None => settings
                .first_tab()
                .unwrap_or(PREVIEW_TAB)
                .to_string(),
        };
        if !tabs.iter().any(|slot| slot.name == start) {
            return Err(WidgetError::UnknownTab(start));
        }

        let dialog = Self {
            shared: Arc::new(Shared {
                id: NEXT_DIALOG_ID.fetch_add(1, Ordering::Relaxed),
                settings,
                multiple,
                files: FileCollection::new(),
                deferred: Deferred::new(),
                registry,
                state: Mutex::new(DialogState {
                    tabs,
                    current: start.clone(),
                }),
            }),
        };

        if multiple {
            for file in files {
                dialog.shared.files.add(file);
            }
        } else if let Some(file) = files.into_iter().last() {
            dialog.shared.files.add(file);
        }

        tracing::debug!(
            dialog_id = dialog.shared.id,
            multiple,
            tab = %start,
            files = dialog.shared.files.len(),
            "Dialog opened"
        );
        dialog.switch_tab(&start)?;
        Ok(dialog)
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn settings(&self) -> Arc<Settings> {
        self.shared.settings.clone()
    }

    pub fn is_multiple(&self) -> bool {
        self.shared.multiple
    }

    pub fn promise(&self) -> Promise<Selection> {
        self.shared.deferred.promise()
    }

    pub fn state(&self) -> PromiseState {
        self.shared.deferred.state()
    }

    pub fn is_open(&self) -> bool {
        self.state() == PromiseState::Pending
    }

    pub fn done<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&Selection) + Send + 'static,
    {
        self.promise().done(f);
        self
    }

    pub fn fail<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&UploadError) + Send + 'static,
    {
        self.promise().fail(f);
        self
    }

    pub async fn wait(&self) -> Result<Selection, UploadError> {
        self.promise().wait().await
    }

    /// The files currently selected in the dialog
    pub fn file_coll(&self) -> FileCollection {
        self.shared.files.clone()
    }

    /// Add files to the selection. A single-file dialog keeps only the newest.
    pub fn add_files<I>(&self, files: I) -> Result<(), WidgetError>
    where
        I: IntoIterator<Item = FilePromise>,
    {
        if !self.is_open() {
            return Err(WidgetError::DialogClosed);
        }

        let collection = &self.shared.files;
        if self.shared.multiple {
            for file in files {
                collection.add(file);
            }
            return Ok(());
        }

        let newest = match files.into_iter().last() {
            Some(file) => file,
            None => return Ok(()),
        };
        for existing in collection.get_all() {
            if !existing.ptr_eq(&newest) {
                collection.remove(&existing);
            }
        }
        collection.add(newest);

        if self.shared.settings.preview_step {
            self.switch_tab(PREVIEW_TAB)?;
        }
        Ok(())
    }

    /// Make `tab` visible and current.
    ///
    /// The tab's registered renderer runs on its first activation in this
    /// dialog.
    pub fn switch_tab(&self, tab: &str) -> Result<(), WidgetError> {
        let render = {
            let mut state = self.shared.lock();
            if state.slot(tab).is_none() {
                return Err(WidgetError::UnknownTab(tab.to_string()));
            }
            state.current = tab.to_string();
            for slot in &state.tabs {
                slot.panel.set_active(slot.name == tab);
            }

            let registry = &self.shared.registry;
            match state.slot_mut(tab) {
                Some(slot) if !slot.rendered => registry.get(tab).map(|renderer| {
                    slot.rendered = true;
                    (renderer, slot.panel.clone(), slot.button.clone())
                }),
                _ => None,
            }
        };

        self.set_visibility(tab, true)?;
        tracing::debug!(dialog_id = self.shared.id, tab, "Tab switched");

        if let Some((renderer, container, button)) = render {
            tracing::debug!(dialog_id = self.shared.id, tab, "Rendering custom tab");
            renderer(TabContext {
                container,
                button,
                dialog: self.clone(),
                settings: self.shared.settings.clone(),
                name: tab.to_string(),
            });
        }
        Ok(())
    }

    /// Hide a tab's button. Hiding the current tab moves to the first
    /// visible one.
    pub fn hide_tab(&self, tab: &str) -> Result<(), WidgetError> {
        self.set_visibility(tab, false)?;

        let fallback = {
            let state = self.shared.lock();
            if state.current != tab {
                None
            } else {
                state
                    .tabs
                    .iter()
                    .find(|slot| slot.name != tab && slot.button.is_visible())
                    .map(|slot| slot.name.clone())
            }
        };
        if let Some(next) = fallback {
            self.switch_tab(&next)?;
        }
        Ok(())
    }

    pub fn show_tab(&self, tab: &str) -> Result<(), WidgetError> {
        self.set_visibility(tab, true).map(|_| ())
    }

    /// `false` for unknown tabs
    pub fn is_tab_visible(&self, tab: &str) -> bool {
        self.shared
            .lock()
            .slot(tab)
            .map(|slot| slot.button.is_visible())
            .unwrap_or(false)
    }

    /// Call `listener(tab, visible)` on each visibility change of `tab`.
    ///
    /// Returns `false` if the tab is unknown.
    pub fn on_tab_visibility<F>(&self, tab: &str, listener: F) -> bool
    where
        F: Fn(&str, bool) + Send + Sync + 'static,
    {
        match self.shared.lock().slot_mut(tab) {
            Some(slot) => {
                slot.listeners.push(Arc::new(listener));
                true
            }
            None => false,
        }
    }

    pub fn current_tab(&self) -> String {
        self.shared.lock().current.clone()
    }

    /// All tabs of this dialog, in display order
    pub fn tabs(&self) -> Vec<String> {
        self.shared
            .lock()
            .tabs
            .iter()
            .map(|slot| slot.name.clone())
            .collect()
    }

    /// Confirm the current selection.
    ///
    /// Fails without closing the dialog when the number of files is outside
    /// the configured bounds.
    pub fn confirm(&self) -> Result<(), WidgetError> {
        if !self.is_open() {
            return Err(WidgetError::DialogClosed);
        }

        let files = self.shared.files.get_all();
        let count = files.len();
        let selection = if self.shared.multiple {
            let (min, max) = (
                self.shared.settings.multiple_min,
                self.shared.settings.multiple_max,
            );
            if count < min as usize || count > max as usize {
                return Err(WidgetError::SelectionBounds { count, min, max });
            }
            Selection::Multiple(files)
        } else {
            match files.into_iter().last() {
                Some(file) => Selection::Single(file),
                None => {
                    return Err(WidgetError::SelectionBounds {
                        count,
                        min: 1,
                        max: 1,
                    })
                }
            }
        };

        if !self.shared.deferred.resolve(selection) {
            return Err(WidgetError::DialogClosed);
        }
        tracing::info!(dialog_id = self.shared.id, files = count, "Dialog confirmed");
        Ok(())
    }

    /// Close the dialog without a selection
    pub fn cancel(&self) -> Result<(), WidgetError> {
        if !self.shared.deferred.reject(UploadError::Cancelled) {
            return Err(WidgetError::DialogClosed);
        }
        tracing::info!(dialog_id = self.shared.id, "Dialog cancelled");
        Ok(())
    }

    fn set_visibility(&self, tab: &str, visible: bool) -> Result<bool, WidgetError> {
        let listeners = {
            let state = self.shared.lock();
            let slot = state
                .slot(tab)
                .ok_or_else(|| WidgetError::UnknownTab(tab.to_string()))?;
            if !slot.button.set_visible(visible) {
                return Ok(false);
            }
            slot.listeners.clone()
        };

        tracing::debug!(dialog_id = self.shared.id, tab, visible, "Tab visibility changed");
        for listener in listeners {
            listener(tab, visible);
        }
        Ok(true)
    }
}

impl fmt::Debug for Dialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialog")
            .field("id", &self.shared.id)
            .field("multiple", &self.shared.multiple)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileDeferred;
    use uploadkit_core::DialogOptions;

    fn settings(options: DialogOptions) -> Arc<Settings> {
        Arc::new(Settings::from_options(&options).unwrap())
    }

    fn pending() -> FilePromise {
        FileDeferred::new().promise()
    }

    #[test]
    fn test_opens_on_first_tab_with_hidden_preview() {
        let dialog = Dialog::open(
            settings(DialogOptions::new().tabs(["file", "url"])),
            InitialSelection::None,
            None,
            TabRegistry::new(),
        )
        .unwrap();

        assert_eq!(dialog.current_tab(), "file");
        assert_eq!(dialog.tabs(), vec!["file", "url", "preview"]);
        assert!(!dialog.is_tab_visible(PREVIEW_TAB));
        assert!(!dialog.is_multiple());
    }

    #[test]
    fn test_unknown_start_tab() {
        let err = Dialog::open(
            settings(DialogOptions::new().tabs(["file"])),
            InitialSelection::None,
            Some("camera"),
            TabRegistry::new(),
        )
        .unwrap_err();
        assert_eq!(err, WidgetError::UnknownTab("camera".to_string()));
    }

    #[test]
    fn test_initial_list_makes_dialog_multiple() {
        let dialog = Dialog::open(
            settings(DialogOptions::new()),
            vec![pending(), pending()].into(),
            None,
            TabRegistry::new(),
        )
        .unwrap();
        assert!(dialog.is_multiple());
        assert_eq!(dialog.file_coll().len(), 2);

        dialog.confirm().unwrap();
        let selection = dialog.promise().outcome().unwrap().unwrap();
        assert!(selection.is_multiple());
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn test_single_mode_keeps_newest_and_previews() {
        let dialog = Dialog::open(
            settings(DialogOptions::new().preview_step(true)),
            InitialSelection::None,
            None,
            TabRegistry::new(),
        )
        .unwrap();

        let first = pending();
        let second = pending();
        dialog.add_files(vec![first.clone()]).unwrap();
        dialog.add_files(vec![second.clone()]).unwrap();

        let files = dialog.file_coll().get_all();
        assert_eq!(files.len(), 1);
        assert!(files[0].ptr_eq(&second));
        assert_eq!(dialog.current_tab(), PREVIEW_TAB);
        assert!(dialog.is_tab_visible(PREVIEW_TAB));
    }

    #[test]
    fn test_hiding_current_tab_moves_on() {
        let dialog = Dialog::open(
            settings(DialogOptions::new().tabs(["file", "url"])),
            InitialSelection::None,
            None,
            TabRegistry::new(),
        )
        .unwrap();

        dialog.hide_tab("file").unwrap();
        assert_eq!(dialog.current_tab(), "url");
        assert!(dialog.hide_tab("nope").is_err());
    }

    #[test]
    fn test_cancel_then_confirm() {
        let dialog = Dialog::open(
            settings(DialogOptions::new()),
            InitialSelection::None,
            None,
            TabRegistry::new(),
        )
        .unwrap();

        dialog.cancel().unwrap();
        assert_eq!(dialog.state(), PromiseState::Rejected);
        assert_eq!(dialog.confirm(), Err(WidgetError::DialogClosed));
        assert_eq!(dialog.cancel(), Err(WidgetError::DialogClosed));
        assert_eq!(
            dialog.add_files(vec![pending()]),
            Err(WidgetError::DialogClosed)
        );
    }
}
