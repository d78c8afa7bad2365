//! Widget entry point
//!
//! `Uploadcare` owns the base settings, the upload backend and the shared
//! registries. File resolution runs on the Tokio runtime that was current
//! when it was created.

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use uploadkit_core::{DialogOptions, Settings, WidgetConfig};
use uploadkit_transport::UploadBackend;

use crate::css::TabsCss;
use crate::dialog::{Dialog, InitialSelection};
use crate::error::WidgetError;
use crate::file::{FileDeferred, FilePromise};
use crate::plugin::PluginApi;
use crate::registry::{TabContext, TabRegistry};
use crate::source::{self, FileSource, InputRegistry};

#[derive(Clone)]
pub struct Uploadcare {
    settings: Arc<Settings>,
    backend: Arc<dyn UploadBackend>,
    runtime: Handle,
    inputs: InputRegistry,
    tabs: TabRegistry,
    css: TabsCss,
}

impl Uploadcare {
    /// Create a widget bound to the current Tokio runtime
    pub fn new(settings: Settings, backend: Arc<dyn UploadBackend>) -> Result<Self, WidgetError> {
        let runtime = Handle::try_current().map_err(|_| WidgetError::NoRuntime)?;
        Self::with_runtime(settings, backend, runtime)
    }

    pub fn with_runtime(
        settings: Settings,
        backend: Arc<dyn UploadBackend>,
        runtime: Handle,
    ) -> Result<Self, WidgetError> {
        settings.validate()?;
        tracing::info!(
            cdn_base = %settings.cdn_base,
            tabs = settings.tabs.len(),
            "Widget initialized"
        );
        Ok(Self {
            settings: Arc::new(settings),
            backend,
            runtime,
            inputs: InputRegistry::new(),
            tabs: TabRegistry::new(),
            css: TabsCss::new(),
        })
    }

    /// Create a widget from environment configuration
    pub fn from_config(
        config: WidgetConfig,
        backend: Arc<dyn UploadBackend>,
    ) -> Result<Self, anyhow::Error> {
        config.validate()?;
        Ok(Self::new(config.into_settings(), backend)?)
    }

    /// Base settings every dialog and file starts from
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Base settings with `options` applied
    pub fn settings_for(&self, options: &DialogOptions) -> Result<Settings, WidgetError> {
        Ok(self.settings.resolve(options)?)
    }

    /// Start resolving `source` into a file handle.
    ///
    /// Returns immediately. Options that fail to resolve reject the handle.
    pub fn file_from(&self, source: FileSource, options: &DialogOptions) -> FilePromise {
        let deferred = FileDeferred::new();
        let promise = deferred.promise();

        match self.settings.resolve(options) {
            Ok(settings) => {
                tracing::debug!(kind = source.kind(), file_handle = promise.id(), "Resolving file");
                self.runtime.spawn(source::resolve(
                    source,
                    self.backend.clone(),
                    Arc::new(settings),
                    self.inputs.clone(),
                    deferred,
                ));
            }
            Err(err) => {
                tracing::warn!(error = %err, "File options rejected");
                deferred.reject(err.into());
            }
        }
        promise
    }

    /// Open a dialog on the tab named in `options`, or the first enabled tab
    pub fn open_dialog(
        &self,
        initial: impl Into<InitialSelection>,
        options: DialogOptions,
    ) -> Result<Dialog, WidgetError> {
        let settings = self.settings_for(&options)?;
        Dialog::open(
            Arc::new(settings),
            initial.into(),
            options.tab.as_deref(),
            self.tabs.clone(),
        )
    }

    pub(crate) fn open_dialog_on(
        &self,
        initial: InitialSelection,
        settings: Settings,
        tab: &str,
    ) -> Result<Dialog, WidgetError> {
        settings.validate()?;
        Dialog::open(Arc::new(settings), initial, Some(tab), self.tabs.clone())
    }

    /// Run a plugin against this widget
    pub fn plugin<F>(&self, plugin: F)
    where
        F: FnOnce(&PluginApi),
    {
        let api = PluginApi::new(self.clone());
        plugin(&api);
    }

    /// Register a custom tab renderer. Returns `true` if it replaced one.
    pub fn register_tab<F>(&self, name: impl Into<String>, renderer: F) -> bool
    where
        F: Fn(TabContext) + Send + Sync + 'static,
    {
        self.tabs.register(name, Arc::new(renderer))
    }

    pub fn tab_registry(&self) -> &TabRegistry {
        &self.tabs
    }

    pub fn tabs_css(&self) -> &TabsCss {
        &self.css
    }

    pub fn inputs(&self) -> &InputRegistry {
        &self.inputs
    }
}

impl fmt::Debug for Uploadcare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Uploadcare")
            .field("settings", &self.settings)
            .field("tabs", &self.tabs)
            .finish()
    }
}
