//! Extension surface handed to plugins

use uploadkit_core::{CropSettings, Settings};

use crate::crop::{CropWidget, ImageElement};
use crate::css::TabsCss;
use crate::dialog::{Dialog, PREVIEW_TAB};
use crate::error::WidgetError;
use crate::file::FilePromise;
use crate::host::Uploadcare;
use crate::source::InputRegistry;

/// What a plugin can reach
pub struct PluginApi {
    host: Uploadcare,
}

impl PluginApi {
    pub(crate) fn new(host: Uploadcare) -> Self {
        Self { host }
    }

    pub fn settings(&self) -> &Settings {
        self.host.settings()
    }

    /// Attach a crop widget to `element`
    pub fn crop_widget(
        &self,
        element: ImageElement,
        dimensions: (u32, u32),
        settings: CropSettings,
    ) -> Result<CropWidget, WidgetError> {
        CropWidget::new(element, dimensions, settings)
    }

    /// Open a single-file dialog on the preview tab
    pub fn open_preview_dialog(
        &self,
        file: Option<FilePromise>,
        settings: Option<Settings>,
    ) -> Result<Dialog, WidgetError> {
        let mut settings = settings.unwrap_or_else(|| self.host.settings().clone());
        settings.multiple = false;
        self.host.open_dialog_on(file.into(), settings, PREVIEW_TAB)
    }

    pub fn tabs_css(&self) -> &TabsCss {
        self.host.tabs_css()
    }

    pub fn inputs(&self) -> &InputRegistry {
        self.host.inputs()
    }
}
