use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use uploadkit_core::{CdnUrl, CoreError, CropSettings, FileInfo, UploadError};

use super::geometry::{constrain, default_selection, parse_selection, selection_modifiers, CropRect};
use crate::error::WidgetError;
use crate::file::FilePromise;

/// A displayed image the crop widget attaches its listeners to
#[derive(Clone)]
pub struct ImageElement {
    id: Arc<str>,
    listeners: Arc<AtomicUsize>,
}

impl ImageElement {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self {
            id: Arc::from(id.as_ref()),
            listeners: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of widgets currently attached
    pub fn listener_count(&self) -> usize {
        self.listeners.load(Ordering::SeqCst)
    }

    fn attach(&self) {
        self.listeners.fetch_add(1, Ordering::SeqCst);
    }

    fn detach(&self) {
        let _ = self
            .listeners
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }
}

impl fmt::Debug for ImageElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageElement")
            .field("id", &self.id)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

struct CropState {
    selection: CropRect,
    destroyed: bool,
}

/// Interactive crop area over one image
///
/// Must be torn down with [`CropWidget::destroy`]; after that every
/// operation fails with [`WidgetError::CropDestroyed`].
pub struct CropWidget {
    element: ImageElement,
    image: (u32, u32),
    settings: CropSettings,
    state: Mutex<CropState>,
}

impl CropWidget {
    pub fn new(
        element: ImageElement,
        dimensions: (u32, u32),
        settings: CropSettings,
    ) -> Result<Self, WidgetError> {
        if dimensions.0 == 0 || dimensions.1 == 0 {
            return Err(CoreError::InvalidSettings(format!(
                "image dimensions must be positive, got {}x{}",
                dimensions.0, dimensions.1
            ))
            .into());
        }

        let selection = default_selection(dimensions, &settings);
        element.attach();
        tracing::debug!(
            element = element.id(),
            width = dimensions.0,
            height = dimensions.1,
            "Crop widget attached"
        );

        Ok(Self {
            element,
            image: dimensions,
            settings,
            state: Mutex::new(CropState {
                selection,
                destroyed: false,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, CropState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn live(&self) -> Result<MutexGuard<'_, CropState>, WidgetError> {
        let state = self.lock();
        if state.destroyed {
            return Err(WidgetError::CropDestroyed);
        }
        Ok(state)
    }

    pub fn element(&self) -> &ImageElement {
        &self.element
    }

    pub fn image_size(&self) -> (u32, u32) {
        self.image
    }

    pub fn settings(&self) -> &CropSettings {
        &self.settings
    }

    pub fn is_destroyed(&self) -> bool {
        self.lock().destroyed
    }

    pub fn selection(&self) -> Result<CropRect, WidgetError> {
        Ok(self.live()?.selection)
    }

    /// Move the crop area. Returns the area actually applied after fitting
    /// it into the image and the crop constraints.
    pub fn set_selection(&self, rect: CropRect) -> Result<CropRect, WidgetError> {
        let mut state = self.live()?;
        state.selection = constrain(rect, self.image, &self.settings);
        Ok(state.selection)
    }

    /// Modifier string for the current selection
    pub fn modifiers(&self) -> Result<Option<String>, WidgetError> {
        let selection = self.selection()?;
        Ok(selection_modifiers(selection, self.image, &self.settings))
    }

    /// Derive a handle whose file carries the current selection as CDN
    /// modifiers. Files that are not images pass through unchanged.
    pub fn apply_selection_to_file(&self, file: &FilePromise) -> Result<FilePromise, WidgetError> {
        let modifiers = self.modifiers()?;
        Ok(file.then(move |info: FileInfo| -> Result<FileInfo, UploadError> {
            if !info.is_image {
                return Ok(info);
            }
            let original = CdnUrl::parse(&info.original_url)?;
            Ok(info.with_modifiers(original.base(), modifiers.as_deref()))
        }))
    }

    /// Restore the selection from a modifier string; `None` resets to the
    /// default selection.
    pub fn set_selection_from_modifiers(
        &self,
        modifiers: Option<&str>,
    ) -> Result<CropRect, WidgetError> {
        let mut state = self.live()?;
        let rect = match modifiers {
            None => default_selection(self.image, &self.settings),
            Some(modifiers) => match parse_selection(modifiers, self.image)? {
                Some(rect) => constrain(rect, self.image, &self.settings),
                None => constrain(CropRect::full(self.image), self.image, &self.settings),
            },
        };
        state.selection = rect;
        Ok(rect)
    }

    /// Detach from the image element
    pub fn destroy(&self) -> Result<(), WidgetError> {
        let mut state = self.live()?;
        state.destroyed = true;
        self.element.detach();
        tracing::debug!(element = self.element.id(), "Crop widget destroyed");
        Ok(())
    }
}

impl Drop for CropWidget {
    fn drop(&mut self) {
        let state = self.lock();
        if !state.destroyed {
            self.element.detach();
            tracing::warn!(
                element = self.element.id(),
                "Crop widget dropped without destroy"
            );
        }
    }
}

impl fmt::Debug for CropWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("CropWidget")
            .field("element", &self.element)
            .field("image", &self.image)
            .field("selection", &state.selection)
            .field("destroyed", &state.destroyed)
            .finish()
    }
}
