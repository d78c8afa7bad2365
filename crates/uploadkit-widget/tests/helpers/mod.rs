//! Test helpers: build a widget over an in-memory backend.
//!
//! Run from workspace root: `cargo test -p uploadkit-widget`.

pub mod backend;
pub mod fixtures;

use std::sync::{Arc, Mutex};

use uploadkit_widget::{
    DialogOptions, FilePromise, FileSource, InMemoryBackend, NativeFile, Settings, UploadInfo,
    Uploadcare,
};

/// Widget plus the backend it talks to
pub struct TestWidget {
    pub widget: Uploadcare,
    pub backend: InMemoryBackend,
}

/// Must be called from within a Tokio runtime
pub fn setup_widget() -> TestWidget {
    setup_widget_with(Settings::default())
}

pub fn setup_widget_with(settings: Settings) -> TestWidget {
    let backend = InMemoryBackend::new().with_chunk_size(16);
    let widget = Uploadcare::new(settings, Arc::new(backend.clone())).expect("widget");
    TestWidget { widget, backend }
}

impl TestWidget {
    /// Start uploading the 1x1 PNG fixture
    pub fn upload_png(&self, options: &DialogOptions) -> FilePromise {
        self.widget.file_from(
            FileSource::Object(NativeFile::new("pixel.png", fixtures::create_minimal_png())),
            options,
        )
    }

    /// Start uploading a small text file
    pub fn upload_text(&self, options: &DialogOptions) -> FilePromise {
        self.widget.file_from(
            FileSource::Object(
                NativeFile::new("notes.txt", fixtures::create_text_file())
                    .with_mime_type("text/plain"),
            ),
            options,
        )
    }
}

/// Record every progress notification of `file`
pub fn record_progress(file: &FilePromise) -> Arc<Mutex<Vec<UploadInfo>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    file.progress(move |info: &UploadInfo| sink.lock().unwrap().push(*info));
    seen
}
