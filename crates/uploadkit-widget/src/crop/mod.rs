//! Crop widget
//!
//! Lets the host pick a crop area over an uploaded image and turns it into
//! CDN modifiers (`-/crop/{w}x{h}/{x},{y}/`, optionally followed by
//! `-/resize/{w}x{h}/`). The same modifiers restore the selection.

mod geometry;
mod widget;

pub use geometry::{
    constrain, default_selection, parse_selection, selection_modifiers, selection_ops, CropRect,
};
pub use widget::{CropWidget, ImageElement};
