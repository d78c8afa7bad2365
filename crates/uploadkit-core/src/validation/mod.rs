//! Validation modules

pub mod file;

pub use file::{
    allowed_mime_types, images_only, max_file_size, run_validators, ValidationError, Validator,
};
