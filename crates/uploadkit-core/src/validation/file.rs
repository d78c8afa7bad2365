use std::sync::Arc;

use crate::models::FileInfo;

/// Reasons a validator can reject a candidate file
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Only images are allowed")]
    ImagesOnly,

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid content type: {mime_type} (allowed: {allowed:?})")]
    MimeTypeNotAllowed {
        mime_type: String,
        allowed: Vec<String>,
    },

    #[error("{0}")]
    Custom(String),
}

/// A per-file validator. Returning an error rejects the file handle.
pub type Validator = Arc<dyn Fn(&FileInfo) -> Result<(), ValidationError> + Send + Sync>;

/// Rejects every file that was not decoded as an image
pub fn images_only() -> Validator {
    Arc::new(|info: &FileInfo| {
        if info.is_image {
            Ok(())
        } else {
            Err(ValidationError::ImagesOnly)
        }
    })
}

/// Rejects files larger than `max` bytes
pub fn max_file_size(max: u64) -> Validator {
    Arc::new(move |info: &FileInfo| {
        if info.size > max {
            return Err(ValidationError::FileTooLarge {
                size: info.size,
                max,
            });
        }
        Ok(())
    })
}

/// Accepts only the listed MIME types. Entries ending in `/*` match a whole family.
pub fn allowed_mime_types<I, S>(allowed: I) -> Validator
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let allowed: Vec<String> = allowed
        .into_iter()
        .map(|s| s.into().trim().to_lowercase())
        .collect();

    Arc::new(move |info: &FileInfo| {
        let mime_type = info.mime_type.to_lowercase();
        let matches = allowed.iter().any(|pattern| match pattern.strip_suffix("/*") {
            Some(family) => mime_type
                .split_once('/')
                .is_some_and(|(prefix, _)| prefix == family),
            None => *pattern == mime_type,
        });

        if matches {
            Ok(())
        } else {
            Err(ValidationError::MimeTypeNotAllowed {
                mime_type: info.mime_type.clone(),
                allowed: allowed.clone(),
            })
        }
    })
}

/// Run validators in order, stopping at the first rejection
pub fn run_validators(info: &FileInfo, validators: &[Validator]) -> Result<(), ValidationError> {
    for validator in validators {
        if let Err(err) = validator(info) {
            tracing::warn!(file_uuid = %info.uuid, error = %err, "File rejected by validator");
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageInfo;
    use uuid::Uuid;

    fn document(size: u64) -> FileInfo {
        FileInfo::new(
            Uuid::new_v4(),
            "report.pdf",
            size,
            "application/pdf",
            None,
            "https://ucarecdn.com",
        )
        .unwrap()
    }

    fn photo() -> FileInfo {
        FileInfo::new(
            Uuid::new_v4(),
            "photo.jpg",
            2048,
            "image/jpeg",
            Some(ImageInfo::new(800, 600, "JPEG", None)),
            "https://ucarecdn.com",
        )
        .unwrap()
    }

    #[test]
    fn test_images_only() {
        let validator = images_only();
        assert!(validator(&photo()).is_ok());
        assert_eq!(validator(&document(10)), Err(ValidationError::ImagesOnly));
    }

    #[test]
    fn test_max_file_size() {
        let validator = max_file_size(100);
        assert!(validator(&document(100)).is_ok());
        assert_eq!(
            validator(&document(101)),
            Err(ValidationError::FileTooLarge { size: 101, max: 100 })
        );
    }

    #[test]
    fn test_allowed_mime_types_with_family() {
        let validator = allowed_mime_types(["image/*", "application/zip"]);
        assert!(validator(&photo()).is_ok());
        assert!(matches!(
            validator(&document(1)),
            Err(ValidationError::MimeTypeNotAllowed { .. })
        ));
    }

    #[test]
    fn test_run_validators_stops_at_first_rejection() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = calls.clone();
        let counting: Validator = Arc::new(move |_info: &FileInfo| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        });

        let result = run_validators(&document(10), &[images_only(), counting]);
        assert_eq!(result, Err(ValidationError::ImagesOnly));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
