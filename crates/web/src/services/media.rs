//! Uploaded photo processing.
//!
//! Photos are validated by MIME type, resized to a maximum width, and
//! written under the uploads directory with a generated filename.

use std::path::PathBuf;

use image::ImageFormat;
use thiserror::Error;
use uuid::Uuid;

/// Maximum stored photo width in pixels. Larger uploads are scaled down
/// preserving aspect ratio; smaller ones are kept as-is.
const MAX_WIDTH: u32 = 800;

/// Errors from photo processing.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The upload is not an image type we can store.
    #[error("that file type isn't allowed")]
    UnsupportedFileType(String),

    /// The bytes could not be decoded as the claimed image type.
    #[error("could not read image: {0}")]
    Decode(#[from] image::ImageError),

    /// Filesystem failure while writing the photo.
    #[error("could not save photo: {0}")]
    Io(#[from] std::io::Error),

    /// The background processing task was cancelled.
    #[error("photo processing was interrupted")]
    TaskCancelled,
}

/// Resizes and stores uploaded photos.
#[derive(Clone)]
pub struct MediaProcessor {
    uploads_dir: PathBuf,
}

impl MediaProcessor {
    /// Create a processor writing into `uploads_dir`.
    #[must_use]
    pub const fn new(uploads_dir: PathBuf) -> Self {
        Self { uploads_dir }
    }

    /// Validate, resize, and store an uploaded photo. Returns the stored
    /// filename (not a full path).
    ///
    /// Decode and resize run on a blocking thread so large uploads don't
    /// stall the async runtime.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::UnsupportedFileType` for non-image uploads,
    /// `MediaError::Decode` for corrupt image data, `MediaError::Io` if
    /// the file cannot be written.
    pub async fn process_upload(
        &self,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, MediaError> {
        if !content_type.starts_with("image/") {
            return Err(MediaError::UnsupportedFileType(content_type.to_owned()));
        }

        let format = ImageFormat::from_mime_type(content_type)
            .ok_or_else(|| MediaError::UnsupportedFileType(content_type.to_owned()))?;

        let extension = format
            .extensions_str()
            .first()
            .ok_or_else(|| MediaError::UnsupportedFileType(content_type.to_owned()))?;

        let filename = format!("{}.{extension}", Uuid::new_v4());
        let path = self.uploads_dir.join(&filename);

        tokio::task::spawn_blocking(move || -> Result<(), MediaError> {
            let img = image::load_from_memory_with_format(&bytes, format)?;

            let img = if img.width() > MAX_WIDTH {
                img.resize(MAX_WIDTH, u32::MAX, image::imageops::FilterType::Lanczos3)
            } else {
                img
            };

            img.save_with_format(&path, format)?;
            Ok(())
        })
        .await
        .map_err(|_| MediaError::TaskCancelled)??;

        tracing::debug!(filename = %filename, "photo stored");

        Ok(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_image_mime() {
        let processor = MediaProcessor::new(PathBuf::from("/tmp"));
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");

        let result = rt.block_on(processor.process_upload("application/pdf", vec![1, 2, 3]));
        assert!(matches!(result, Err(MediaError::UnsupportedFileType(_))));
    }

    #[test]
    fn test_rejects_unknown_image_subtype() {
        let processor = MediaProcessor::new(PathBuf::from("/tmp"));
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");

        let result = rt.block_on(processor.process_upload("image/x-unknown", vec![1, 2, 3]));
        assert!(matches!(result, Err(MediaError::UnsupportedFileType(_))));
    }
}
