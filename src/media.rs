//! Profile picture storage.
//!
//! Uploads are decoded, shrunk so neither dimension exceeds
//! [`MAX_DIMENSION`] (aspect ratio preserved) and written to the public
//! picture directory under a random filename.

use image::{GenericImageView, ImageFormat};
use rand::Rng;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, instrument, warn};

use crate::shared::AppError;

/// Resized pictures fit inside this bounding square
pub const MAX_DIMENSION: u32 = 125;

pub struct PictureStore {
    root: PathBuf,
}

impl PictureStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resizes and stores an uploaded picture; returns the generated
    /// filename for the user row.
    ///
    /// Unreadable image data fails with `InvalidImage` before anything is
    /// written, so a bad upload leaves no file behind.
    #[instrument(skip(self, data, original_name))]
    pub async fn save_profile_picture(
        &self,
        data: &[u8],
        original_name: &str,
    ) -> Result<String, AppError> {
        let image = image::load_from_memory(data).map_err(|e| {
            warn!(error = %e, "Uploaded picture could not be decoded");
            AppError::InvalidImage(e.to_string())
        })?;

        let (extension, format) = output_format(original_name);
        let filename = format!("{}.{extension}", random_stem());

        let mut resized = image.thumbnail(MAX_DIMENSION, MAX_DIMENSION);
        if format == ImageFormat::Jpeg {
            // JPEG has no alpha channel.
            resized = image::DynamicImage::ImageRgb8(resized.to_rgb8());
        }

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Internal(format!("picture dir unavailable: {e}")))?;

        let path = self.root.join(&filename);
        resized
            .save_with_format(&path, format)
            .map_err(|e| AppError::Internal(format!("failed to store picture: {e}")))?;

        debug!(
            filename = %filename,
            width = resized.width(),
            height = resized.height(),
            "Stored resized profile picture"
        );
        Ok(filename)
    }
}

/// Random 16-hex-character filename stem from the OS entropy source.
fn random_stem() -> String {
    let mut bytes = [0u8; 8];
    rand::rng().fill(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Keeps the upload's extension when it names a format the encoder supports,
/// falling back to JPEG otherwise.
fn output_format(original_name: &str) -> (String, ImageFormat) {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension {
        Some(ext) => match ImageFormat::from_extension(&ext) {
            Some(format) if format.can_write() => (ext, format),
            _ => ("jpg".to_string(), ImageFormat::Jpeg),
        },
        None => ("jpg".to_string(), ImageFormat::Jpeg),
    }
}
