use image::ImageFormat;
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::MediaConfig;

/// Directory recipe images are stored under, relative to the media root.
pub const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

/// Formats accepted for recipe images
pub const ALLOWED_FORMATS: [ImageFormat; 4] = [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Gif, ImageFormat::WebP];

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("The submitted file is empty.")]
    Empty,
    #[error("The submitted file has no extension.")]
    MissingExtension,
    #[error("File extension \"{0}\" is not allowed. Allowed extensions are: gif, jpeg, jpg, png, webp.")]
    ExtensionNotAllowed(String),
    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    NotAnImage,
    #[error("Failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

/// Extension after the final '.', accepted only if it names an allowed format
fn image_extension(filename: &str) -> Result<&str, ImageError> {
    let ext = match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext,
        _ => return Err(ImageError::MissingExtension),
    };

    // The extension ends up in a filesystem path
    let known = ext.chars().all(|c| c.is_ascii_alphanumeric())
        && ImageFormat::from_extension(ext).is_some_and(|format| ALLOWED_FORMATS.contains(&format));
    if known {
        Ok(ext)
    } else {
        Err(ImageError::ExtensionNotAllowed(ext.to_string()))
    }
}

/// Storage path for a new recipe image: `uploads/recipe/{uuid}.{ext}`, where
/// `ext` is whatever follows the final '.' of the original filename.
pub fn generate_recipe_image_path(filename: &str) -> Result<String, ImageError> {
    let ext = image_extension(filename)?;
    Ok(format!("{}/{}.{}", RECIPE_IMAGE_DIR, Uuid::new_v4(), ext))
}

/// Decode the whole upload; a valid signature alone is not enough.
pub fn decode_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    let format = image::guess_format(bytes).map_err(|_| ImageError::NotAnImage)?;
    if !ALLOWED_FORMATS.contains(&format) {
        return Err(ImageError::NotAnImage);
    }
    image::load_from_memory_with_format(bytes, format).map_err(|err| {
        tracing::debug!("Rejected {:?} upload: {}", format, err);
        ImageError::NotAnImage
    })?;
    Ok(format)
}

/// Validate an uploaded image and write it below the media root.
///
/// Returns the stored path relative to the media root.
pub async fn save_recipe_image(media: &MediaConfig, filename: &str, bytes: &[u8]) -> Result<String, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    let relative = generate_recipe_image_path(filename)?;

    let owned = bytes.to_vec();
    tokio::task::spawn_blocking(move || decode_format(&owned))
        .await
        .map_err(std::io::Error::other)??;

    let target: PathBuf = media.root.join(&relative);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&target, bytes).await?;

    tracing::info!("Stored recipe image at {}", target.display());
    Ok(relative)
}

/// Public URL of a stored media path
pub fn media_url(media: &MediaConfig, path: &str) -> String {
    format!("{}{}", media.url, path)
}
