// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image I/O — decoding uploaded photos and encoding crops and overlays.
// Operates on in-memory images using the `image` crate.

use ausweis_core::error::AusweisError;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, info, instrument, warn};

/// A decoded photo, guaranteed to have at least one pixel.
///
/// ```ignore
/// let photo = ImageProcessor::open("id.jpg")?;
/// let detection = CardDetector::default().detect(photo.as_dynamic())?;
/// ```
pub struct ImageProcessor {
    /// The decoded image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, AusweisError> {
        let img = image::open(path.as_ref()).map_err(|err| match err {
            image::ImageError::IoError(io) => AusweisError::Io(io),
            other => AusweisError::InvalidImage(format!(
                "failed to decode {}: {}",
                path.as_ref().display(),
                other
            )),
        })?;
        info!(
            width = img.width(),
            height = img.height(),
            "Image loaded"
        );
        Self::from_dynamic(img)
    }

    /// Decode raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, AusweisError> {
        if data.is_empty() {
            warn!("Empty upload");
            return Err(AusweisError::InvalidImage("no image data".into()));
        }
        let img = image::load_from_memory(data).map_err(|err| {
            AusweisError::InvalidImage(format!("invalid image format: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Self::from_dynamic(img)
    }

    /// Wrap an already-decoded `DynamicImage`, rejecting empty rasters.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self, AusweisError> {
        ensure_raster(&image)?;
        Ok(Self { image })
    }

    // -- Accessors ------------------------------------------------------------

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, AusweisError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Write the image to a file. The format is inferred from the file extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), AusweisError> {
        save_image(&self.image, path)
    }
}

/// Reject rasters with no pixels; everything downstream assumes a positive size.
pub fn ensure_raster(image: &DynamicImage) -> Result<(), AusweisError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(AusweisError::InvalidImage(format!(
            "image has no pixels ({}x{})",
            image.width(),
            image.height()
        )));
    }
    Ok(())
}

/// Write `image` to `path`, inferring the format from the extension.
pub fn save_image(
    image: &DynamicImage,
    path: impl AsRef<std::path::Path>,
) -> Result<(), AusweisError> {
    image.save(path.as_ref()).map_err(|err| {
        AusweisError::ImageError(format!(
            "failed to save image to {}: {}",
            path.as_ref().display(),
            err
        ))
    })
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(
    image: &DynamicImage,
    format: ImageFormat,
) -> Result<Vec<u8>, AusweisError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, format).map_err(|err| {
        AusweisError::ImageError(format!("image encoding failed: {}", err))
    })?;
    Ok(buffer)
}
