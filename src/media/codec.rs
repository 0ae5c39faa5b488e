//! Image decode, orientation, resize, and re-encode.
//!
//! Everything here is CPU-bound and synchronous; async callers run it on the
//! blocking pool. Files are always written with no orientation metadata, so
//! decoding a file this module produced never rotates it again.

use std::io::{BufWriter, Cursor};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use picfolio_common::{Error, Result};

use crate::storage::thumbnail_path_for;

/// A decoded image in display orientation.
#[derive(Debug)]
pub struct Decoded {
    pub image: DynamicImage,
    /// Container format detected from the bytes.
    pub format: ImageFormat,
}

/// Decode bytes and bake any EXIF orientation into the pixels.
///
/// Fails with [`Error::Decode`] when the bytes are not a supported image.
pub fn decode_normalized(bytes: &[u8]) -> Result<Decoded> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::decode(format!("Failed to read image data: {}", e)))?;

    let format = reader
        .format()
        .ok_or_else(|| Error::decode("Unrecognized image format"))?;

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| Error::decode(format!("Unsupported image: {}", e)))?;

    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let mut image = DynamicImage::from_decoder(decoder)
        .map_err(|e| Error::decode(format!("Failed to decode image: {}", e)))?;
    image.apply_orientation(orientation);

    Ok(Decoded { image, format })
}

/// Read and decode a file written by this library.
pub fn open(path: &Path) -> Result<DynamicImage> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::storage(format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(decode_normalized(&bytes)?.image)
}

/// Rotate 90 degrees counter-clockwise.
pub fn rotate_ccw(image: &DynamicImage) -> DynamicImage {
    image.rotate270()
}

/// Shrink to fit inside a `max_dimension` square, keeping the aspect ratio.
///
/// Images already inside the box are returned unchanged rather than upscaled.
pub fn make_thumbnail(image: &DynamicImage, max_dimension: u32) -> DynamicImage {
    if image.width() <= max_dimension && image.height() <= max_dimension {
        return image.clone();
    }
    image.resize(max_dimension, max_dimension, FilterType::Lanczos3)
}

/// Encode `image` to `path`, choosing the format from the path's extension
/// and falling back to `fallback` when the extension names no known format.
///
/// The file is written beside the target and renamed into place, so a failed
/// encode never leaves a truncated file at `path`.
pub fn save(image: &DynamicImage, path: &Path, quality: u8, fallback: ImageFormat) -> Result<()> {
    let format = ImageFormat::from_path(path).unwrap_or(fallback);
    let partial = partial_path(path);

    let result = encode_to(image, &partial, format, quality);
    if let Err(e) = result {
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }

    std::fs::rename(&partial, path).map_err(|e| {
        let _ = std::fs::remove_file(&partial);
        Error::storage(format!("Failed to move {} into place: {}", path.display(), e))
    })
}

fn encode_to(image: &DynamicImage, path: &Path, format: ImageFormat, quality: u8) -> Result<()> {
    let file = std::fs::File::create(path)
        .map_err(|e| Error::storage(format!("Failed to create {}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);

    let encoded = match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, quality))
        }
        other => image.write_to(&mut writer, other),
    };

    encoded.map_err(|e| Error::storage(format!("Failed to encode {}: {}", path.display(), e)))?;

    writer
        .into_inner()
        .map_err(|e| Error::storage(format!("Failed to flush {}: {}", path.display(), e)))?
        .sync_all()
        .map_err(|e| Error::storage(format!("Failed to sync {}: {}", path.display(), e)))
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Write the thumbnail of `image` beside `original_path`.
pub fn write_thumbnail(
    image: &DynamicImage,
    original_path: &Path,
    max_dimension: u32,
    quality: u8,
) -> Result<PathBuf> {
    let thumb_path = thumbnail_path_for(original_path);
    let thumbnail = make_thumbnail(image, max_dimension);
    save(&thumbnail, &thumb_path, quality, ImageFormat::Jpeg)?;
    Ok(thumb_path)
}

/// Rotate an original file in place and return the rotated pixels.
pub fn rotate_file_ccw(path: &Path, quality: u8) -> Result<DynamicImage> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::storage(format!("Failed to read {}: {}", path.display(), e)))?;
    let decoded = decode_normalized(&bytes)?;
    let rotated = rotate_ccw(&decoded.image);
    save(&rotated, path, quality, decoded.format)?;
    Ok(rotated)
}
