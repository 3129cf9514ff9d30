//! Photo preparation before upload
//!
//! Every photo is normalized in place:
//! - the file name is lowercased
//! - the EXIF orientation is applied to the pixels
//! - the image is stretched to the panel resolution and re-encoded

use crate::core::error::{Result, UploadError};
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Panel width of the Frame TV
pub const TARGET_WIDTH: u32 = 3840;

/// Panel height of the Frame TV
pub const TARGET_HEIGHT: u32 = 2160;

/// Rename `path` in place so its file name is all lowercase
///
/// Returns the (possibly unchanged) path of the file.
pub fn normalize_file_name(path: &Path) -> Result<PathBuf> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(path.to_path_buf());
    };

    let lower = name.to_lowercase();
    if lower == name {
        return Ok(path.to_path_buf());
    }

    let renamed = path.with_file_name(lower);
    fs::rename(path, &renamed)?;
    debug!("Renamed {} -> {}", path.display(), renamed.display());
    Ok(renamed)
}

/// Decode, orient, resize to [`TARGET_WIDTH`]x[`TARGET_HEIGHT`] and overwrite
///
/// The aspect ratio is not preserved: the panel is a fixed 16:9 canvas.
pub fn resize_for_panel(path: &Path) -> Result<()> {
    let image = load_oriented(path)?;

    let resized = if image.width() == TARGET_WIDTH && image.height() == TARGET_HEIGHT {
        image
    } else {
        image.resize_exact(TARGET_WIDTH, TARGET_HEIGHT, FilterType::CatmullRom)
    };

    save_in_place(path, resized)
}

/// Decode an image and apply its EXIF orientation
fn load_oriented(path: &Path) -> Result<DynamicImage> {
    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()
        .map_err(|e| UploadError::image(path, e))?;

    let orientation = decoder
        .orientation()
        .map_err(|e| UploadError::image(path, e))?;

    let mut image = DynamicImage::from_decoder(decoder).map_err(|e| UploadError::image(path, e))?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Re-encode using the format implied by the extension
fn save_in_place(path: &Path, image: DynamicImage) -> Result<()> {
    let format = ImageFormat::from_path(path).map_err(|e| UploadError::image(path, e))?;

    // JPEG has no alpha channel
    let image = match format {
        ImageFormat::Jpeg if image.color().has_alpha() => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image,
    };

    image
        .save_with_format(path, format)
        .map_err(|e| UploadError::image(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdb::generator::with_exif_orientation;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_normalize_file_name_lowercases() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("Photo.JPG");
        fs::write(&original, b"data").unwrap();

        let renamed = normalize_file_name(&original).unwrap();

        assert_eq!(renamed, dir.path().join("photo.jpg"));
        assert!(renamed.exists());
        assert_eq!(fs::read(&renamed).unwrap(), b"data");
    }

    #[test]
    fn test_normalize_file_name_already_lowercase() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("photo.png");
        fs::write(&original, b"data").unwrap();

        assert_eq!(normalize_file_name(&original).unwrap(), original);
    }

    #[test]
    fn test_resize_stretches_to_panel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("square.png");
        RgbImage::from_pixel(64, 64, Rgb([10, 20, 30])).save(&path).unwrap();

        resize_for_panel(&path).unwrap();

        assert_eq!(
            image::image_dimensions(&path).unwrap(),
            (TARGET_WIDTH, TARGET_HEIGHT)
        );
    }

    #[test]
    fn test_resize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.jpg");
        RgbImage::from_pixel(TARGET_WIDTH, TARGET_HEIGHT, Rgb([200, 100, 50]))
            .save(&path)
            .unwrap();

        resize_for_panel(&path).unwrap();
        resize_for_panel(&path).unwrap();

        assert_eq!(
            image::image_dimensions(&path).unwrap(),
            (TARGET_WIDTH, TARGET_HEIGHT)
        );
    }

    #[test]
    fn test_resize_applies_exif_orientation() {
        // 64x32 landscape, red top-left quadrant on blue
        let source = RgbImage::from_fn(64, 32, |x, y| {
            if x < 32 && y < 16 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        let mut jpeg = Vec::new();
        source
            .write_to(&mut std::io::Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rotated.jpg");
        fs::write(&path, with_exif_orientation(&jpeg, 6)).unwrap();

        resize_for_panel(&path).unwrap();

        // Orientation 6 turns the picture clockwise: red ends up top-right
        let panel = image::open(&path).unwrap().to_rgb8();
        assert_eq!(panel.dimensions(), (TARGET_WIDTH, TARGET_HEIGHT));
        let top_right = panel.get_pixel(TARGET_WIDTH * 3 / 4, TARGET_HEIGHT / 4);
        let top_left = panel.get_pixel(TARGET_WIDTH / 4, TARGET_HEIGHT / 4);
        assert!(top_right[0] > 200 && top_right[2] < 60, "{:?}", top_right);
        assert!(top_left[2] > 200 && top_left[0] < 60, "{:?}", top_left);
    }

    #[test]
    fn test_resize_drops_alpha_for_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("alpha.png");
        RgbaImage::from_pixel(32, 18, Rgba([1, 2, 3, 128])).save(&png).unwrap();

        // PNG bytes behind a .jpg name, as some cameras and exporters produce
        let path = dir.path().join("alpha.jpg");
        fs::rename(&png, &path).unwrap();

        resize_for_panel(&path).unwrap();

        let reopened = image::open(&path).unwrap();
        assert!(!reopened.color().has_alpha());
        assert_eq!(reopened.width(), TARGET_WIDTH);
    }

    #[test]
    fn test_resize_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"definitely not an image").unwrap();

        let err = resize_for_panel(&path).unwrap_err();
        assert!(matches!(err, UploadError::ImageError { .. }));
    }
}
