//! Test photo generation
//!
//! Writes small, valid images into a folder so the upload pipeline can be
//! exercised end to end.

use image::{Rgb, RgbImage};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Side length of generated test photos
pub const TEST_PHOTO_SIZE: u32 = 16;

/// Write a small solid-color photo; the format follows the extension
pub fn write_test_photo(folder: &Path, name: &str) -> io::Result<PathBuf> {
    let path = folder.join(name);
    let format = image::ImageFormat::from_path(&path)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let seed = name.bytes().fold(0u8, |acc, b| acc.wrapping_add(b));
    RgbImage::from_pixel(TEST_PHOTO_SIZE, TEST_PHOTO_SIZE, Rgb([seed, 128, 255 - seed]))
        .save_with_format(&path, format)
        .map_err(io::Error::other)?;

    Ok(path)
}

/// Insert an EXIF APP1 segment carrying `orientation` into JPEG bytes
///
/// The segment holds a little-endian TIFF header with a single IFD0 entry
/// for tag 0x0112. Input that does not start with a JPEG SOI marker is
/// returned unchanged.
pub fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    if !jpeg.starts_with(&[0xFF, 0xD8]) {
        return jpeg.to_vec();
    }

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_le_bytes());

    let segment_len = (2 + 6 + tiff.len()) as u16;
    let mut out = Vec::with_capacity(jpeg.len() + 4 + 6 + tiff.len());
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Write a file that is not a photo
pub fn write_text_file(folder: &Path, name: &str) -> io::Result<PathBuf> {
    let path = folder.join(name);
    fs::write(&path, b"not a photo\n")?;
    Ok(path)
}

/// File names directly inside `folder`, sorted
pub fn file_names(folder: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(folder)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
