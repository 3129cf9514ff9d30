//! Source folder scanning
//!
//! Finds the photos in the source folder that the TV can take.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extensions the TV accepts, compared case-insensitively
pub const PHOTO_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Check whether a file name has one of the [`PHOTO_EXTENSIONS`]
pub fn is_supported_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lower = ext.to_lowercase();
            PHOTO_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// File type tag sent with an upload, derived from the extension
pub fn file_type_tag(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_lowercase())
}

/// List the candidate photos directly inside `folder`, ordered by file name
///
/// Subfolders are not descended into. Symlinks to files count as photos.
/// Entries that cannot be read, including dangling links, are skipped.
pub fn find_photos(folder: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut photos = Vec::new();

    for entry in WalkDir::new(folder)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // The folder itself vanished or is unreadable
                if e.depth() == 0 {
                    return Err(e.into());
                }
                log::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_file() && is_supported_photo(entry.path()) {
            photos.push(entry.into_path());
        }
    }

    Ok(photos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_supported_extensions_any_case() {
        for name in [
            "a.png", "a.PNG", "a.jpg", "a.JPG", "a.Jpg", "a.jpeg", "a.JPEG", "a.jPeG",
        ] {
            assert!(is_supported_photo(Path::new(name)), "{} should match", name);
        }
    }

    #[test]
    fn test_unsupported_extensions() {
        for name in ["a.gif", "a.txt", "a.heic", "png", "a.png.bak", "a"] {
            assert!(!is_supported_photo(Path::new(name)), "{} should not match", name);
        }
    }

    #[test]
    fn test_file_type_tag() {
        assert_eq!(file_type_tag(Path::new("photo.jpg")).as_deref(), Some("jpg"));
        assert_eq!(file_type_tag(Path::new("Photo.JPG")).as_deref(), Some("jpg"));
        assert_eq!(file_type_tag(Path::new("c.jpeg")).as_deref(), Some("jpeg"));
        assert_eq!(file_type_tag(Path::new("noext")), None);
    }

    #[test]
    fn test_find_photos_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.JPG", "a.png", "notes.txt", "anim.gif", "C.JPEG"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("deep.png"), b"x").unwrap();

        let photos = find_photos(dir.path()).unwrap();
        let names: Vec<_> = photos
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["C.JPEG", "a.png", "b.JPG"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_find_photos_follows_symlinked_files() {
        let outside = tempfile::tempdir().unwrap();
        let real = outside.path().join("real.png");
        fs::write(&real, b"x").unwrap();

        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(&real, dir.path().join("link.png")).unwrap();
        std::os::unix::fs::symlink(outside.path().join("gone.png"), dir.path().join("dangling.png"))
            .unwrap();

        let photos = find_photos(dir.path()).unwrap();

        assert_eq!(photos, vec![dir.path().join("link.png")]);
    }

    #[test]
    fn test_find_photos_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_photos(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_find_photos_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_photos(&dir.path().join("gone")).is_err());
    }
}
