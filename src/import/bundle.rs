/// Image bundle: snapshot images addressed by bare filename
///
/// Images arrive either as loose files or inside a zip archive. Archives
/// are unpacked into a private scratch directory which is removed when the
/// extraction returns, whether it succeeded or not.
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Recognized image extensions (lowercase)
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Recognized archive extensions (lowercase)
pub const ARCHIVE_EXTENSIONS: [&str; 1] = ["zip"];

/// Image content for a record, or the sentinel used when nothing matched
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedImage<'a> {
    Found(&'a [u8]),
    NotFound,
}

impl ResolvedImage<'_> {
    /// Text shown in place of a missing image
    pub const NOT_FOUND_TEXT: &'static str = "Image Not Found";
}

/// Outcome of loading one uploaded file into the bundle
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Image(String),
    Archive { images: usize },
}

/// Filename → bytes, last write wins
#[derive(Debug, Clone, Default)]
pub struct ImageBundle {
    images: HashMap<String, Vec<u8>>,
}

impl ImageBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.images.contains_key(name)
    }

    /// Insert an image, replacing any earlier image with the same name
    pub fn insert(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.images.insert(name.into(), data);
    }

    /// Exact filename lookup
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.images.get(name).map(|v| v.as_slice())
    }

    /// Resolve a record's image reference to content or the sentinel
    pub fn resolve(&self, name: Option<&str>) -> ResolvedImage<'_> {
        match name.and_then(|n| self.get(n)) {
            Some(data) => ResolvedImage::Found(data),
            None => ResolvedImage::NotFound,
        }
    }

    /// Load one uploaded file, dispatching on its extension
    ///
    /// Unsupported types return `Error::UnsupportedFile`; the bundle is
    /// left untouched and the caller moves on to the next file.
    pub fn load_file(&mut self, path: &Path) -> Result<LoadOutcome> {
        let name = file_name(path);
        let ext = extension(path);

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            let data = fs::read(path)?;
            self.insert(name.clone(), data);
            return Ok(LoadOutcome::Image(name));
        }

        if ARCHIVE_EXTENSIONS.contains(&ext.as_str()) {
            let data = fs::read(path)?;
            let images = extract_images_from_zip(&data)?;
            let count = images.len();
            for (name, data) in images {
                self.insert(name, data);
            }
            return Ok(LoadOutcome::Archive { images: count });
        }

        Err(Error::UnsupportedFile(name))
    }

    /// Load many uploads; failures are collected, not fatal
    pub fn load_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Vec<(String, Error)> {
        let mut failures = Vec::new();
        for path in paths {
            let path = path.as_ref();
            match self.load_file(path) {
                Ok(LoadOutcome::Image(name)) => tracing::debug!(%name, "loaded image"),
                Ok(LoadOutcome::Archive { images }) => {
                    tracing::info!(archive = %path.display(), images, "extracted image archive")
                }
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "skipped upload");
                    failures.push((file_name(path), e));
                }
            }
        }
        failures
    }
}

/// Extract every image from a zip archive, keyed by bare filename
///
/// The archive is unpacked into a temporary directory and walked
/// recursively, so images at any nesting depth are found. The directory
/// is deleted when `scratch` drops, including on the error paths.
pub fn extract_images_from_zip(data: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    extract_images_in(data, &std::env::temp_dir())
}

/// Same as [`extract_images_from_zip`], with the scratch directory under `parent`
fn extract_images_in(data: &[u8], parent: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    let scratch = tempfile::tempdir_in(parent)?;

    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    archive.extract(scratch.path())?;

    let mut images = Vec::new();
    for entry in WalkDir::new(scratch.path())
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        // Only process files (not directories)
        if !entry.file_type().is_file() {
            continue;
        }

        if !IMAGE_EXTENSIONS.contains(&extension(path).as_str()) {
            continue;
        }

        images.push((file_name(path), fs::read(path)?));
    }

    Ok(images)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}


#[cfg(test)]
mod tests {
    use super::test_support::zip_bytes;
    use super::*;
    use std::io::Write;

    #[test]
    fn test_nested_archive_image_is_keyed_by_filename() {
        let data = zip_bytes(&[
            ("export/deep/nested/photo1.png", b"png-bytes"),
            ("export/readme.txt", b"ignored"),
            ("export/UPPER.JPG", b"jpg-bytes"),
        ]);
        let mut images = extract_images_from_zip(&data).unwrap();
        images.sort();
        assert_eq!(
            images,
            vec![
                ("UPPER.JPG".to_string(), b"jpg-bytes".to_vec()),
                ("photo1.png".to_string(), b"png-bytes".to_vec()),
            ]
        );
    }

    #[test]
    fn test_corrupt_archive_is_error() {
        assert!(matches!(
            extract_images_from_zip(b"definitely not a zip"),
            Err(Error::Archive(_))
        ));
    }

    #[test]
    fn test_scratch_directory_removed_after_extraction() {
        let parent = tempfile::tempdir().unwrap();

        let good = zip_bytes(&[("a/c001.png", b"png")]);
        assert_eq!(extract_images_in(&good, parent.path()).unwrap().len(), 1);
        assert_eq!(fs::read_dir(parent.path()).unwrap().count(), 0);

        // Stored entry whose bytes no longer match the recorded CRC
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let stored = zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.start_file("a/c001.png", stored).unwrap();
        writer.write_all(b"first image").unwrap();
        writer.start_file("b/c002.png", stored).unwrap();
        writer.write_all(b"SECOND-IMAGE-BYTES").unwrap();
        let mut broken = writer.finish().unwrap().into_inner();
        let at = broken.windows(6).position(|w| w == b"SECOND").unwrap();
        broken[at] = b'X';

        assert!(matches!(extract_images_in(&broken, parent.path()), Err(Error::Archive(_))));
        assert_eq!(fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_resolve_uses_sentinel() {
        let mut bundle = ImageBundle::new();
        bundle.insert("c001.jpg", vec![1, 2, 3]);
        assert_eq!(bundle.resolve(Some("c001.jpg")), ResolvedImage::Found(&[1, 2, 3]));
        assert_eq!(bundle.resolve(Some("C001.jpg")), ResolvedImage::NotFound);
        assert_eq!(bundle.resolve(None), ResolvedImage::NotFound);
    }

    #[test]
    fn test_last_write_wins() {
        let mut bundle = ImageBundle::new();
        bundle.insert("a.png", vec![1]);
        bundle.insert("a.png", vec![2]);
        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle.get("a.png"), Some(&[2u8][..]));
    }

    #[test]
    fn test_load_files_skips_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("c001.jpg");
        let notes = dir.path().join("notes.docx");
        let archive = dir.path().join("images.zip");
        fs::write(&image, b"jpeg").unwrap();
        fs::write(&notes, b"doc").unwrap();
        fs::write(&archive, zip_bytes(&[("a/c002.png", b"png")])).unwrap();

        let mut bundle = ImageBundle::new();
        let failures = bundle.load_files(&[&image, &notes, &archive]);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "notes.docx");
        assert!(matches!(failures[0].1, Error::UnsupportedFile(_)));
        assert!(bundle.contains("c001.jpg"));
        assert!(bundle.contains("c002.png"));
    }
}
