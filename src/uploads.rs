use std::path::Path;

use thiserror::Error;

/// Image formats accepted for item and bid postings.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("Please attach an image file.")]
    Missing,
    #[error("Invalid file format. Please upload a PNG, JPG, JPEG, or GIF file.")]
    Unsupported,
}

fn extension(filename: &str) -> Option<&str> {
    Path::new(filename).extension().and_then(|ext| ext.to_str())
}

pub fn allowed_file(filename: &str) -> bool {
    extension(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn validate(filename: &str) -> Result<(), UploadError> {
    if allowed_file(filename) {
        Ok(())
    } else {
        Err(UploadError::Unsupported)
    }
}

/// Strip path components and unsafe characters from a client-supplied
/// filename. Collisions between sanitized names are not resolved; the last
/// write wins.
pub fn sanitized_name(filename: &str) -> String {
    sanitize_filename::sanitize(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_extensions_case_insensitively() {
        assert!(allowed_file("chair.png"));
        assert!(allowed_file("chair.PNG"));
        assert!(allowed_file("offer.jpg"));
        assert!(allowed_file("offer.JpEg"));
        assert!(allowed_file("cat.gif"));
    }

    #[test]
    fn rejects_missing_or_disallowed_extensions() {
        assert!(!allowed_file("notes"));
        assert!(!allowed_file("notes.txt"));
        assert!(!allowed_file("archive.tar.xz"));
        assert!(!allowed_file(""));
    }

    #[test]
    fn validate_maps_to_unsupported() {
        assert_eq!(validate("malware.exe"), Err(UploadError::Unsupported));
        assert!(validate("photo.jpeg").is_ok());
    }

    #[test]
    fn sanitized_name_strips_path_components() {
        let name = sanitized_name("../../etc/passwd.png");
        assert!(!name.contains('/'));
        assert!(!name.contains('\\'));
        assert!(name.ends_with(".png"));

        let windows = sanitized_name("..\\..\\boot.ini.gif");
        assert!(!windows.contains('\\'));
    }

    #[test]
    fn sanitized_name_keeps_ordinary_names() {
        assert_eq!(sanitized_name("chair.png"), "chair.png");
    }
}
