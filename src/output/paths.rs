// src/output/paths.rs
//! Pure functions for path calculations and filename generation.
//!
//! This module handles all path-related operations without
//! performing any I/O operations.

use crate::error::AppError;
use crate::types::ValidationError;
use std::path::Path;

/// Sanitizes a string to be safe for use as a filename.
pub fn sanitize_filename(name: &str) -> String {
    let mut safe_name = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>();

    // Trim whitespace and dots
    safe_name = safe_name.trim().trim_matches('.').to_string();

    // Limit length
    if safe_name.chars().count() > 100 {
        safe_name = safe_name.chars().take(100).collect();
    }

    // Default if empty
    if safe_name.is_empty() {
        safe_name = "unnamed".to_string();
    }

    safe_name
}

/// File extension for downloaded image bytes, sniffed from the magic number.
pub fn image_extension(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "png",
        [0xFF, 0xD8, 0xFF, ..] => "jpg",
        [b'G', b'I', b'F', b'8', ..] => "gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "webp",
        [b'<', b's', b'v', b'g', ..] | [b'<', b'?', b'x', b'm', b'l', ..] => "svg",
        _ => "bin",
    }
}

/// Filename for a downloaded media token.
pub fn asset_filename(token: &str, bytes: &[u8]) -> String {
    format!("{}.{}", sanitize_filename(token), image_extension(bytes))
}

/// Calculates a relative path from one file to another.
pub fn get_relative_path(from: &Path, to: &Path) -> Result<String, AppError> {
    let from_dir = from.parent().unwrap_or_else(|| Path::new("."));

    let relative = pathdiff::diff_paths(to, from_dir).ok_or_else(|| {
        AppError::ValidationError(ValidationError::InvalidFilePath {
            path: to.display().to_string(),
            reason: format!("no relative path from {}", from.display()),
        })
    })?;

    // Ensure forward slashes for Markdown compatibility
    Ok(relative.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Hello/World"), "Hello_World");
        assert_eq!(sanitize_filename("Test:File*Name"), "Test_File_Name");
        assert_eq!(sanitize_filename("   spaces   "), "spaces");
        assert_eq!(sanitize_filename("...dots..."), "dots");
        assert_eq!(sanitize_filename(""), "unnamed");
    }

    #[test]
    fn test_asset_filename_sniffs_type() {
        assert_eq!(asset_filename("boxcnA", &[0x89, b'P', b'N', b'G', 0x0D]), "boxcnA.png");
        assert_eq!(asset_filename("boxcnB", &[0xFF, 0xD8, 0xFF, 0xE0]), "boxcnB.jpg");
        assert_eq!(asset_filename("boxcnC", b"plain"), "boxcnC.bin");
    }

    #[test]
    fn test_relative_path() {
        let rel = get_relative_path(Path::new("/out/doc.md"), Path::new("/out/assets/a.png")).unwrap();
        assert_eq!(rel, "assets/a.png");
        let rel = get_relative_path(Path::new("/out/docs/doc.md"), Path::new("/out/assets/a.png")).unwrap();
        assert_eq!(rel, "../assets/a.png");
    }
}
