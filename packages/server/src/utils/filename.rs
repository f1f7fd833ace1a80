/// Image extensions accepted for upload.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Result of validating an uploaded image filename.
#[derive(Debug)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename contains null bytes.
    NullByte,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
    /// Filename starts with a dot (hidden file).
    Hidden,
    /// Filename has no extension.
    MissingExtension,
    /// Extension is not an accepted image type.
    UnsupportedExtension,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
            Self::Hidden => "Invalid filename: hidden files (starting with '.') are not allowed",
            Self::MissingExtension => "Filename must have an image extension",
            Self::UnsupportedExtension => {
                "Unsupported image type (allowed: jpg, jpeg, png, gif, bmp, webp)"
            }
        }
    }
}

/// Extracts the extension (text after the last dot), if any.
pub fn extension_of(filename: &str) -> Option<&str> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

/// Validates an uploaded image filename: a flat name with an accepted
/// image extension. Returns the trimmed name.
pub fn validate_image_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    // Reject ASCII control characters to prevent HTTP header injection
    // (e.g. CRLF in stored metadata headers).
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    let extension = extension_of(trimmed).ok_or(FilenameError::MissingExtension)?;
    let extension = extension.to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(FilenameError::UnsupportedExtension);
    }

    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_image_names() {
        assert!(validate_image_filename("boat.jpg").is_ok());
        assert!(validate_image_filename("my boat.PNG").is_ok());
        assert!(validate_image_filename("sea-ray_2015.jpeg").is_ok());
        assert!(validate_image_filename("  padded.webp  ").is_ok());
    }

    #[test]
    fn returns_the_trimmed_name() {
        assert_eq!(validate_image_filename("  boat.gif ").unwrap(), "boat.gif");
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            validate_image_filename(""),
            Err(FilenameError::Empty)
        ));
        assert!(matches!(
            validate_image_filename("   "),
            Err(FilenameError::Empty)
        ));
    }

    #[test]
    fn rejects_path_separators() {
        assert!(matches!(
            validate_image_filename("images/boat.jpg"),
            Err(FilenameError::ContainsPathSeparator)
        ));
        assert!(matches!(
            validate_image_filename("images\\boat.jpg"),
            Err(FilenameError::ContainsPathSeparator)
        ));
    }

    #[test]
    fn rejects_null_bytes_and_control_characters() {
        assert!(matches!(
            validate_image_filename("boat\0.jpg"),
            Err(FilenameError::NullByte)
        ));
        assert!(matches!(
            validate_image_filename("boat\r\n.jpg"),
            Err(FilenameError::ControlCharacter)
        ));
    }

    #[test]
    fn rejects_hidden_files() {
        assert!(matches!(
            validate_image_filename(".hidden.png"),
            Err(FilenameError::Hidden)
        ));
    }

    #[test]
    fn rejects_missing_or_unsupported_extensions() {
        assert!(matches!(
            validate_image_filename("boat"),
            Err(FilenameError::MissingExtension)
        ));
        assert!(matches!(
            validate_image_filename("boat.txt"),
            Err(FilenameError::UnsupportedExtension)
        ));
        assert!(matches!(
            validate_image_filename("boat.exe"),
            Err(FilenameError::UnsupportedExtension)
        ));
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert!(validate_image_filename("boat.JPG").is_ok());
        assert!(validate_image_filename("boat.Png").is_ok());
    }

    #[test]
    fn extension_of_works() {
        assert_eq!(extension_of("boat.jpg"), Some("jpg"));
        assert_eq!(extension_of("archive.tar.gz"), Some("gz"));
        assert_eq!(extension_of("no_ext"), None);
        assert_eq!(extension_of("trailing."), None);
    }
}
